//! The polling loop: fetch a batch, reply to eligible messages in order, sleep, repeat.
//!
//! One sequential task. Every provider call is awaited before the next starts, so replies go out
//! in feed order and a slow provider delays the whole tick.

use std::time::Duration;

use crate::bot::{ProcessingState, Shutdown};
use crate::channels::{MessageDispatcher, UpdateFeed};
use crate::weather::{render_reply, WeatherLookup};

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fetched: usize,
    /// Sent before startup.
    pub stale: usize,
    /// At or behind the cursor.
    pub skipped: usize,
    pub replied: usize,
    pub delivery_failures: usize,
    /// Shutdown was observed before the batch was finished.
    pub interrupted: bool,
}

/// Run one tick's fetch and process phases against `state`.
///
/// For each fetched message, in feed order: drop it if stale, record its sender, and reply only
/// when its id is past the global cursor. A replied message moves the cursor to its id even when
/// delivery fails. Shutdown is checked before each message.
pub async fn run_tick(
    state: &mut ProcessingState,
    feed: &dyn UpdateFeed,
    lookup: &dyn WeatherLookup,
    dispatcher: &dyn MessageDispatcher,
    shutdown: &Shutdown,
) -> TickReport {
    let batch = feed.fetch_pending().await;
    let mut report = TickReport {
        fetched: batch.len(),
        ..TickReport::default()
    };

    for msg in &batch {
        if shutdown.is_triggered() {
            report.interrupted = true;
            break;
        }
        if state.is_stale(msg) {
            report.stale += 1;
            continue;
        }
        state.register_sender(msg.sender_id);
        log::info!(
            "received message from user {}: {:?} (message_id {})",
            msg.sender_id,
            msg.text,
            msg.message_id
        );
        if !state.is_eligible(msg) {
            log::debug!(
                "message {} is at or behind cursor {:?}, skipping",
                msg.message_id,
                state.cursor()
            );
            report.skipped += 1;
            continue;
        }

        let outcome = lookup.query(&msg.text).await;
        let reply = render_reply(&msg.text, &outcome);
        match dispatcher.send(msg.conversation_id, &reply).await {
            Ok(()) => log::info!("replied to message: {:?}", msg.text),
            Err(e) => {
                log::warn!("error sending message: {}", e);
                report.delivery_failures += 1;
            }
        }
        state.advance_cursor(msg.message_id);
        report.replied += 1;
    }
    report
}

/// Run ticks until shutdown, sleeping `interval` between them. Returns the final state.
pub async fn run_polling_loop(
    mut state: ProcessingState,
    feed: &dyn UpdateFeed,
    lookup: &dyn WeatherLookup,
    dispatcher: &dyn MessageDispatcher,
    interval: Duration,
    mut shutdown: Shutdown,
) -> ProcessingState {
    log::info!("Bot is running. Send a city name to get the current weather.");
    while !shutdown.is_triggered() {
        let report = run_tick(&mut state, feed, lookup, dispatcher, &shutdown).await;
        if report.fetched > 0 {
            log::debug!("tick: {:?}, cursor {:?}", report, state.cursor());
        }
        if report.interrupted {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.triggered() => break,
        }
    }
    log::info!("polling loop stopped");
    state
}
