//! Dedup and staleness state owned by the polling loop for the life of the process.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::channels::InboundMessage;

/// Process-lifetime state of the polling loop. Not persisted; a restart starts over.
#[derive(Debug, Clone)]
pub struct ProcessingState {
    startup_epoch: i64,
    known_senders: HashSet<i64>,
    /// Highest message id replied to so far, across all conversations.
    cursor: Option<i64>,
}

/// Startup time in whole unix seconds, rounded up so that a message stamped in the same second
/// but before startup is still treated as stale.
pub fn startup_epoch_seconds(now: DateTime<Utc>) -> i64 {
    let millis = now.timestamp_millis();
    millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) != 0)
}

impl ProcessingState {
    pub fn new(startup_epoch: i64) -> Self {
        Self {
            startup_epoch,
            known_senders: HashSet::new(),
            cursor: None,
        }
    }

    /// State for a loop starting now.
    pub fn starting_now() -> Self {
        Self::new(startup_epoch_seconds(Utc::now()))
    }

    pub fn startup_epoch(&self) -> i64 {
        self.startup_epoch
    }

    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn known_senders(&self) -> &HashSet<i64> {
        &self.known_senders
    }

    /// Sent before the loop started.
    pub fn is_stale(&self, msg: &InboundMessage) -> bool {
        msg.sent_at < self.startup_epoch
    }

    pub fn register_sender(&mut self, sender_id: i64) {
        self.known_senders.insert(sender_id);
    }

    /// Eligible for a reply: nothing replied yet, or the id is past the cursor.
    pub fn is_eligible(&self, msg: &InboundMessage) -> bool {
        self.cursor.map_or(true, |c| msg.message_id > c)
    }

    /// Move the cursor to `message_id`. Never moves it backwards.
    pub fn advance_cursor(&mut self, message_id: i64) {
        self.cursor = Some(self.cursor.map_or(message_id, |c| c.max(message_id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: i64, sent_at: i64) -> InboundMessage {
        InboundMessage {
            conversation_id: 1,
            sender_id: 2,
            message_id: id,
            sent_at,
            text: "Oslo".to_string(),
        }
    }

    #[test]
    fn startup_epoch_rounds_up_partial_seconds() {
        let exact = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(startup_epoch_seconds(exact), 1_700_000_000);
        let partial = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(startup_epoch_seconds(partial), 1_700_000_001);
    }

    #[test]
    fn stale_is_strictly_before_startup() {
        let s = ProcessingState::new(100);
        assert!(s.is_stale(&msg(1, 99)));
        assert!(!s.is_stale(&msg(1, 100)));
        assert!(!s.is_stale(&msg(1, 101)));
    }

    #[test]
    fn first_message_is_eligible() {
        let s = ProcessingState::new(0);
        assert_eq!(s.cursor(), None);
        assert!(s.is_eligible(&msg(1, 0)));
    }

    #[test]
    fn eligibility_requires_id_past_cursor() {
        let mut s = ProcessingState::new(0);
        s.advance_cursor(5);
        assert!(!s.is_eligible(&msg(4, 0)));
        assert!(!s.is_eligible(&msg(5, 0)));
        assert!(s.is_eligible(&msg(6, 0)));
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let mut s = ProcessingState::new(0);
        s.advance_cursor(7);
        s.advance_cursor(3);
        assert_eq!(s.cursor(), Some(7));
    }

    #[test]
    fn senders_accumulate() {
        let mut s = ProcessingState::new(0);
        s.register_sender(1);
        s.register_sender(1);
        s.register_sender(2);
        assert_eq!(s.known_senders().len(), 2);
    }
}
