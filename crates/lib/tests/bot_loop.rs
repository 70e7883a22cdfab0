//! End-to-end: the polling loop driving real clients against mock Telegram and OpenWeather servers.

use std::time::Duration;
use weatherbot::bot::{run_tick, shutdown_channel, Bot, ProcessingState, Shutdown};
use weatherbot::channels::TelegramChannel;
use weatherbot::config::{Config, Credentials};
use weatherbot::weather::OpenWeatherClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "42:bot";
const STARTUP: i64 = 1_700_000_000;

fn update(message_id: i64, chat: i64, date: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": 1000 + message_id,
        "message": {
            "message_id": message_id,
            "date": date,
            "chat": { "id": chat },
            "from": { "id": chat },
            "text": text
        }
    })
}

async fn mount_updates(server: &MockServer, updates: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getUpdates", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": updates
        })))
        .mount(server)
        .await;
}

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Unknownland"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404", "message": "city not found"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": 200,
            "weather": [{ "main": "Rain", "description": "light rain" }],
            "main": { "temp": 8.5, "humidity": 93 },
            "wind": { "speed": 6.1 }
        })))
        .mount(server)
        .await;
}

fn sent_texts(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

#[tokio::test]
async fn replays_and_stale_updates_are_answered_once() {
    let telegram = MockServer::start().await;
    let weather = MockServer::start().await;
    mount_updates(
        &telegram,
        vec![
            update(1, 10, STARTUP - 60, "Old Town"),
            update(5, 10, STARTUP + 1, "Bergen"),
            update(7, 11, STARTUP + 2, "Unknownland"),
            update(3, 12, STARTUP + 3, "Lima"),
        ],
    )
    .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(2)
        .mount(&telegram)
        .await;
    mount_weather(&weather).await;

    let channel = TelegramChannel::new(TOKEN, Some(telegram.uri()));
    let lookup = OpenWeatherClient::new("k", Some(format!("{}/weather", weather.uri())), None);
    let mut state = ProcessingState::new(STARTUP);
    let shutdown = Shutdown::never();

    let first = run_tick(&mut state, &channel, &lookup, &channel, &shutdown).await;
    // Same feed again: nothing new to answer.
    let second = run_tick(&mut state, &channel, &lookup, &channel, &shutdown).await;

    assert_eq!(first.fetched, 4);
    assert_eq!(first.stale, 1);
    assert_eq!(first.replied, 2);
    assert_eq!(first.skipped, 1);
    assert_eq!(second.replied, 0);
    assert_eq!(state.cursor(), Some(7));

    let requests = telegram.received_requests().await.unwrap_or_default();
    let texts = sent_texts(&requests);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("chat_id=10"));
    assert!(texts[0].contains("Bergen"));
    assert!(texts[1].contains("chat_id=11"));
    assert!(texts[1].contains("City+not+found"));
}

#[tokio::test]
async fn bot_runs_until_shutdown() {
    let telegram = MockServer::start().await;
    let weather = MockServer::start().await;
    // Dated far in the future so they are never stale relative to the real clock.
    mount_updates(&telegram, vec![update(1, 10, i64::MAX / 2, "Oslo")]).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&telegram)
        .await;
    mount_weather(&weather).await;

    let mut config = Config::default();
    config.telegram.api_base = telegram.uri();
    config.weather.api_url = format!("{}/weather", weather.uri());
    config.polling.interval_secs = 1;
    config.polling.request_timeout_secs = Some(5);
    let credentials = Credentials {
        weather_api_key: "k".to_string(),
        telegram_token: TOKEN.to_string(),
    };
    let bot = Bot::from_config(&config, &credentials).unwrap();
    let (trigger, shutdown) = shutdown_channel();

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.trigger();
    };
    let (state, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(bot.run(shutdown), stopper)
    })
    .await
    .expect("bot should stop after shutdown");

    assert_eq!(state.cursor(), Some(1));
    assert_eq!(state.known_senders().len(), 1);
}
