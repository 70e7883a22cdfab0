//! Polling bot: wires the Telegram channel and the weather client into the polling loop.

mod runner;
mod shutdown;
mod state;

pub use runner::{run_polling_loop, run_tick, TickReport};
pub use shutdown::{shutdown_channel, wait_for_signal, Shutdown, ShutdownTrigger};
pub use state::{startup_epoch_seconds, ProcessingState};

use std::time::Duration;

use crate::channels::TelegramChannel;
use crate::config::{Config, Credentials};
use crate::weather::OpenWeatherClient;

/// The concrete bot: Telegram for updates and replies, OpenWeather for lookups.
pub struct Bot {
    channel: TelegramChannel,
    weather: OpenWeatherClient,
    interval: Duration,
}

impl Bot {
    /// Build both provider clients from config. They share one HTTP client (and its timeout).
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self, reqwest::Error> {
        let client = http_client(config)?;
        let channel = TelegramChannel::with_client(
            credentials.telegram_token.clone(),
            Some(config.telegram.api_base.clone()),
            client.clone(),
        );
        let weather = OpenWeatherClient::with_client(
            credentials.weather_api_key.clone(),
            Some(config.weather.api_url.clone()),
            Some(config.weather.lang.clone()),
            client,
        );
        Ok(Self {
            channel,
            weather,
            interval: config.polling.interval(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the polling loop until `shutdown` fires. State starts fresh at this moment.
    pub async fn run(&self, shutdown: Shutdown) -> ProcessingState {
        run_polling_loop(
            ProcessingState::starting_now(),
            &self.channel,
            &self.weather,
            &self.channel,
            self.interval,
            shutdown,
        )
        .await
    }
}

/// HTTP client for both providers, with the configured request timeout if any.
pub fn http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.polling.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
