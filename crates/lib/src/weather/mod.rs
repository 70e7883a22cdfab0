//! Weather lookup: OpenWeather client and the reply text built from its result.

mod openweather;
mod report;

pub use openweather::{OpenWeatherClient, WeatherError};
pub use report::{capitalize, render_reply, LookupOutcome, WeatherReport};

use async_trait::async_trait;

/// Resolves a free-text place name to current conditions.
///
/// Never fails as a call: provider failures come back as [`LookupOutcome::Failed`] so the caller
/// can turn them into a reply.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn query(&self, city: &str) -> LookupOutcome;
}
