//! OpenWeather current-weather client (https://api.openweathermap.org/data/2.5/weather).

use crate::config::DEFAULT_WEATHER_API_URL;
use crate::weather::{capitalize, LookupOutcome, WeatherLookup, WeatherReport};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Units are fixed: the reply template is in °C and m/s.
const UNITS: &str = "metric";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(reqwest::Error),
    #[error("weather api error: {0}")]
    Api(String),
    #[error("weather response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Request URLs carry the API key in the query; errors keep none of it.
impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Request(e.without_url())
    }
}

/// `cod` is a number on success and a string on errors ("404").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Cod {
    Number(i64),
    Text(String),
}

impl Cod {
    fn is(&self, code: i64) -> bool {
        match self {
            Cod::Number(n) => *n == code,
            Cod::Text(s) => s.trim().parse::<i64>().ok() == Some(code),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CodOnly {
    cod: Option<Cod>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    weather: Vec<Condition>,
    main: MainReadings,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct Condition {
    /// Category, e.g. "Rain", "Clouds".
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

impl CurrentWeatherResponse {
    fn into_report(self) -> WeatherReport {
        let rain_expected = self
            .weather
            .iter()
            .any(|c| c.main.eq_ignore_ascii_case("rain"));
        let description = self
            .weather
            .first()
            .map(|c| capitalize(&c.description))
            .unwrap_or_default();
        WeatherReport {
            description,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed_ms: self.wind.speed,
            rain_expected,
        }
    }
}

/// Client for the OpenWeather current-weather endpoint.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_url: String,
    api_key: String,
    lang: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, api_url: Option<String>, lang: Option<String>) -> Self {
        Self::with_client(api_key, api_url, lang, reqwest::Client::new())
    }

    pub fn with_client(
        api_key: impl Into<String>,
        api_url: Option<String>,
        lang: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            api_key: api_key.into(),
            lang: lang.unwrap_or_else(|| "en".to_string()),
            client,
        }
    }

    /// GET current weather for `city`. The city text is passed through as-is.
    pub async fn current(&self, city: &str) -> Result<LookupOutcome, WeatherError> {
        let res = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        log::debug!("openweather response ({}): {}", status, body);

        if status == StatusCode::NOT_FOUND && signals_not_found(&body) {
            return Ok(LookupOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(WeatherError::Api(format!("{} {}", status, body)));
        }
        let cod: CodOnly = serde_json::from_str(&body)?;
        if !cod.cod.as_ref().is_some_and(|c| c.is(200)) {
            return Ok(LookupOutcome::NotFound);
        }
        let data: CurrentWeatherResponse = serde_json::from_str(&body)?;
        Ok(LookupOutcome::Report(data.into_report()))
    }
}

fn signals_not_found(body: &str) -> bool {
    serde_json::from_str::<CodOnly>(body)
        .ok()
        .and_then(|c| c.cod)
        .is_some_and(|c| c.is(404))
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn query(&self, city: &str) -> LookupOutcome {
        match self.current(city).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("weather lookup for {:?} failed: {}", city, e);
                LookupOutcome::Failed(e)
            }
        }
    }
}
