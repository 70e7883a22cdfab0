//! Weather report model and the user-facing reply text.

use crate::weather::WeatherError;

pub const CITY_NOT_FOUND_REPLY: &str =
    "City not found. Please check the spelling or try again with a valid city name.";
pub const LOOKUP_FAILED_REPLY: &str = "Error fetching weather data.";
pub const RAIN_WARNING: &str = "⚠️ Rain is expected in this city. Please take necessary precautions.";

/// Current conditions for one place, metric units.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Condition phrase with the first letter capitalized (e.g. "Light rain").
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub rain_expected: bool,
}

/// Result of one lookup.
#[derive(Debug)]
pub enum LookupOutcome {
    Report(WeatherReport),
    /// The provider answered but did not recognize the place.
    NotFound,
    /// Transport or status failure. Terminal for this request.
    Failed(WeatherError),
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Text sent back to the user for a lookup of `city`.
pub fn render_reply(city: &str, outcome: &LookupOutcome) -> String {
    match outcome {
        LookupOutcome::Report(r) => {
            let rain = if r.rain_expected { RAIN_WARNING } else { "" };
            format!(
                "Weather in {}:\nDescription: {}\nTemperature: {}°C\nHumidity: {}%\nWind Speed: {} m/s\n{}",
                city, r.description, r.temperature_c, r.humidity_pct, r.wind_speed_ms, rain
            )
        }
        LookupOutcome::NotFound => CITY_NOT_FOUND_REPLY.to_string(),
        LookupOutcome::Failed(_) => LOOKUP_FAILED_REPLY.to_string(),
    }
}
