use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Normalized weather condition, provider-agnostic.
///
/// Open-Meteo reports WMO weather codes, NWS reports free-form forecast
/// text; both collapse into this small set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl Condition {
    /// Map a WMO weather interpretation code (as used by Open-Meteo) to a
    /// condition kind.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0 => Condition::Clear,
            1..=3 => Condition::PartlyCloudy,
            45 | 48 => Condition::Fog,
            51 | 53 | 55 | 56 | 57 => Condition::Drizzle,
            61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Condition::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => Condition::Snow,
            95 | 96 | 99 => Condition::Thunderstorm,
            _ => Condition::Unknown,
        }
    }

    /// Best-effort classification of a textual forecast ("Chance Rain
    /// Showers", "Mostly Sunny", ...).
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("thunder") {
            Condition::Thunderstorm
        } else if lower.contains("snow") || lower.contains("flurr") || lower.contains("sleet") {
            Condition::Snow
        } else if lower.contains("drizzle") {
            Condition::Drizzle
        } else if lower.contains("rain") || lower.contains("shower") {
            Condition::Rain
        } else if lower.contains("fog") || lower.contains("haze") || lower.contains("mist") {
            Condition::Fog
        } else if lower.contains("cloud") || lower.contains("overcast") || lower.contains("partly") {
            Condition::PartlyCloudy
        } else if lower.contains("clear") || lower.contains("sunny") || lower.contains("fair") {
            Condition::Clear
        } else {
            Condition::Unknown
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Condition::Clear => "☀️",
            Condition::PartlyCloudy => "⛅",
            Condition::Fog => "🌫️",
            Condition::Drizzle => "🌦️",
            Condition::Rain => "🌧️",
            Condition::Snow => "❄️",
            Condition::Thunderstorm => "⛈️",
            Condition::Unknown => "❓",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::Fog => "Fog",
            Condition::Drizzle => "Drizzle",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Unknown => "Unknown",
        }
    }

    /// Human-readable form, with or without the leading emoji.
    pub fn describe(&self, no_emoji: bool) -> String {
        if no_emoji {
            self.label().to_string()
        } else {
            format!("{} {}", self.emoji(), self.label())
        }
    }
}

/// A single normalized point-in-time observation.
///
/// All values are stored in canonical metric units; display conversion
/// happens at render time. A field the provider did not report is `None`,
/// never zero, so "no data" stays distinguishable from "value is zero".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub observed_at: Option<NaiveDateTime>,
    pub condition: Option<Condition>,
    pub temperature_c: Option<f64>,
    pub apparent_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_gusts_kmh: Option<f64>,
    pub pressure_msl_hpa: Option<f64>,
    pub surface_pressure_hpa: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub rain_mm: Option<f64>,
    pub showers_mm: Option<f64>,
    pub snowfall_cm: Option<f64>,
    pub visibility_m: Option<f64>,
    pub uv_index: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

/// One day of a forecast, canonical metric units, `None` for anything the
/// provider left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: Option<Condition>,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub precipitation_chance_pct: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

impl ForecastDay {
    pub fn empty(date: NaiveDate) -> Self {
        ForecastDay {
            date,
            condition: None,
            temp_max_c: None,
            temp_min_c: None,
            precipitation_mm: None,
            precipitation_chance_pct: None,
            sunrise: None,
            sunset: None,
        }
    }
}

/// One period of an NWS zone forecast, passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonePeriod {
    pub name: String,
    pub detailed_forecast: String,
}
