use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{Condition, ForecastDay, WeatherSnapshot},
    provider::{clamp_days, transport_error, truncate_body, ProviderId, WeatherProvider},
};

const DEFAULT_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Open-Meteo serves up to 16 forecast days on the free endpoint.
pub const MAX_FORECAST_DAYS: u16 = 16;

const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,dew_point_2m,\
apparent_temperature,precipitation,rain,showers,snowfall,weather_code,cloud_cover,\
visibility,uv_index,pressure_msl,surface_pressure,wind_speed_10m,wind_direction_10m,\
wind_gusts_10m";

const DAILY_VARS: &str = "temperature_2m_max,temperature_2m_min,weather_code,\
precipitation_sum,precipitation_probability_max,sunrise,sunset";

/// Open-Meteo adapter. No API key; canonical units (°C, km/h, hPa, mm)
/// are the endpoint's defaults, so no unit parameters are sent.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl OpenMeteoProvider {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(OpenMeteoProvider {
            base_url: base_url.unwrap_or(DEFAULT_URL).to_string(),
            http,
            timeout,
        })
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<OmResponse> {
        tracing::debug!("requesting {} with {:?}", self.base_url, query);
        let res = self
            .http
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| transport_error(&e, self.timeout))?;

        if !status.is_success() {
            return Err(Error::BadResponse(format!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::BadResponse(format!("failed to parse Open-Meteo JSON: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    fn max_forecast_days(&self) -> u16 {
        MAX_FORECAST_DAYS
    }

    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        // One forecast day rides along to pick up today's sunrise/sunset.
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", CURRENT_VARS.to_string()),
            ("daily", "sunrise,sunset".to_string()),
            ("forecast_days", "1".to_string()),
            ("timezone", "auto".to_string()),
        ];
        let parsed = self.fetch(&query).await?;
        let current = parsed
            .current
            .ok_or_else(|| Error::BadResponse("Open-Meteo response had no current block".to_string()))?;
        let today = Local::now().date_naive();
        Ok(snapshot_from(current, parsed.daily.as_ref(), today))
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64, days: u16) -> Result<Vec<ForecastDay>> {
        let days = clamp_days(days, MAX_FORECAST_DAYS);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("daily", DAILY_VARS.to_string()),
            ("forecast_days", days.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let parsed = self.fetch(&query).await?;
        let daily = parsed
            .daily
            .ok_or_else(|| Error::BadResponse("Open-Meteo response had no daily block".to_string()))?;
        let forecast = forecast_from(daily);
        if forecast.is_empty() {
            return Err(Error::BadResponse("Open-Meteo daily block was empty".to_string()));
        }
        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    dew_point_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    precipitation: Option<f64>,
    rain: Option<f64>,
    showers: Option<f64>,
    snowfall: Option<f64>,
    weather_code: Option<u16>,
    cloud_cover: Option<f64>,
    visibility: Option<f64>,
    uv_index: Option<f64>,
    pressure_msl: Option<f64>,
    surface_pressure: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    wind_gusts_10m: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: Option<OmCurrent>,
    daily: Option<OmDaily>,
}

/// Open-Meteo local timestamps come as "2026-08-05T14:30", occasionally
/// with seconds.
fn parse_local(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn snapshot_from(current: OmCurrent, daily: Option<&OmDaily>, today: NaiveDate) -> WeatherSnapshot {
    // Sunrise/sunset for the calendar day matching "today", if present.
    let (sunrise, sunset) = daily
        .and_then(|d| {
            let idx = d
                .time
                .iter()
                .position(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok() == Some(today))?;
            let rise = d.sunrise.get(idx).and_then(|s| s.as_deref()).and_then(parse_local);
            let set = d.sunset.get(idx).and_then(|s| s.as_deref()).and_then(parse_local);
            Some((rise, set))
        })
        .unwrap_or((None, None));

    WeatherSnapshot {
        observed_at: current.time.as_deref().and_then(parse_local),
        condition: current.weather_code.map(Condition::from_wmo_code),
        temperature_c: current.temperature_2m,
        apparent_c: current.apparent_temperature,
        humidity_pct: current.relative_humidity_2m,
        dew_point_c: current.dew_point_2m,
        wind_speed_kmh: current.wind_speed_10m,
        wind_direction_deg: current.wind_direction_10m,
        wind_gusts_kmh: current.wind_gusts_10m,
        pressure_msl_hpa: current.pressure_msl,
        surface_pressure_hpa: current.surface_pressure,
        cloud_cover_pct: current.cloud_cover,
        precipitation_mm: current.precipitation,
        rain_mm: current.rain,
        showers_mm: current.showers,
        snowfall_cm: current.snowfall,
        visibility_m: current.visibility,
        uv_index: current.uv_index,
        sunrise,
        sunset,
    }
}

fn forecast_from(daily: OmDaily) -> Vec<ForecastDay> {
    let mut days: Vec<ForecastDay> = daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let mut day = ForecastDay::empty(date);
            day.temp_max_c = daily.temperature_2m_max.get(i).copied().flatten();
            day.temp_min_c = daily.temperature_2m_min.get(i).copied().flatten();
            day.condition =
                daily.weather_code.get(i).copied().flatten().map(Condition::from_wmo_code);
            day.precipitation_mm = daily.precipitation_sum.get(i).copied().flatten();
            day.precipitation_chance_pct =
                daily.precipitation_probability_max.get(i).copied().flatten();
            day.sunrise = daily.sunrise.get(i).and_then(|s| s.as_deref()).and_then(parse_local);
            day.sunset = daily.sunset.get(i).and_then(|s| s.as_deref()).and_then(parse_local);
            Some(day)
        })
        .collect();
    days.sort_by_key(|day| day.date);
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_JSON: &str = r#"{
        "current": {
            "time": "2026-08-05T14:30",
            "temperature_2m": 22.5,
            "relative_humidity_2m": 55.0,
            "dew_point_2m": 13.1,
            "apparent_temperature": 21.9,
            "precipitation": 0.0,
            "weather_code": 2,
            "cloud_cover": 40.0,
            "pressure_msl": 1016.2,
            "wind_speed_10m": 14.8,
            "wind_direction_10m": 250.0,
            "wind_gusts_10m": 22.2
        },
        "daily": {
            "time": ["2026-08-05"],
            "sunrise": ["2026-08-05T05:54"],
            "sunset": ["2026-08-05T20:06"]
        }
    }"#;

    const FORECAST_JSON: &str = r#"{
        "daily": {
            "time": ["2026-08-05", "2026-08-06", "2026-08-07"],
            "temperature_2m_max": [27.1, 24.0, null],
            "temperature_2m_min": [18.2, 16.5, 15.0],
            "weather_code": [3, 61, null],
            "precipitation_sum": [0.0, 4.2, 1.1],
            "precipitation_probability_max": [10.0, 80.0, null],
            "sunrise": ["2026-08-05T05:54", "2026-08-06T05:55", "2026-08-07T05:56"],
            "sunset": ["2026-08-05T20:06", "2026-08-06T20:05", "2026-08-07T20:03"]
        }
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_payload_normalizes_with_unknown_sentinels() {
        let parsed: OmResponse = serde_json::from_str(CURRENT_JSON).unwrap();
        let snapshot =
            snapshot_from(parsed.current.unwrap(), parsed.daily.as_ref(), date(2026, 8, 5));

        assert_eq!(snapshot.temperature_c, Some(22.5));
        assert_eq!(snapshot.condition, Some(Condition::PartlyCloudy));
        assert_eq!(snapshot.wind_speed_kmh, Some(14.8));
        assert!(snapshot.sunrise.is_some());
        assert!(snapshot.sunset.is_some());
        // Absent in the payload: unknown, not zero.
        assert!(snapshot.visibility_m.is_none());
        assert!(snapshot.uv_index.is_none());
        assert!(snapshot.snowfall_cm.is_none());
        // Present as zero stays zero.
        assert_eq!(snapshot.precipitation_mm, Some(0.0));
    }

    #[test]
    fn sunrise_is_dropped_when_today_is_not_in_the_daily_block() {
        let parsed: OmResponse = serde_json::from_str(CURRENT_JSON).unwrap();
        let snapshot =
            snapshot_from(parsed.current.unwrap(), parsed.daily.as_ref(), date(2026, 8, 9));
        assert!(snapshot.sunrise.is_none());
    }

    #[test]
    fn forecast_payload_is_chronological_with_per_field_unknowns() {
        let parsed: OmResponse = serde_json::from_str(FORECAST_JSON).unwrap();
        let days = forecast_from(parsed.daily.unwrap());

        assert_eq!(days.len(), 3);
        assert!(days.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert_eq!(days[0].date, date(2026, 8, 5));
        assert_eq!(days[1].condition, Some(Condition::Rain));
        assert_eq!(days[1].precipitation_chance_pct, Some(80.0));
        // Nulls in the arrays stay unknown.
        assert!(days[2].temp_max_c.is_none());
        assert!(days[2].condition.is_none());
        assert_eq!(days[2].temp_min_c, Some(15.0));
    }

    #[test]
    fn empty_daily_block_yields_no_days() {
        let days = forecast_from(OmDaily::default());
        assert!(days.is_empty());
    }

    #[test]
    fn local_timestamp_parsing() {
        assert!(parse_local("2026-08-05T14:30").is_some());
        assert!(parse_local("2026-08-05T14:30:15").is_some());
        assert!(parse_local("not a time").is_none());
    }
}
