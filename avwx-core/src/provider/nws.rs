use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{Error, Result},
    model::{Condition, ForecastDay, WeatherSnapshot, ZonePeriod},
    provider::{clamp_days, transport_error, truncate_body, ProviderId, WeatherProvider},
    units,
};

const DEFAULT_URL: &str = "https://api.weather.gov";

/// The NWS gridpoint product covers roughly a week.
pub const MAX_FORECAST_DAYS: u16 = 7;

/// National Weather Service adapter (US only). One `points` lookup
/// resolves the gridpoint URLs, then the forecast products are fetched
/// and folded into the normalized model: temperatures arrive in °F and
/// conditions as text, both converted here.
#[derive(Debug, Clone)]
pub struct NwsProvider {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl NwsProvider {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        // api.weather.gov rejects requests without a User-Agent.
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("avwx-cli/0.1 (airport weather lookups)")
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(NwsProvider { base_url: base_url.unwrap_or(DEFAULT_URL).to_string(), http, timeout })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("requesting {url}");
        let res =
            self.http.get(url).send().await.map_err(|e| transport_error(&e, self.timeout))?;
        let status = res.status();
        let body = res.text().await.map_err(|e| transport_error(&e, self.timeout))?;
        if !status.is_success() {
            return Err(Error::BadResponse(format!(
                "NWS request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::BadResponse(format!("failed to parse NWS JSON: {e}")))
    }

    async fn point_props(&self, lat: f64, lon: f64) -> Result<NwsPointProps> {
        // The points endpoint wants at most four decimal places.
        let url = format!("{}/points/{:.4},{:.4}", self.base_url, lat, lon);
        let points: NwsPoints = self.fetch_json(&url).await?;
        Ok(points.properties)
    }

    /// The NWS-only zone forecast, passed through as period name plus
    /// narrative without normalization.
    pub async fn zone_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ZonePeriod>> {
        let props = self.point_props(lat, lon).await?;
        let zone_url = props.forecast_zone.ok_or_else(|| {
            Error::BadResponse("NWS points response had no forecastZone".to_string())
        })?;
        let forecast: NwsForecast = self.fetch_json(&format!("{zone_url}/forecast")).await?;
        let periods = forecast
            .properties
            .periods
            .into_iter()
            .map(|p| ZonePeriod { name: p.name, detailed_forecast: p.detailed_forecast })
            .collect::<Vec<_>>();
        if periods.is_empty() {
            return Err(Error::BadResponse("NWS zone forecast had no periods".to_string()));
        }
        Ok(periods)
    }
}

#[async_trait]
impl WeatherProvider for NwsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Nws
    }

    fn max_forecast_days(&self) -> u16 {
        MAX_FORECAST_DAYS
    }

    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        let props = self.point_props(lat, lon).await?;
        let url = props.forecast_hourly.ok_or_else(|| {
            Error::BadResponse("NWS points response had no hourly forecast".to_string())
        })?;
        let forecast: NwsForecast = self.fetch_json(&url).await?;
        let period = forecast.properties.periods.into_iter().next().ok_or_else(|| {
            Error::BadResponse("NWS hourly forecast had no periods".to_string())
        })?;
        Ok(snapshot_from_period(&period))
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64, days: u16) -> Result<Vec<ForecastDay>> {
        let days = clamp_days(days, MAX_FORECAST_DAYS);
        let props = self.point_props(lat, lon).await?;
        let url = props.forecast.ok_or_else(|| {
            Error::BadResponse("NWS points response had no forecast".to_string())
        })?;
        let forecast: NwsForecast = self.fetch_json(&url).await?;
        let mut folded = forecast_from_periods(&forecast.properties.periods);
        if folded.is_empty() {
            return Err(Error::BadResponse("NWS forecast had no periods".to_string()));
        }
        folded.truncate(days as usize);
        Ok(folded)
    }
}

#[derive(Debug, Deserialize)]
struct NwsPoints {
    properties: NwsPointProps,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsPointProps {
    forecast: Option<String>,
    forecast_hourly: Option<String>,
    forecast_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NwsForecast {
    properties: NwsForecastProps,
}

#[derive(Debug, Deserialize)]
struct NwsForecastProps {
    #[serde(default)]
    periods: Vec<NwsPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NwsPeriod {
    name: String,
    start_time: Option<String>,
    is_daytime: bool,
    temperature: Option<f64>,
    temperature_unit: String,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
    relative_humidity: Option<NwsValue>,
    dewpoint: Option<NwsUnitValue>,
    probability_of_precipitation: Option<NwsValue>,
    short_forecast: String,
    detailed_forecast: String,
}

#[derive(Debug, Deserialize)]
struct NwsValue {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NwsUnitValue {
    #[serde(rename = "unitCode")]
    unit_code: Option<String>,
    value: Option<f64>,
}

fn to_celsius(value: f64, unit: &str) -> f64 {
    if unit.contains('F') {
        units::celsius_from_fahrenheit(value)
    } else {
        value
    }
}

/// "10 mph", "5 to 15 mph" and "20 km/h" all appear; take the upper
/// bound and normalize to km/h.
fn parse_wind_speed_kmh(text: &str) -> Option<f64> {
    let max = text
        .split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))?;
    if text.contains("km/h") {
        Some(max)
    } else {
        Some(units::kmh_from_mph(max))
    }
}

fn compass_to_degrees(direction: &str) -> Option<f64> {
    let points = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = points.iter().position(|p| p.eq_ignore_ascii_case(direction.trim()))?;
    Some(idx as f64 * 22.5)
}

fn period_date(period: &NwsPeriod) -> Option<NaiveDate> {
    period_time(period).map(|t| t.date())
}

fn period_time(period: &NwsPeriod) -> Option<NaiveDateTime> {
    period
        .start_time
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.naive_local())
}

fn snapshot_from_period(period: &NwsPeriod) -> WeatherSnapshot {
    let condition = if period.short_forecast.is_empty() {
        None
    } else {
        Some(Condition::from_text(&period.short_forecast))
    };
    WeatherSnapshot {
        observed_at: period_time(period),
        condition,
        temperature_c: period.temperature.map(|t| to_celsius(t, &period.temperature_unit)),
        humidity_pct: period.relative_humidity.as_ref().and_then(|v| v.value),
        dew_point_c: period.dewpoint.as_ref().and_then(|d| {
            let unit = d.unit_code.as_deref().unwrap_or("wmoUnit:degC");
            d.value.map(|v| to_celsius(v, unit))
        }),
        wind_speed_kmh: period.wind_speed.as_deref().and_then(parse_wind_speed_kmh),
        wind_direction_deg: period.wind_direction.as_deref().and_then(compass_to_degrees),
        ..WeatherSnapshot::default()
    }
}

/// Fold half-day periods into per-date aggregates. Daytime temperature
/// feeds the max, nighttime the min; unknown values are excluded rather
/// than treated as zero, and a date where everything was unknown keeps
/// unknown aggregates.
fn forecast_from_periods(periods: &[NwsPeriod]) -> Vec<ForecastDay> {
    let mut by_date: BTreeMap<NaiveDate, ForecastDay> = BTreeMap::new();
    for period in periods {
        let Some(date) = period_date(period) else { continue };
        let day = by_date.entry(date).or_insert_with(|| ForecastDay::empty(date));

        if let Some(temp) = period.temperature.map(|t| to_celsius(t, &period.temperature_unit)) {
            if period.is_daytime {
                day.temp_max_c = Some(day.temp_max_c.map_or(temp, |t| t.max(temp)));
            } else {
                day.temp_min_c = Some(day.temp_min_c.map_or(temp, |t| t.min(temp)));
            }
        }
        if let Some(chance) =
            period.probability_of_precipitation.as_ref().and_then(|v| v.value)
        {
            day.precipitation_chance_pct =
                Some(day.precipitation_chance_pct.map_or(chance, |c| c.max(chance)));
        }
        // Daytime narrative names the day's condition; nights only fill
        // gaps.
        if !period.short_forecast.is_empty() && (period.is_daytime || day.condition.is_none()) {
            day.condition = Some(Condition::from_text(&period.short_forecast));
        }
    }
    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORECAST_JSON: &str = r#"{
        "properties": {
            "periods": [
                {
                    "name": "Tuesday",
                    "startTime": "2026-08-04T06:00:00-04:00",
                    "isDaytime": true,
                    "temperature": 86,
                    "temperatureUnit": "F",
                    "windSpeed": "5 to 10 mph",
                    "windDirection": "SW",
                    "probabilityOfPrecipitation": {"value": 30},
                    "shortForecast": "Chance Rain Showers"
                },
                {
                    "name": "Tuesday Night",
                    "startTime": "2026-08-04T18:00:00-04:00",
                    "isDaytime": false,
                    "temperature": 68,
                    "temperatureUnit": "F",
                    "windSpeed": "5 mph",
                    "windDirection": "S",
                    "probabilityOfPrecipitation": {"value": 60},
                    "shortForecast": "Showers And Thunderstorms"
                },
                {
                    "name": "Wednesday",
                    "startTime": "2026-08-05T06:00:00-04:00",
                    "isDaytime": true,
                    "temperature": 79,
                    "temperatureUnit": "F",
                    "windSpeed": null,
                    "windDirection": null,
                    "probabilityOfPrecipitation": {"value": null},
                    "shortForecast": "Mostly Sunny"
                }
            ]
        }
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wind_speed_parsing_takes_the_upper_bound() {
        assert_eq!(parse_wind_speed_kmh("10 mph"), Some(units::kmh_from_mph(10.0)));
        assert_eq!(parse_wind_speed_kmh("5 to 15 mph"), Some(units::kmh_from_mph(15.0)));
        assert_eq!(parse_wind_speed_kmh("20 km/h"), Some(20.0));
        assert_eq!(parse_wind_speed_kmh("calm"), None);
    }

    #[test]
    fn compass_points_map_to_degrees() {
        assert_eq!(compass_to_degrees("N"), Some(0.0));
        assert_eq!(compass_to_degrees("E"), Some(90.0));
        assert_eq!(compass_to_degrees("ssw"), Some(202.5));
        assert_eq!(compass_to_degrees("NNW"), Some(337.5));
        assert_eq!(compass_to_degrees("variable"), None);
    }

    #[test]
    fn periods_fold_into_chronological_days() {
        let forecast: NwsForecast = serde_json::from_str(FORECAST_JSON).unwrap();
        let days = forecast_from_periods(&forecast.properties.periods);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(2026, 8, 4));
        assert_eq!(days[1].date, date(2026, 8, 5));

        // 86°F day / 68°F night.
        assert!((days[0].temp_max_c.unwrap() - 30.0).abs() < 0.1);
        assert!((days[0].temp_min_c.unwrap() - 20.0).abs() < 0.1);
        // Chance is the max over the day's periods.
        assert_eq!(days[0].precipitation_chance_pct, Some(60.0));
        // Daytime narrative wins over the night one.
        assert_eq!(days[0].condition, Some(Condition::Rain));

        // Wednesday has no night period yet: min stays unknown, and the
        // null probability stays unknown instead of becoming zero.
        assert!(days[1].temp_min_c.is_none());
        assert!(days[1].precipitation_chance_pct.is_none());
        assert_eq!(days[1].condition, Some(Condition::Clear));
    }

    #[test]
    fn snapshot_from_hourly_period_normalizes_units() {
        let forecast: NwsForecast = serde_json::from_str(FORECAST_JSON).unwrap();
        let snapshot = snapshot_from_period(&forecast.properties.periods[0]);

        assert!((snapshot.temperature_c.unwrap() - 30.0).abs() < 0.1);
        assert_eq!(snapshot.wind_direction_deg, Some(225.0));
        assert!((snapshot.wind_speed_kmh.unwrap() - units::kmh_from_mph(10.0)).abs() < 1e-9);
        assert_eq!(snapshot.condition, Some(Condition::Rain));
        // Fields the product does not carry stay unknown.
        assert!(snapshot.pressure_msl_hpa.is_none());
        assert!(snapshot.visibility_m.is_none());
    }
}
