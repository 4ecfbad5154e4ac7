use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;

use crate::{
    Config,
    error::{Error, Result},
    model::{ForecastDay, WeatherSnapshot},
    provider::{nws::NwsProvider, openmeteo::OpenMeteoProvider},
};

pub mod nws;
pub mod openmeteo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    Nws,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Nws => "nws",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::Nws]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "nws" | "noaa" => Ok(ProviderId::Nws),
            _ => Err(Error::Config(format!(
                "unknown provider '{value}'. Supported providers: open-meteo, nws."
            ))),
        }
    }
}

/// A weather data source. Implementations normalize their native payload
/// into `WeatherSnapshot`/`ForecastDay` with canonical metric units and
/// `None` for anything the payload left out.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Longest forecast this provider can serve; `fetch_forecast`
    /// requests are clamped to `[1, max]`.
    fn max_forecast_days(&self) -> u16;

    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;

    async fn fetch_forecast(&self, lat: f64, lon: f64, days: u16) -> Result<Vec<ForecastDay>>;
}

/// Out-of-range day counts are clamped, not rejected, so the caller
/// always gets a bounded non-empty forecast.
pub fn clamp_days(days: u16, max: u16) -> u16 {
    days.clamp(1, max.max(1))
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(id: ProviderId, config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let timeout = config.timeout()?;
    let url = config.provider_url(id);

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new(url, timeout)?),
        ProviderId::Nws => Box::new(NwsProvider::new(url, timeout)?),
    };

    Ok(boxed)
}

/// Construct the provider selected by the config's `provider` key.
pub fn default_provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let id = config.provider_id()?;
    provider_from_config(id, config)
}

/// Map a reqwest transport failure onto the error taxonomy: an elapsed
/// timeout is `Timeout`, everything else (DNS, refused connection, TLS)
/// is `Network`.
pub(crate) fn transport_error(err: &reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout.as_secs())
    } else {
        Error::Network(err.to_string())
    }
}

/// Keep provider error bodies readable when they are huge HTML pages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = body.char_indices().take_while(|(i, _)| *i < MAX).last().map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn noaa_is_an_alias_for_nws() {
        assert_eq!(ProviderId::try_from("noaa").unwrap(), ProviderId::Nws);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Supported providers"));
    }

    #[test]
    fn clamp_days_bounds_both_ends() {
        assert_eq!(clamp_days(0, 16), 1);
        assert_eq!(clamp_days(30, 16), 16);
        assert_eq!(clamp_days(7, 16), 7);
        assert_eq!(clamp_days(7, 7), 7);
        assert_eq!(clamp_days(1, 16), 1);
    }

    #[test]
    fn provider_from_config_uses_config_key() {
        let cfg = Config::default();
        let provider = default_provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::OpenMeteo);

        let cfg = Config { provider: Some("nws".to_string()), ..Config::default() };
        let provider = default_provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::Nws);
    }

    #[test]
    fn unconfigured_provider_key_is_a_config_error() {
        let cfg = Config { provider: Some("weatherapi".to_string()), ..Config::default() };
        assert!(matches!(default_provider_from_config(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < 250);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
