use std::{collections::HashMap, path::{Path, PathBuf}, time::Duration};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    provider::ProviderId,
    store,
    units::UnitSystem,
};

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 10.0;

/// Configuration for a single provider entry (endpoint override, API key
/// for providers that need one, free-form notes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Top-level configuration stored on disk as JSON.
///
/// Unrecognized keys are ignored, missing keys fall back to built-in
/// defaults, and values are validated by the typed accessors rather than
/// at load time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Display unit, "C" or "F".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Provider key, e.g. "open-meteo" or "nws".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Single-request timeout; positive seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,

    #[serde(default)]
    pub no_emoji: bool,

    /// Example JSON:
    /// "providers": { "open-meteo": { "url": "...", "notes": "..." } }
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl Config {
    /// Display unit system; defaults to Celsius when unset.
    pub fn unit(&self) -> Result<UnitSystem> {
        match self.unit.as_deref() {
            Some(value) => UnitSystem::try_from(value),
            None => Ok(UnitSystem::Metric),
        }
    }

    /// The configured provider as a strongly-typed id; defaults to
    /// Open-Meteo, which needs no API key.
    pub fn provider_id(&self) -> Result<ProviderId> {
        match self.provider.as_deref() {
            Some(value) => ProviderId::try_from(value),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    /// Request timeout; default 10 s, must be positive.
    pub fn timeout(&self) -> Result<Duration> {
        let seconds = self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::Config(format!(
                "timeout_seconds must be a positive number, got {seconds}"
            )));
        }
        Ok(Duration::from_secs_f64(seconds))
    }

    pub fn provider_settings(&self, id: ProviderId) -> Option<&ProviderSettings> {
        self.providers.get(id.as_str())
    }

    /// Endpoint override for a provider, if configured.
    pub fn provider_url(&self, id: ProviderId) -> Option<&str> {
        self.provider_settings(id).and_then(|settings| settings.url.as_deref())
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(store::read_json(path)?.unwrap_or_default())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize configuration: {e}")))?;
        store::write_atomic(path, &json)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.json"))
    }

    /// Path for a named data file (airport directory, favorites, search
    /// cache) in the platform data directory.
    pub fn data_file_path(name: &str) -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join(name))
    }

    /// The config seeded by `--setup`: Fahrenheit, NWS as the active
    /// provider, and the full provider table with notes so users can see
    /// what else exists and where keys would go.
    pub fn default_for_setup() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "open-meteo".to_string(),
            ProviderSettings {
                url: Some("https://api.open-meteo.com/v1/forecast".to_string()),
                api_key: None,
                notes: Some("Free, no API key required, global".to_string()),
            },
        );
        providers.insert(
            "nws".to_string(),
            ProviderSettings {
                url: Some("https://api.weather.gov".to_string()),
                api_key: None,
                notes: Some("US only, no API key required, official NWS".to_string()),
            },
        );
        providers.insert(
            "openweathermap".to_string(),
            ProviderSettings {
                url: Some("https://api.openweathermap.org/data/2.5/onecall".to_string()),
                api_key: Some("YOUR_OPENWEATHERMAP_API_KEY".to_string()),
                notes: Some("Free tier, global, requires API key (https://openweathermap.org/api); no adapter yet".to_string()),
            },
        );
        providers.insert(
            "weatherapi".to_string(),
            ProviderSettings {
                url: Some("https://api.weatherapi.com/v1/forecast.json".to_string()),
                api_key: Some("YOUR_WEATHERAPI_KEY".to_string()),
                notes: Some("Free tier, global, requires API key (https://www.weatherapi.com/); no adapter yet".to_string()),
            },
        );
        providers.insert(
            "weatherbit".to_string(),
            ProviderSettings {
                url: Some("https://api.weatherbit.io/v2.0/forecast/daily".to_string()),
                api_key: Some("YOUR_WEATHERBIT_KEY".to_string()),
                notes: Some("Free tier, global, requires API key (https://www.weatherbit.io/api); no adapter yet".to_string()),
            },
        );
        providers.insert(
            "visualcrossing".to_string(),
            ProviderSettings {
                url: Some("https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline".to_string()),
                api_key: Some("YOUR_VISUALCROSSING_KEY".to_string()),
                notes: Some("Free tier, global, requires API key (https://www.visualcrossing.com/weather-api); no adapter yet".to_string()),
            },
        );
        Config {
            unit: Some("F".to_string()),
            provider: Some("nws".to_string()),
            timeout_seconds: Some(DEFAULT_TIMEOUT_SECONDS),
            no_emoji: false,
            providers,
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "avwx", "avwx")
        .ok_or_else(|| Error::Config("could not determine platform config directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_keys_are_missing() {
        let cfg = Config::default();
        assert_eq!(cfg.unit().unwrap(), UnitSystem::Metric);
        assert_eq!(cfg.provider_id().unwrap(), ProviderId::OpenMeteo);
        assert_eq!(cfg.timeout().unwrap(), Duration::from_secs(10));
        assert!(!cfg.no_emoji);
    }

    #[test]
    fn invalid_unit_is_a_config_error() {
        let cfg = Config { unit: Some("X".to_string()), ..Config::default() };
        assert!(matches!(cfg.unit(), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let cfg = Config { timeout_seconds: Some(0.0), ..Config::default() };
        assert!(matches!(cfg.timeout(), Err(Error::Config(_))));
        let cfg = Config { timeout_seconds: Some(-3.0), ..Config::default() };
        assert!(matches!(cfg.timeout(), Err(Error::Config(_))));
        let cfg = Config { timeout_seconds: Some(2.5), ..Config::default() };
        assert_eq!(cfg.timeout().unwrap(), Duration::from_secs_f64(2.5));
    }

    #[test]
    fn unknown_provider_key_is_rejected_lazily() {
        let cfg = Config { provider: Some("weatherbit".to_string()), ..Config::default() };
        let err = cfg.provider_id().unwrap_err();
        assert!(err.to_string().contains("open-meteo"));
    }

    #[test]
    fn unrecognized_json_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"unit":"F","future_flag":true,"nested":{"a":1}}"#).unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.unit().unwrap(), UnitSystem::Imperial);
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config::default_for_setup();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.unit().unwrap(), UnitSystem::Imperial);
        assert_eq!(loaded.provider_id().unwrap(), ProviderId::Nws);
        assert!(loaded.provider_url(ProviderId::OpenMeteo).unwrap().contains("open-meteo"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.provider_id().unwrap(), ProviderId::OpenMeteo);
    }
}
