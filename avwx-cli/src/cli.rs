use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use avwx_core::{
    airports::{self, resolve_ident, AirportIndex, AirportRecord},
    cache::SearchCache,
    config::Config,
    provider::{clamp_days, default_provider_from_config, nws::NwsProvider, ProviderId, WeatherProvider},
    units::UnitSystem,
    AirportType,
};
use chrono::Local;
use clap::{CommandFactory, Parser};

use crate::{favorites::Favorites, report};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "avwx", version, about = "Current weather and forecasts by airport code (ICAO/IATA)")]
pub struct Cli {
    /// Airport code, name or city to look up (e.g. JFK, KSEA, "van nuys").
    pub ident: Option<String>,

    /// Show a multi-day forecast.
    #[arg(long, short = 'f')]
    pub forecast: bool,

    /// Number of forecast days; clamped to what the provider supports.
    #[arg(long, default_value_t = 7)]
    pub days: u16,

    /// Temperature unit, C or F (overrides the config file).
    #[arg(long)]
    pub unit: Option<String>,

    /// Search airports by code, name or city.
    #[arg(long, short = 's', value_name = "QUERY")]
    pub search: Option<String>,

    /// Interactively add a custom airport to the local directory.
    #[arg(long, short = 'a')]
    pub add_airport: bool,

    /// Rebuild the airport directory from the OurAirports dump.
    #[arg(long)]
    pub update_airports: bool,

    /// Disable emoji in weather output.
    #[arg(long)]
    pub no_emoji: bool,

    /// Show the NWS zone forecast for the airport (US only).
    #[arg(long, alias = "zf")]
    pub zone_forecast: bool,

    /// Create a default config.json.
    #[arg(long)]
    pub setup: bool,

    /// Show weather for every favorite airport.
    #[arg(long, alias = "wf")]
    pub weather_favorites: bool,

    /// Add an airport code to the favorites list.
    #[arg(long, alias = "af", value_name = "CODE")]
    pub add_favorite: Option<String>,

    /// Remove an airport code from the favorites list.
    #[arg(long, alias = "rf", value_name = "CODE")]
    pub remove_favorite: Option<String>,

    /// List the favorite airports.
    #[arg(long, alias = "lf")]
    pub list_favorites: bool,

    /// List every airport in the local directory.
    #[arg(long, short = 'l')]
    pub list_airports: bool,

    /// Also write the report to a file (only on success, never partial).
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Some(code) = &self.add_favorite {
            return add_favorite(code);
        }
        if let Some(code) = &self.remove_favorite {
            return remove_favorite(code);
        }
        if self.list_favorites {
            return list_favorites();
        }
        if self.setup {
            return setup();
        }
        if self.update_airports {
            return update_airports().await;
        }
        if self.list_airports {
            return list_airports();
        }
        if let Some(query) = &self.search {
            return search(query);
        }
        if self.add_airport {
            return add_airport();
        }
        if self.weather_favorites {
            return self.weather_for_favorites().await;
        }
        if let Some(ident) = self.ident.clone() {
            if self.zone_forecast {
                return self.zone_forecast_for(&ident).await;
            }
            return self.weather_for(&ident).await;
        }

        Cli::command().print_help().context("Failed to print help")?;
        Ok(())
    }

    fn unit_system(&self, config: &Config) -> Result<UnitSystem> {
        match &self.unit {
            Some(value) => Ok(UnitSystem::try_from(value.as_str())?),
            None => Ok(config.unit()?),
        }
    }

    /// Single-airport weather, the default command.
    async fn weather_for(&self, ident: &str) -> Result<()> {
        let config = Config::load()?;
        let unit = self.unit_system(&config)?;
        let no_emoji = self.no_emoji || config.no_emoji;
        let provider = default_provider_from_config(&config)?;
        self.note_clamped_days(provider.as_ref());

        let index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
        let mut cache = open_cache()?;

        let result = self.lookup_one(ident, &index, &mut cache, provider.as_ref(), unit, no_emoji).await;
        cache.save()?;

        let text = result?;
        print!("{text}");
        self.persist_output(&text)
    }

    /// Weather for every favorite, sequentially. One failing favorite is
    /// reported inline and does not stop the rest; the exit code still
    /// reflects the failure.
    async fn weather_for_favorites(&self) -> Result<()> {
        let config = Config::load()?;
        let unit = self.unit_system(&config)?;
        let no_emoji = self.no_emoji || config.no_emoji;
        let provider = default_provider_from_config(&config)?;
        self.note_clamped_days(provider.as_ref());

        let favorites = Favorites::load(&Config::data_file_path("favorites.json")?)?;
        if favorites.is_empty() {
            println!("No favorites set.");
            return Ok(());
        }

        let index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
        let mut cache = open_cache()?;

        let mut codes: Vec<String> = favorites.codes().to_vec();
        codes.sort();

        let mut out = String::new();
        let mut failures = 0usize;
        for code in &codes {
            match self.lookup_one(code, &index, &mut cache, provider.as_ref(), unit, no_emoji).await
            {
                Ok(text) => {
                    print!("{text}");
                    out.push_str(&text);
                }
                Err(err) => {
                    eprintln!("{code}: {err:#}");
                    failures += 1;
                }
            }
        }
        cache.save()?;

        if failures > 0 {
            bail!("{failures} of {} favorite lookups failed", codes.len());
        }
        self.persist_output(&out)
    }

    /// Resolve one identifier and build its full report text.
    async fn lookup_one(
        &self,
        ident: &str,
        index: &AirportIndex,
        cache: &mut SearchCache,
        provider: &dyn WeatherProvider,
        unit: UnitSystem,
        no_emoji: bool,
    ) -> Result<String> {
        let record = resolve_ident(index, cache, ident, Local::now())?;
        let snapshot = provider
            .fetch_current(record.lat, record.lon)
            .await
            .with_context(|| format!("Failed to fetch weather for {}", record.primary_code()))?;
        let forecast = if self.forecast {
            let days = provider
                .fetch_forecast(record.lat, record.lon, self.days)
                .await
                .with_context(|| format!("Failed to fetch forecast for {}", record.primary_code()))?;
            Some(days)
        } else {
            None
        };
        Ok(report::weather_report(
            record,
            &snapshot,
            forecast.as_deref(),
            unit,
            no_emoji,
            provider.id(),
        ))
    }

    /// The NWS zone product for the airport's location, regardless of
    /// the configured provider.
    async fn zone_forecast_for(&self, ident: &str) -> Result<()> {
        let config = Config::load()?;
        let index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
        let mut cache = open_cache()?;

        let record: AirportRecord =
            resolve_ident(&index, &mut cache, ident, Local::now())?.clone();
        cache.save()?;

        let provider =
            NwsProvider::new(config.provider_url(ProviderId::Nws), config.timeout()?)?;
        let periods = provider
            .zone_forecast(record.lat, record.lon)
            .await
            .with_context(|| format!("Failed to fetch zone forecast for {}", record.primary_code()))?;

        let text = report::zone_report(&record, &periods);
        print!("{text}");
        self.persist_output(&text)
    }

    fn note_clamped_days(&self, provider: &dyn WeatherProvider) {
        if !self.forecast {
            return;
        }
        let max = provider.max_forecast_days();
        let clamped = clamp_days(self.days, max);
        if clamped != self.days {
            println!("Note: --days clamped to {clamped} (supported range: 1-{max}).");
        }
    }

    fn persist_output(&self, text: &str) -> Result<()> {
        if let Some(path) = &self.output {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            tracing::debug!("report written to {}", path.display());
        }
        Ok(())
    }
}

/// Open the search cache and announce the daily reset when one happens.
fn open_cache() -> Result<SearchCache> {
    let today = Local::now().date_naive();
    let mut cache = SearchCache::load(&Config::data_file_path("search_cache.json")?, today)?;
    if cache.maybe_reset(today) {
        println!("Search cache reset for {today}.");
    }
    Ok(cache)
}

fn search(query: &str) -> Result<()> {
    let index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
    let mut cache = open_cache()?;

    let results = index.search(query);
    if results.is_empty() {
        println!("No airports found matching query.");
    } else {
        let codes: Vec<String> = results.iter().map(|r| r.primary_code().to_string()).collect();
        cache.put(query, codes, Local::now());
        print!("{}", report::search_results(&results));
    }
    cache.save()?;
    Ok(())
}

fn list_airports() -> Result<()> {
    let index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
    if index.is_empty() {
        println!("No airports available.");
        return Ok(());
    }
    println!("Available airports:");
    for record in index.list() {
        println!("{}", report::airport_line(record));
    }
    Ok(())
}

/// Interview the user for a custom airport and append it to the
/// directory.
fn add_airport() -> Result<()> {
    println!("Add a custom airport:");
    let code = inquire::Text::new("Airport code (3-4 letters):")
        .prompt()
        .context("Cancelled")?
        .trim()
        .to_uppercase();
    let name = inquire::Text::new("Airport name:").prompt().context("Cancelled")?;
    let city = inquire::Text::new("City:").prompt().context("Cancelled")?;
    let lat = inquire::CustomType::<f64>::new("Latitude:")
        .with_error_message("Please enter a number")
        .prompt()
        .context("Cancelled")?;
    let lon = inquire::CustomType::<f64>::new("Longitude:")
        .with_error_message("Please enter a number")
        .prompt()
        .context("Cancelled")?;

    let record = AirportRecord {
        icao_code: if code.len() == 4 { code.clone() } else { String::new() },
        iata_code: if code.len() == 3 { code.clone() } else { String::new() },
        name: name.trim().to_string(),
        city: city.trim().to_string(),
        lat,
        lon,
        iso_country: String::new(),
        iso_region: String::new(),
        elevation_ft: None,
        kind: AirportType::CustomAirport,
        scheduled_service: false,
        local_code: if code.len() != 3 && code.len() != 4 { code.clone() } else { String::new() },
        gps_code: String::new(),
        faa_lid: String::new(),
    };

    let mut index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
    index.add(record)?;
    println!("Added custom airport {code}: {name} ({city})");
    Ok(())
}

async fn update_airports() -> Result<()> {
    let config = Config::load()?;
    println!("Downloading airports.csv from OurAirports...");
    let body = airports::fetch_ourairports_csv(config.timeout()?).await?;
    let mut index = AirportIndex::load(&Config::data_file_path("airports.json")?)?;
    let count = index.rebuild_from_source(body.as_bytes())?;
    println!("Updated airport directory with {count} airports.");
    Ok(())
}

fn setup() -> Result<()> {
    let path = Config::config_file_path()?;
    if path.exists() {
        println!("config.json already exists at {}", path.display());
        return Ok(());
    }
    Config::default_for_setup().save_to(&path)?;
    println!("Created default config.json at {}", path.display());
    Ok(())
}

fn add_favorite(code: &str) -> Result<()> {
    let mut favorites = Favorites::load(&Config::data_file_path("favorites.json")?)?;
    if favorites.add(code) {
        favorites.save()?;
        println!("Added {} to favorites.", code.trim().to_uppercase());
    } else {
        println!("{} is already a favorite.", code.trim().to_uppercase());
    }
    Ok(())
}

fn remove_favorite(code: &str) -> Result<()> {
    let mut favorites = Favorites::load(&Config::data_file_path("favorites.json")?)?;
    if favorites.remove(code) {
        favorites.save()?;
        println!("Removed {} from favorites.", code.trim().to_uppercase());
    } else {
        println!("{} is not in favorites.", code.trim().to_uppercase());
    }
    Ok(())
}

fn list_favorites() -> Result<()> {
    let favorites = Favorites::load(&Config::data_file_path("favorites.json")?)?;
    if favorites.is_empty() {
        println!("No favorites set.");
        return Ok(());
    }
    println!("Favorite airports:");
    for code in favorites.codes() {
        println!("  {code}");
    }
    Ok(())
}
