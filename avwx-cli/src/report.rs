//! Human-friendly report text. Everything here returns a `String` so a
//! whole invocation's output can be persisted to a file all-or-nothing.

use avwx_core::{
    model::{ForecastDay, WeatherSnapshot, ZonePeriod},
    table::{ColumnSpec, TableRenderer},
    units::{self, UnitSystem},
    AirportRecord, ProviderId,
};
use chrono::NaiveDateTime;

const BANNER: &str = "========================================";

/// The current-conditions block, optionally followed by the forecast
/// table, wrapped in the banner.
pub fn weather_report(
    record: &AirportRecord,
    snapshot: &WeatherSnapshot,
    forecast: Option<&[ForecastDay]>,
    unit: UnitSystem,
    no_emoji: bool,
    provider: ProviderId,
) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&heading(record, "Weather"));
    out.push_str(&format!("Source: {provider}\n"));
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&current_block(snapshot, unit, no_emoji));
    if let Some(days) = forecast {
        out.push_str(&forecast_table(days, unit, no_emoji));
    }
    out.push_str(BANNER);
    out.push_str("\n\n");
    out
}

/// Banner heading shared by the weather and zone reports: identity,
/// codes, region and coordinates.
fn heading(record: &AirportRecord, what: &str) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    let city = if record.city.is_empty() {
        String::new()
    } else {
        format!(" ({})", record.city)
    };
    out.push_str(&format!("{what} for {} - {}{city}\n", record.primary_code(), record.name));

    let mut codes = Vec::new();
    if !record.icao_code.is_empty() {
        codes.push(format!("ICAO {}", record.icao_code));
    }
    if !record.iata_code.is_empty() {
        codes.push(format!("IATA {}", record.iata_code));
    } else if !record.faa_lid.is_empty() {
        codes.push(format!("FAA {}", record.faa_lid));
    }
    if !codes.is_empty() {
        out.push_str(&format!("Codes: {}\n", codes.join(", ")));
    }

    let region: Vec<&str> = [record.iso_region.as_str(), record.iso_country.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !region.is_empty() {
        out.push_str(&format!("Region: {}\n", region.join(", ")));
    }
    out.push_str(&format!("Location: lat {:.4}, lon {:.4}\n", record.lat, record.lon));
    out
}

fn current_block(snapshot: &WeatherSnapshot, unit: UnitSystem, no_emoji: bool) -> String {
    let mut out = String::new();
    let condition = snapshot
        .condition
        .map(|c| c.describe(no_emoji))
        .unwrap_or_else(|| "N/A".to_string());
    out.push_str(&format!("Current:  {condition}\n"));
    out.push_str(&format!("  Temp:    {}\n", temp(snapshot.temperature_c, unit)));
    out.push_str(&format!("  Feels:   {}\n", temp(snapshot.apparent_c, unit)));
    out.push_str(&format!("  Humid:   {}\n", pct(snapshot.humidity_pct)));
    out.push_str(&format!("  DewPt:   {}\n", temp(snapshot.dew_point_c, unit)));
    out.push_str(&format!(
        "  Wind:    {} at {} (gusts {})\n",
        snapshot
            .wind_direction_deg
            .map(|d| format!("{d:.0}°"))
            .unwrap_or_else(|| "N/A".to_string()),
        wind(snapshot.wind_speed_kmh, unit),
        wind(snapshot.wind_gusts_kmh, unit),
    ));
    out.push_str(&format!("  Cloud:   {}\n", pct(snapshot.cloud_cover_pct)));
    out.push_str(&format!(
        "  Vis:     {}\n",
        snapshot
            .visibility_m
            .map(|m| units::visibility(m, unit).to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    out.push_str(&format!(
        "  UV:      {}\n",
        snapshot.uv_index.map(|v| format!("{v:.1}")).unwrap_or_else(|| "N/A".to_string()),
    ));
    out.push_str(&format!(
        "  Press:   {} (surface {})\n",
        press(snapshot.pressure_msl_hpa, unit),
        press(snapshot.surface_pressure_hpa, unit),
    ));
    out.push_str(&format!(
        "  Precip:  {} (rain {}, showers {}, snow {})\n",
        mm(snapshot.precipitation_mm, unit),
        mm(snapshot.rain_mm, unit),
        mm(snapshot.showers_mm, unit),
        snapshot.snowfall_cm.map(|v| format!("{v:.1} cm")).unwrap_or_else(|| "N/A".to_string()),
    ));
    out.push_str(&format!(
        "  Time:    {}\n",
        snapshot
            .observed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    if let (Some(rise), Some(set)) = (snapshot.sunrise, snapshot.sunset) {
        out.push_str(&format!("  Sunrise: {}  Sunset: {}\n", hhmm(rise), hhmm(set)));
    }
    out
}

/// The N-day forecast as an aligned table. Emoji get their own narrow
/// column so descriptions line up; `no_emoji` drops that column.
pub fn forecast_table(days: &[ForecastDay], unit: UnitSystem, no_emoji: bool) -> String {
    let mut columns = vec![ColumnSpec::left("Date")];
    if !no_emoji {
        columns.push(ColumnSpec::left("Wx"));
    }
    columns.extend([
        ColumnSpec::left("Weather"),
        ColumnSpec::numeric("High"),
        ColumnSpec::numeric("Low"),
        ColumnSpec::numeric("Precip"),
        ColumnSpec::numeric("Chance"),
        ColumnSpec::numeric("Sunrise"),
        ColumnSpec::numeric("Sunset"),
    ]);

    let rows: Vec<Vec<String>> = days
        .iter()
        .map(|day| {
            let mut row = vec![day.date.format("%Y-%m-%d").to_string()];
            if !no_emoji {
                row.push(day.condition.map(|c| c.emoji().to_string()).unwrap_or_default());
            }
            row.push(
                day.condition.map(|c| c.label().to_string()).unwrap_or_else(|| "N/A".to_string()),
            );
            row.push(temp(day.temp_max_c, unit));
            row.push(temp(day.temp_min_c, unit));
            row.push(mm(day.precipitation_mm, unit));
            row.push(
                day.precipitation_chance_pct
                    .map(|p| format!("{p:.0}%"))
                    .unwrap_or_else(|| "N/A".to_string()),
            );
            row.push(day.sunrise.map(hhmm).unwrap_or_default());
            row.push(day.sunset.map(hhmm).unwrap_or_default());
            row
        })
        .collect();

    let renderer = TableRenderer::new(columns).with_empty_note("No forecast data available.");
    format!("\n{}-Day Forecast:\n{}", days.len(), renderer.render(&rows))
}

/// Search hits as a table of code, name, city and region.
pub fn search_results(results: &[&AirportRecord]) -> String {
    let renderer = TableRenderer::new(vec![
        ColumnSpec::left("Code"),
        ColumnSpec::left("Name"),
        ColumnSpec::left("City"),
        ColumnSpec::left("Region"),
    ])
    .with_empty_note("No airports found matching query.");
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|record| {
            vec![
                record.primary_code().to_string(),
                record.name.clone(),
                record.city.clone(),
                [record.iso_region.as_str(), record.iso_country.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            ]
        })
        .collect();
    renderer.render(&rows)
}

/// One `--list-airports` line.
pub fn airport_line(record: &AirportRecord) -> String {
    let mut suffix = String::new();
    if !record.city.is_empty() {
        suffix.push_str(&format!(" ({})", record.city));
    }
    let region: Vec<&str> = [record.iso_region.as_str(), record.iso_country.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !region.is_empty() {
        suffix.push_str(&format!(" [{}]", region.join(", ")));
    }
    format!("  {}: {}{}", record.primary_code(), record.name, suffix)
}

/// The NWS zone product, passed through verbatim under the banner.
pub fn zone_report(record: &AirportRecord, periods: &[ZonePeriod]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&heading(record, "Zone forecast"));
    out.push_str(BANNER);
    out.push('\n');
    for period in periods {
        out.push_str(&format!("{}:\n  {}\n\n", period.name, period.detailed_forecast));
    }
    out.push_str(BANNER);
    out.push_str("\n\n");
    out
}

fn temp(value: Option<f64>, unit: UnitSystem) -> String {
    value.map(|c| units::temperature(c, unit).to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn wind(value: Option<f64>, unit: UnitSystem) -> String {
    match value {
        Some(kmh) => units::wind_speed(kmh, unit)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / "),
        None => "N/A".to_string(),
    }
}

fn press(value: Option<f64>, unit: UnitSystem) -> String {
    value.map(|h| units::pressure(h, unit).to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn mm(value: Option<f64>, unit: UnitSystem) -> String {
    value.map(|v| units::precipitation(v, unit).to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.0}%")).unwrap_or_else(|| "N/A".to_string())
}

fn hhmm(t: NaiveDateTime) -> String {
    t.format("%H:%M").to_string()
}
