//! The local airport directory: load, exact-code resolution, ranked
//! search, validated additions and wholesale rebuilds from the
//! OurAirports open data dump.

use std::{collections::HashMap, io, path::{Path, PathBuf}, time::Duration};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    cache::SearchCache,
    error::{Error, Result},
    store,
};

/// Where `--update-airports` pulls the directory from.
pub const OURAIRPORTS_URL: &str = "https://davidmegginson.github.io/ourairports-data/airports.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AirportType {
    LargeAirport,
    MediumAirport,
    SmallAirport,
    Heliport,
    SeaplaneBase,
    Balloonport,
    Closed,
    CustomAirport,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AirportType {
    fn from_source(value: &str) -> Self {
        match value {
            "large_airport" => AirportType::LargeAirport,
            "medium_airport" => AirportType::MediumAirport,
            "small_airport" => AirportType::SmallAirport,
            "heliport" => AirportType::Heliport,
            "seaplane_base" => AirportType::SeaplaneBase,
            "balloonport" => AirportType::Balloonport,
            "closed" => AirportType::Closed,
            "custom_airport" => AirportType::CustomAirport,
            _ => AirportType::Unknown,
        }
    }
}

/// One airport. Immutable once loaded; the index only replaces records
/// wholesale (`rebuild_from_source`) or appends (`add`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportRecord {
    #[serde(default)]
    pub icao_code: String,
    #[serde(default)]
    pub iata_code: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub iso_country: String,
    #[serde(default)]
    pub iso_region: String,
    #[serde(default)]
    pub elevation_ft: Option<i32>,
    #[serde(rename = "type", default)]
    pub kind: AirportType,
    #[serde(default)]
    pub scheduled_service: bool,
    #[serde(default)]
    pub local_code: String,
    #[serde(default)]
    pub gps_code: String,
    #[serde(default)]
    pub faa_lid: String,
}

impl AirportRecord {
    /// The code the record is listed and cached under: ICAO first, then
    /// IATA, then the auxiliary codes.
    pub fn primary_code(&self) -> &str {
        [&self.icao_code, &self.iata_code, &self.local_code, &self.gps_code, &self.faa_lid]
            .into_iter()
            .find(|code| !code.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// At least one of ICAO/IATA/local must be set and coordinates must
    /// be on the globe.
    pub fn validate(&self) -> Result<()> {
        if self.icao_code.is_empty() && self.iata_code.is_empty() && self.local_code.is_empty() {
            return Err(Error::InvalidRecord(
                "at least one of icao_code, iata_code or local_code is required".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidRecord(format!("latitude {} out of range", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidRecord(format!("longitude {} out of range", self.lon)));
        }
        Ok(())
    }
}

/// The in-memory directory with per-code lookup maps.
#[derive(Debug)]
pub struct AirportIndex {
    records: Vec<AirportRecord>,
    by_icao: HashMap<String, usize>,
    by_iata: HashMap<String, usize>,
    // local_code, gps_code and faa_lid share one map; first writer wins.
    by_aux: HashMap<String, usize>,
    path: PathBuf,
}

impl AirportIndex {
    /// Load the directory file. A missing file yields an empty index so
    /// `--update-airports` can bootstrap it.
    pub fn load(path: &Path) -> Result<Self> {
        let records: Vec<AirportRecord> = store::read_json(path)?.unwrap_or_default();
        if records.is_empty() {
            tracing::warn!("no airport directory at {}; run --update-airports", path.display());
        } else {
            tracing::debug!("loaded {} airports from {}", records.len(), path.display());
        }
        Ok(Self::from_records(records, path.to_path_buf()))
    }

    pub fn from_records(records: Vec<AirportRecord>, path: PathBuf) -> Self {
        let mut index = AirportIndex {
            records,
            by_icao: HashMap::new(),
            by_iata: HashMap::new(),
            by_aux: HashMap::new(),
            path,
        };
        index.rebuild_maps();
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirportRecord> {
        self.records.iter()
    }

    /// All records ordered by primary code, for `--list-airports`.
    pub fn list(&self) -> Vec<&AirportRecord> {
        let mut records: Vec<&AirportRecord> = self.records.iter().collect();
        records.sort_by(|a, b| a.primary_code().cmp(b.primary_code()));
        records
    }

    /// Exact case-insensitive code lookup: ICAO first, then IATA, then
    /// local/GPS/FAA codes. First match wins.
    pub fn resolve(&self, code: &str) -> Result<&AirportRecord> {
        let key = code.trim().to_uppercase();
        if key.is_empty() {
            return Err(Error::NotFound(code.to_string()));
        }
        self.by_icao
            .get(&key)
            .or_else(|| self.by_iata.get(&key))
            .or_else(|| self.by_aux.get(&key))
            .map(|&i| &self.records[i])
            .ok_or_else(|| Error::NotFound(code.to_string()))
    }

    /// Case-insensitive substring search over code fields, name and
    /// city. Ranked: exact code match, then name/city prefix, then
    /// substring, alphabetical by name within a rank. Empty query and
    /// no-match both return an empty vec, never an error.
    pub fn search(&self, query: &str) -> Vec<&AirportRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<(u8, &AirportRecord)> = self
            .records
            .iter()
            .filter_map(|record| rank_match(record, &q).map(|rank| (rank, record)))
            .collect();
        hits.sort_by(|a, b| {
            a.0.cmp(&b.0).then_with(|| a.1.name.to_lowercase().cmp(&b.1.name.to_lowercase()))
        });
        hits.into_iter().map(|(_, record)| record).collect()
    }

    /// Validate and append one record, then persist. Fails with
    /// `InvalidRecord` when the invariant is violated or the ICAO/IATA
    /// code is already taken.
    pub fn add(&mut self, record: AirportRecord) -> Result<()> {
        record.validate()?;
        if !record.icao_code.is_empty() && self.by_icao.contains_key(&record.icao_code.to_uppercase())
        {
            return Err(Error::InvalidRecord(format!(
                "ICAO code {} already exists",
                record.icao_code
            )));
        }
        if !record.iata_code.is_empty() && self.by_iata.contains_key(&record.iata_code.to_uppercase())
        {
            return Err(Error::InvalidRecord(format!(
                "IATA code {} already exists",
                record.iata_code
            )));
        }
        self.records.push(record);
        self.rebuild_maps();
        self.save()
    }

    /// Replace the whole directory from an OurAirports CSV dump. The new
    /// record set is parsed completely before anything is swapped, so a
    /// malformed dump leaves the current index untouched.
    pub fn rebuild_from_source<R: io::Read>(&mut self, source: R) -> Result<usize> {
        let records = parse_source(source)?;
        let count = records.len();
        self.records = records;
        self.rebuild_maps();
        self.save()?;
        tracing::debug!("rebuilt airport directory with {count} records");
        Ok(count)
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| Error::Config(format!("failed to serialize airport directory: {e}")))?;
        store::write_atomic(&self.path, &json)
    }

    fn rebuild_maps(&mut self) {
        self.by_icao.clear();
        self.by_iata.clear();
        self.by_aux.clear();
        for (i, record) in self.records.iter().enumerate() {
            if !record.icao_code.is_empty() {
                self.by_icao.entry(record.icao_code.to_uppercase()).or_insert(i);
            }
            if !record.iata_code.is_empty() {
                self.by_iata.entry(record.iata_code.to_uppercase()).or_insert(i);
            }
            for code in [&record.local_code, &record.gps_code, &record.faa_lid] {
                if !code.is_empty() {
                    self.by_aux.entry(code.to_uppercase()).or_insert(i);
                }
            }
        }
    }
}

fn rank_match(record: &AirportRecord, query_lower: &str) -> Option<u8> {
    let codes = [
        &record.icao_code,
        &record.iata_code,
        &record.local_code,
        &record.gps_code,
        &record.faa_lid,
    ];
    if codes.iter().any(|code| !code.is_empty() && code.to_lowercase() == query_lower) {
        return Some(0);
    }
    let name = record.name.to_lowercase();
    let city = record.city.to_lowercase();
    if name.starts_with(query_lower) || (!city.is_empty() && city.starts_with(query_lower)) {
        return Some(1);
    }
    if name.contains(query_lower)
        || city.contains(query_lower)
        || codes.iter().any(|code| code.to_lowercase().contains(query_lower))
    {
        return Some(2);
    }
    None
}

/// Resolve a user-supplied identifier (code, name or city fragment)
/// through the index, recording the lookup in the search cache. Exact
/// code wins; otherwise a previously cached query is reused before
/// falling back to a fresh ranked search.
pub fn resolve_ident<'a>(
    index: &'a AirportIndex,
    cache: &mut SearchCache,
    ident: &str,
    now: DateTime<Local>,
) -> Result<&'a AirportRecord> {
    if let Ok(record) = index.resolve(ident) {
        cache.put(ident, vec![record.primary_code().to_string()], now);
        return Ok(record);
    }
    let cached: Option<Vec<String>> = cache.get(ident).map(|entry| entry.codes.clone());
    if let Some(codes) = cached {
        if let Some(record) = codes.iter().find_map(|code| index.resolve(code).ok()) {
            tracing::debug!("'{ident}' served from search cache");
            cache.put(ident, codes, now);
            return Ok(record);
        }
    }
    let matches = index.search(ident);
    let Some(&best) = matches.first() else {
        return Err(Error::NotFound(ident.to_string()));
    };
    let codes: Vec<String> = matches.iter().map(|r| r.primary_code().to_string()).collect();
    cache.put(ident, codes, now);
    Ok(best)
}

/// Download the OurAirports CSV dump for `rebuild_from_source`.
pub async fn fetch_ourairports_csv(timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Network(e.to_string()))?;
    let res = client
        .get(OURAIRPORTS_URL)
        .send()
        .await
        .map_err(|e| crate::provider::transport_error(&e, timeout))?;
    let status = res.status();
    let body =
        res.text().await.map_err(|e| crate::provider::transport_error(&e, timeout))?;
    if !status.is_success() {
        return Err(Error::BadResponse(format!(
            "airport source request failed with status {status}"
        )));
    }
    Ok(body)
}

/// One raw row of the OurAirports dump. Numeric fields are kept as text
/// and parsed leniently the way the dump actually needs.
#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(default)]
    icao_code: String,
    #[serde(default)]
    iata_code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    municipality: String,
    #[serde(default)]
    latitude_deg: String,
    #[serde(default)]
    longitude_deg: String,
    #[serde(default)]
    elevation_ft: String,
    #[serde(default)]
    iso_country: String,
    #[serde(default)]
    iso_region: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    scheduled_service: String,
    #[serde(default)]
    local_code: String,
    #[serde(default)]
    gps_code: String,
}

fn parse_source<R: io::Read>(source: R) -> Result<Vec<AirportRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<SourceRow>() {
        let row = row.map_err(|e| Error::BadResponse(format!("malformed airport source: {e}")))?;
        let (Ok(lat), Ok(lon)) =
            (row.latitude_deg.trim().parse::<f64>(), row.longitude_deg.trim().parse::<f64>())
        else {
            skipped += 1;
            continue;
        };
        if row.name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let local_code = row.local_code.trim().to_uppercase();
        records.push(AirportRecord {
            icao_code: row.icao_code.trim().to_uppercase(),
            iata_code: row.iata_code.trim().to_uppercase(),
            name: row.name.trim().to_string(),
            city: row.municipality.trim().to_string(),
            lat,
            lon,
            iso_country: row.iso_country.trim().to_string(),
            iso_region: row.iso_region.trim().to_string(),
            elevation_ft: row.elevation_ft.trim().parse::<f64>().ok().map(|v| v as i32),
            kind: AirportType::from_source(row.kind.trim()),
            scheduled_service: row.scheduled_service.trim().eq_ignore_ascii_case("yes"),
            faa_lid: local_code.clone(),
            local_code,
            gps_code: row.gps_code.trim().to_uppercase(),
        });
    }
    if skipped > 0 {
        tracing::debug!("skipped {skipped} source rows without name or coordinates");
    }
    if records.is_empty() {
        return Err(Error::BadResponse("airport source contained no usable rows".to_string()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(icao: &str, iata: &str, name: &str, city: &str) -> AirportRecord {
        AirportRecord {
            icao_code: icao.to_string(),
            iata_code: iata.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            lat: 40.6398,
            lon: -73.7789,
            iso_country: "US".to_string(),
            iso_region: "US-NY".to_string(),
            elevation_ft: Some(13),
            kind: AirportType::LargeAirport,
            scheduled_service: true,
            local_code: String::new(),
            gps_code: String::new(),
            faa_lid: String::new(),
        }
    }

    fn index_with(records: Vec<AirportRecord>) -> (AirportIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("airports.json");
        (AirportIndex::from_records(records, path), dir)
    }

    #[test]
    fn resolve_is_case_insensitive_and_checks_both_codes() {
        let (index, _dir) = index_with(vec![record("KJFK", "JFK", "John F Kennedy Intl", "New York")]);
        assert_eq!(index.resolve("kjfk").unwrap().iata_code, "JFK");
        assert_eq!(index.resolve("jfk").unwrap().icao_code, "KJFK");
        assert!(matches!(index.resolve("LAX"), Err(Error::NotFound(_))));
    }

    #[test]
    fn resolve_prefers_icao_over_iata_over_aux() {
        let mut aux = record("", "", "Aux Field", "Nowhere");
        aux.local_code = "ABC".to_string();
        let icao_hit = record("ABC", "", "Icao Field", "Somewhere");
        let iata_hit = record("KXYZ", "ABC", "Iata Field", "Elsewhere");
        let (index, _dir) = index_with(vec![aux, iata_hit, icao_hit]);
        // All three carry "ABC" somewhere; ICAO wins, then IATA.
        assert_eq!(index.resolve("abc").unwrap().name, "Icao Field");
    }

    #[test]
    fn search_ranks_exact_code_then_prefix_then_substring() {
        let (index, _dir) = index_with(vec![
            record("KLAX", "LAX", "Los Angeles Intl", "Los Angeles"),
            record("KVNY", "VNY", "Van Nuys", "Los Angeles"),
            record("EGLL", "LHR", "Heathrow", "London"),
            record("KBOS", "BOS", "Logan Intl", "Boston"),
        ]);
        let results = index.search("LAX");
        assert_eq!(results[0].iata_code, "LAX");

        let results = index.search("lo");
        // Prefix hits (Los Angeles Intl, Logan, London) come before
        // nothing else; alphabetical by name within the rank.
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Heathrow", "Logan Intl", "Los Angeles Intl", "Van Nuys"]);
    }

    #[test]
    fn search_empty_query_and_no_match_return_empty() {
        let (index, _dir) = index_with(vec![record("KJFK", "JFK", "John F Kennedy Intl", "New York")]);
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
        assert!(index.search("zzzzzz").is_empty());
    }

    #[test]
    fn add_rejects_missing_codes_bad_coordinates_and_collisions() {
        let (mut index, _dir) = index_with(vec![record("KJFK", "JFK", "John F Kennedy Intl", "New York")]);

        let mut no_codes = record("", "", "Ghost Field", "Nowhere");
        no_codes.local_code = String::new();
        assert!(matches!(index.add(no_codes), Err(Error::InvalidRecord(_))));

        let mut bad_lat = record("KAAA", "", "Bad Lat", "Nowhere");
        bad_lat.lat = 91.0;
        assert!(matches!(index.add(bad_lat), Err(Error::InvalidRecord(_))));

        let dup = record("KJFK", "", "Duplicate", "New York");
        assert!(matches!(index.add(dup), Err(Error::InvalidRecord(_))));

        assert_eq!(index.len(), 1);
        index.add(record("KLGA", "LGA", "LaGuardia", "New York")).unwrap();
        assert_eq!(index.resolve("LGA").unwrap().name, "LaGuardia");
    }

    #[test]
    fn add_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("airports.json");
        let mut index = AirportIndex::from_records(Vec::new(), path.clone());
        index.add(record("KSEA", "SEA", "Seattle-Tacoma Intl", "Seattle")).unwrap();

        let reloaded = AirportIndex::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.resolve("SEA").unwrap().name, "Seattle-Tacoma Intl");
    }

    const SOURCE_CSV: &str = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,continent,iso_country,iso_region,municipality,scheduled_service,icao_code,iata_code,gps_code,local_code
3622,KJFK,large_airport,John F Kennedy International Airport,40.639801,-73.7789,13,NA,US,US-NY,New York,yes,KJFK,JFK,KJFK,JFK
3578,KBOS,large_airport,Logan International Airport,42.3643,-71.005203,20,NA,US,US-MA,Boston,yes,KBOS,BOS,KBOS,BOS
9999,XXXX,small_airport,No Coordinates Field,,,abc,NA,US,US-AK,,no,,,,
";

    #[test]
    fn rebuild_replaces_index_and_skips_unusable_rows() {
        let (mut index, _dir) = index_with(vec![record("KOLD", "OLD", "Old Field", "Oldtown")]);
        let count = index.rebuild_from_source(SOURCE_CSV.as_bytes()).unwrap();
        assert_eq!(count, 2);
        assert!(index.resolve("OLD").is_err());
        let jfk = index.resolve("JFK").unwrap();
        assert_eq!(jfk.kind, AirportType::LargeAirport);
        assert!(jfk.scheduled_service);
        assert_eq!(jfk.elevation_ft, Some(13));
        assert_eq!(jfk.faa_lid, "JFK");
    }

    #[test]
    fn failed_rebuild_keeps_existing_index() {
        let (mut index, _dir) = index_with(vec![record("KOLD", "OLD", "Old Field", "Oldtown")]);
        // Header only: parses but yields nothing usable.
        let err = index.rebuild_from_source("id,ident,type,name\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::BadResponse(_)));
        assert_eq!(index.resolve("OLD").unwrap().name, "Old Field");
    }

    #[test]
    fn resolve_ident_records_every_lookup_path() {
        use chrono::TimeZone;
        let (index, _dir) = index_with(vec![
            record("KJFK", "JFK", "John F Kennedy Intl", "New York"),
            record("KLGA", "LGA", "LaGuardia", "New York"),
        ]);
        let cache_dir = TempDir::new().unwrap();
        let now = Local.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
        let mut cache = SearchCache::new(cache_dir.path().join("cache.json"), now.date_naive());

        // Exact code path still records an entry.
        let rec = resolve_ident(&index, &mut cache, "JFK", now).unwrap();
        assert_eq!(rec.icao_code, "KJFK");
        assert!(cache.get("jfk").is_some());

        // Fuzzy path caches the ranked codes and resolves the best hit.
        let rec = resolve_ident(&index, &mut cache, "LaGuardia", now).unwrap();
        assert_eq!(rec.iata_code, "LGA");
        assert_eq!(cache.get("laguardia").unwrap().codes[0], "KLGA");

        assert!(matches!(
            resolve_ident(&index, &mut cache, "atlantis", now),
            Err(Error::NotFound(_))
        ));
    }
}
