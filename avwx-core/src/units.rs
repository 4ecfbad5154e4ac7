//! Pure conversions from canonical metric values to the display system.
//!
//! The mapping table is fixed: metric shows °C, km/h, km, hPa and mm;
//! imperial shows °F, knots alongside mph, miles, inHg and mm. A rendered
//! row never mixes systems.

use std::fmt;

use crate::error::{Error, Result};

const KMH_PER_KNOT: f64 = 1.852;
const KMH_PER_MPH: f64 = 1.609;
const INHG_PER_HPA: f64 = 0.029_53;

/// The display unit system, selected by config `unit` or `--unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    /// °C, km/h, km, hPa.
    Metric,
    /// °F, kn + mph, mi, inHg.
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "C",
            UnitSystem::Imperial => "F",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value.trim() {
            "C" | "c" => Ok(UnitSystem::Metric),
            "F" | "f" => Ok(UnitSystem::Imperial),
            other => Err(Error::Config(format!("unit must be 'C' or 'F', got '{other}'"))),
        }
    }
}

/// A converted value together with its unit suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub unit: &'static str,
}

impl Measure {
    pub fn new(value: f64, unit: &'static str) -> Self {
        Measure { value, unit }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Degree and percent suffixes read better without a space.
        if self.unit.starts_with('°') || self.unit == "%" {
            write!(f, "{:.1}{}", self.value, self.unit)
        } else {
            write!(f, "{:.1} {}", self.value, self.unit)
        }
    }
}

pub fn fahrenheit_from_celsius(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn celsius_from_fahrenheit(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn knots_from_kmh(kmh: f64) -> f64 {
    kmh / KMH_PER_KNOT
}

pub fn mph_from_kmh(kmh: f64) -> f64 {
    kmh / KMH_PER_MPH
}

pub fn kmh_from_mph(mph: f64) -> f64 {
    mph * KMH_PER_MPH
}

pub fn miles_from_km(km: f64) -> f64 {
    km / KMH_PER_MPH
}

pub fn inhg_from_hpa(hpa: f64) -> f64 {
    hpa * INHG_PER_HPA
}

pub fn temperature(celsius: f64, system: UnitSystem) -> Measure {
    match system {
        UnitSystem::Metric => Measure::new(celsius, "°C"),
        UnitSystem::Imperial => Measure::new(fahrenheit_from_celsius(celsius), "°F"),
    }
}

/// Wind speed for display. Metric is km/h only; imperial shows knots and
/// mph side by side, so this returns one or two measures.
pub fn wind_speed(kmh: f64, system: UnitSystem) -> Vec<Measure> {
    match system {
        UnitSystem::Metric => vec![Measure::new(kmh, "km/h")],
        UnitSystem::Imperial => {
            vec![Measure::new(knots_from_kmh(kmh), "kn"), Measure::new(mph_from_kmh(kmh), "mph")]
        }
    }
}

pub fn visibility(meters: f64, system: UnitSystem) -> Measure {
    let km = meters / 1000.0;
    match system {
        UnitSystem::Metric => Measure::new(km, "km"),
        UnitSystem::Imperial => Measure::new(miles_from_km(km), "mi"),
    }
}

pub fn pressure(hpa: f64, system: UnitSystem) -> Measure {
    match system {
        UnitSystem::Metric => Measure::new(hpa, "hPa"),
        UnitSystem::Imperial => Measure::new(inhg_from_hpa(hpa), "inHg"),
    }
}

/// Precipitation stays millimetric in both systems.
pub fn precipitation(mm: f64, _system: UnitSystem) -> Measure {
    Measure::new(mm, "mm")
}
