use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Empirical constant of the Beaufort relation `v = 0.836 * B^1.5` (v in m/s).
const BEAUFORT_FACTOR: f64 = 0.836;
const BEAUFORT_MAX: f64 = 12.0;

const KMH_PER_MS: f64 = 3.6;
const MPH_PER_MS: f64 = 2.236936;
const KN_PER_MS: f64 = 1.943844;

#[derive(Debug, Error, PartialEq)]
#[error("unknown wind unit: {0:?} (expected m/s, km/h, bft, mph or kn)")]
pub struct UnknownWindUnit(pub String);

/// Unit wind speeds are published in. The portal always reports m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum WindUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
    Beaufort,
    MilesPerHour,
    Knots,
}

impl WindUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::KilometersPerHour => "km/h",
            WindUnit::Beaufort => "bft",
            WindUnit::MilesPerHour => "mph",
            WindUnit::Knots => "kn",
        }
    }
}

impl fmt::Display for WindUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WindUnit {
    type Err = UnknownWindUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m/s" | "ms" | "mps" => Ok(WindUnit::MetersPerSecond),
            "km/h" | "kmh" | "kph" => Ok(WindUnit::KilometersPerHour),
            "bft" | "beaufort" => Ok(WindUnit::Beaufort),
            "mph" => Ok(WindUnit::MilesPerHour),
            "kn" | "kt" | "knots" => Ok(WindUnit::Knots),
            other => Err(UnknownWindUnit(other.to_string())),
        }
    }
}

impl TryFrom<String> for WindUnit {
    type Error = UnknownWindUnit;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Converts a speed in m/s into `unit`.
pub fn convert(speed: f64, unit: WindUnit) -> f64 {
    match unit {
        WindUnit::MetersPerSecond => speed,
        WindUnit::KilometersPerHour => round_to(speed * KMH_PER_MS, 1),
        WindUnit::Beaufort => beaufort(speed) as f64,
        WindUnit::MilesPerHour => round_to(speed * MPH_PER_MS, 1),
        WindUnit::Knots => round_to(speed * KN_PER_MS, 1),
    }
}

/// Inverts `v = 0.836 * B^1.5` and rounds to the nearest force, 0..=12.
pub fn beaufort(speed: f64) -> u8 {
    if speed <= 0.0 {
        return 0;
    }
    (speed / BEAUFORT_FACTOR)
        .powf(2.0 / 3.0)
        .round()
        .min(BEAUFORT_MAX) as u8
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kmh() {
        for speed in [0.0, 1.0, 2.7, 5.0, 13.9, 33.3] {
            let expected = (speed * 3.6 * 10.0_f64).round() / 10.0;
            assert_eq!(convert(speed, WindUnit::KilometersPerHour), expected);
        }
        assert_eq!(convert(5.0, WindUnit::KilometersPerHour), 18.0);
    }

    #[test]
    fn test_beaufort_five_ms() {
        let expected = (5.0_f64 / 0.836).powf(2.0 / 3.0).round().min(12.0);
        assert_eq!(convert(5.0, WindUnit::Beaufort), expected);
        assert_eq!(convert(5.0, WindUnit::Beaufort), 3.0);
    }

    #[test]
    fn test_beaufort_round_trip() {
        for force in 0..=12u8 {
            let speed = 0.836 * (force as f64).powf(1.5);
            assert_eq!(beaufort(speed), force);
        }
    }

    #[test]
    fn test_beaufort_clamped() {
        assert_eq!(beaufort(80.0), 12);
        assert_eq!(beaufort(-3.0), 0);
    }

    #[test]
    fn test_pass_through() {
        assert_eq!(convert(4.37, WindUnit::MetersPerSecond), 4.37);
    }

    #[test]
    fn test_other_units() {
        assert_eq!(convert(10.0, WindUnit::MilesPerHour), 22.4);
        assert_eq!(convert(10.0, WindUnit::Knots), 19.4);
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("km/h".parse::<WindUnit>().unwrap(), WindUnit::KilometersPerHour);
        assert_eq!(" BFT ".parse::<WindUnit>().unwrap(), WindUnit::Beaufort);
        assert_eq!("m/s".parse::<WindUnit>().unwrap(), WindUnit::MetersPerSecond);
        assert_eq!("kn".parse::<WindUnit>().unwrap(), WindUnit::Knots);
        assert!("furlongs".parse::<WindUnit>().is_err());
    }
}
