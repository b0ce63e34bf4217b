//! Human-readable byte sizes for config values and chat messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid size format: {0}")]
    InvalidFormat(String),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Byte count that parses from "5MB", "1.5 GiB" or a plain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeRepr")]
pub struct ByteSize(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

impl TryFrom<SizeRepr> for ByteSize {
    type Error = ParseError;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Bytes(n) => Ok(ByteSize(n)),
            SizeRepr::Text(s) => s.parse(),
        }
    }
}

impl ByteSize {
    pub const fn kib(n: u64) -> Self {
        ByteSize(n * 1024)
    }

    pub const fn mib(n: u64) -> Self {
        ByteSize(n * 1024 * 1024)
    }

    pub const fn gib(n: u64) -> Self {
        ByteSize(n * 1024 * 1024 * 1024)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| ParseError::InvalidFormat(s.to_string()))?;

        let exponent = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 0,
            "K" | "KB" | "KIB" => 1,
            "M" | "MB" | "MIB" => 2,
            "G" | "GB" | "GIB" => 3,
            "T" | "TB" | "TIB" => 4,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        if exponent == 0 && number.contains('.') {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        Ok(ByteSize((value * STEP.powi(exponent)).round() as u64))
    }
}

impl fmt::Display for ByteSize {
    /// Largest unit that keeps the value at or above one, at most two decimals
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= STEP && unit < UNITS.len() - 1 {
            value /= STEP;
            unit += 1;
        }

        let rendered = format!("{:.2}", value);
        let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}{}", rendered, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("1024".parse::<ByteSize>().unwrap(), ByteSize(1024));
        assert_eq!("1K".parse::<ByteSize>().unwrap(), ByteSize::kib(1));
        assert_eq!("5 MB".parse::<ByteSize>().unwrap(), ByteSize::mib(5));
        assert_eq!("5mib".parse::<ByteSize>().unwrap(), ByteSize::mib(5));
        assert_eq!("2GB".parse::<ByteSize>().unwrap(), ByteSize::gib(2));
        assert_eq!("1.5GB".parse::<ByteSize>().unwrap(), ByteSize(1_610_612_736));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("MB".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("5XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!("1.5".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize(0).to_string(), "0B");
        assert_eq!(ByteSize(512).to_string(), "512B");
        assert_eq!(ByteSize::mib(50).to_string(), "50MB");
        assert_eq!(ByteSize(1_610_612_736).to_string(), "1.5GB");
        assert_eq!(ByteSize(12_940_000).to_string(), "12.34MB");
    }

    #[test]
    fn test_deserialize_string_or_number() {
        #[derive(Deserialize)]
        struct Limits {
            text: ByteSize,
            raw: ByteSize,
        }

        let parsed: Limits = serde_json::from_str(r#"{"text": "10MB", "raw": 1024}"#).unwrap();
        assert_eq!(parsed.text, ByteSize::mib(10));
        assert_eq!(parsed.raw, ByteSize(1024));
    }

    #[test]
    fn test_deserialize_rejects_bad_unit() {
        let result: Result<ByteSize, _> = serde_json::from_str(r#""10 parsecs""#);
        assert!(result.is_err());
    }
}
