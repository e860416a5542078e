//! Timestamp formatting for adapter output
//!
//! Configuration carries the timestamp format as a string: either one of the
//! preset names below or any strftime pattern understood by `chrono`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Write as _};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Rfc3339Millis,

    /// `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// `2025-01-08 10:30:45`
    DateTime,

    /// `10:30AM`
    Kitchen,

    /// `1736332245123`
    UnixMillis,

    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Rfc3339Millis => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::DateTime => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            TimestampFormat::Kitchen => datetime.format("%-I:%M%p").to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => {
                // chrono reports an invalid pattern as a fmt error
                let mut out = String::new();
                if write!(out, "{}", datetime.format(pattern)).is_err() {
                    return datetime.to_rfc3339();
                }
                out
            }
        }
    }

    /// Numeric formats are emitted unquoted by structured encoders
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }

    fn preset_name(&self) -> Option<&'static str> {
        match self {
            TimestampFormat::Rfc3339Millis => Some("rfc3339ms"),
            TimestampFormat::Rfc3339 => Some("rfc3339"),
            TimestampFormat::DateTime => Some("datetime"),
            TimestampFormat::Kitchen => Some("kitchen"),
            TimestampFormat::UnixMillis => Some("unixms"),
            TimestampFormat::Custom(_) => None,
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.preset_name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, TimestampFormat::Custom(pattern)) => f.write_str(pattern),
            (None, _) => Ok(()),
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_lowercase().as_str() {
            "" | "rfc3339ms" => TimestampFormat::Rfc3339Millis,
            "rfc3339" => TimestampFormat::Rfc3339,
            "datetime" => TimestampFormat::DateTime,
            "kitchen" => TimestampFormat::Kitchen,
            "unixms" => TimestampFormat::UnixMillis,
            _ => TimestampFormat::Custom(s.to_string()),
        };
        Ok(format)
    }
}

impl Serialize for TimestampFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimestampFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_presets() {
        let dt = fixed_datetime();
        assert_eq!(TimestampFormat::Rfc3339Millis.format(&dt), "2025-01-08T10:30:45.123Z");
        assert_eq!(TimestampFormat::DateTime.format(&dt), "2025-01-08 10:30:45");
        assert_eq!(TimestampFormat::Kitchen.format(&dt), "10:30AM");
        assert_eq!(TimestampFormat::UnixMillis.format(&dt), "1736332245123");
        assert!(TimestampFormat::Rfc3339.format(&dt).starts_with("2025-01-08T10:30:45"));
    }

    #[test]
    fn test_custom_pattern() {
        let format: TimestampFormat = "%d/%b/%Y".parse().unwrap();
        assert_eq!(format, TimestampFormat::Custom("%d/%b/%Y".to_string()));
        assert_eq!(format.format(&fixed_datetime()), "08/Jan/2025");
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        let dt = fixed_datetime();
        let format = TimestampFormat::Custom("%Q".to_string());
        assert_eq!(format.format(&dt), dt.to_rfc3339());
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let json = serde_json::to_string(&TimestampFormat::Kitchen).unwrap();
        assert_eq!(json, "\"kitchen\"");

        let format: TimestampFormat = serde_json::from_str("\"%H:%M\"").unwrap();
        assert_eq!(format, TimestampFormat::Custom("%H:%M".to_string()));
    }

    #[test]
    fn test_is_numeric() {
        assert!(TimestampFormat::UnixMillis.is_numeric());
        assert!(!TimestampFormat::Kitchen.is_numeric());
    }
}
