//! Severity levels
//!
//! Levels are plain integers with named constants, so an application can log
//! at an intermediate raw value (`Level::new(1)`) and still get a sensible
//! name (`INFO+1`) and a well-defined position in the ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    pub const TRACE: Level = Level(-12);
    pub const VERBOSE: Level = Level(-8);
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const SUCCESS: Level = Level(1);
    pub const NOTICE: Level = Level(2);
    pub const DEPRECATED: Level = Level(3);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);
    pub const BUG: Level = Level(10);
    pub const FATAL: Level = Level(12);
    /// Emitted regardless of any non-quiet minimum.
    pub const ALWAYS: Level = Level(i32::MAX - 1);
    /// Never emitted; as a minimum it silences everything.
    pub const QUIET: Level = Level(i32::MAX);

    /// Named levels in ascending order, sentinels excluded.
    pub const DEFINED: [Level; 11] = [
        Level::TRACE,
        Level::VERBOSE,
        Level::DEBUG,
        Level::INFO,
        Level::SUCCESS,
        Level::NOTICE,
        Level::DEPRECATED,
        Level::WARN,
        Level::ERROR,
        Level::BUG,
        Level::FATAL,
    ];

    /// Wrap a raw value without snapping it to a named level.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Level(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Map a raw value to the nearest named level.
    ///
    /// Ties go to the more severe neighbour. The two sentinels map to
    /// themselves; everything else lands within `TRACE..=FATAL`.
    pub fn from_raw(raw: i32) -> Self {
        if raw == Level::ALWAYS.0 || raw == Level::QUIET.0 {
            return Level(raw);
        }

        let mut nearest = Level::TRACE;
        let mut best = u64::MAX;
        for level in Level::DEFINED {
            let distance = (i64::from(raw) - i64::from(level.0)).unsigned_abs();
            if distance <= best {
                best = distance;
                nearest = level;
            }
        }
        nearest
    }

    /// Whether a record at `self` passes a gate set to `minimum`.
    #[inline]
    pub fn passes(self, minimum: Level) -> bool {
        if self == Level::QUIET || minimum == Level::QUIET {
            return false;
        }
        self == Level::ALWAYS || self >= minimum
    }

    pub fn is_sentinel(self) -> bool {
        self == Level::ALWAYS || self == Level::QUIET
    }

    /// Name of a defined level, `None` for intermediate raw values.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Level::TRACE => "TRACE",
            Level::VERBOSE => "VERBOSE",
            Level::DEBUG => "DEBUG",
            Level::INFO => "INFO",
            Level::SUCCESS => "SUCCESS",
            Level::NOTICE => "NOTICE",
            Level::DEPRECATED => "DEPRECATED",
            Level::WARN => "WARN",
            Level::ERROR => "ERROR",
            Level::BUG => "BUG",
            Level::FATAL => "FATAL",
            Level::ALWAYS => "ALWAYS",
            Level::QUIET => "QUIET",
            _ => return None,
        };
        Some(name)
    }

    fn from_name(name: &str) -> Option<Self> {
        let level = match name.to_ascii_uppercase().as_str() {
            "TRACE" => Level::TRACE,
            "VERBOSE" => Level::VERBOSE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "SUCCESS" => Level::SUCCESS,
            "NOTICE" => Level::NOTICE,
            "DEPRECATED" => Level::DEPRECATED,
            "WARN" | "WARNING" => Level::WARN,
            "ERROR" => Level::ERROR,
            "BUG" => Level::BUG,
            "FATAL" => Level::FATAL,
            "ALWAYS" => Level::ALWAYS,
            "QUIET" => Level::QUIET,
            _ => return None,
        };
        Some(level)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl From<i32> for Level {
    fn from(raw: i32) -> Self {
        Level(raw)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.pad(name);
        }

        // Intermediate values render relative to the closest named level below.
        let base = Level::DEFINED
            .iter()
            .rev()
            .find(|level| level.0 <= self.0)
            .copied()
            .unwrap_or(Level::TRACE);
        let offset = i64::from(self.0) - i64::from(base.0);
        let label = format!("{}{:+}", base.name().unwrap_or("LEVEL"), offset);
        f.pad(&label)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(level) = Level::from_name(s) {
            return Ok(level);
        }
        if let Ok(raw) = s.parse::<i32>() {
            return Ok(Level(raw));
        }

        if let Some(idx) = s.find(['+', '-']) {
            let (name, offset) = s.split_at(idx);
            if let (Some(base), Ok(offset)) = (Level::from_name(name), offset.parse::<i32>()) {
                if let Some(raw) = base.0.checked_add(offset) {
                    return Ok(Level(raw));
                }
            }
        }

        Err(format!("Invalid log level: '{}'", s))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
