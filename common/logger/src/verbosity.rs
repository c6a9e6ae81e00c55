use crate::LoggerError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};

/// Name of the field that marks an ERROR event as critical.
pub const CRIT_FIELD: &str = "crit";

/// Emits a critical event: an ERROR event carrying the [`CRIT_FIELD`] field.
///
/// A sink configured with [`Verbosity::Crit`] forwards only these events.
#[macro_export]
macro_rules! crit {
    ($($arg:tt)+) => {
        $crate::tracing::error!(crit = true, $($arg)+)
    };
}

/// The minimum severity a sink forwards.
///
/// Variants are declared from the lowest to the highest severity, so `Ord` compares severities.
/// The integer ordinals read from the configuration go the other way round:
/// 0 is `Crit` and 5 is `Trace`, a bigger number meaning a more verbose output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Crit,
}

impl Verbosity {
    pub const ALL: [Verbosity; 6] = [
        Verbosity::Crit,
        Verbosity::Error,
        Verbosity::Warn,
        Verbosity::Info,
        Verbosity::Debug,
        Verbosity::Trace,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            Verbosity::Crit => 0,
            Verbosity::Error => 1,
            Verbosity::Warn => 2,
            Verbosity::Info => 3,
            Verbosity::Debug => 4,
            Verbosity::Trace => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Verbosity::Crit => "crit",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    /// The most verbose tracing level this threshold can let through.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Crit | Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }

    /// Returns whether an event with the given metadata is at or above this threshold.
    pub fn enables(self, metadata: &Metadata<'_>) -> bool {
        match self {
            Verbosity::Crit => {
                *metadata.level() == Level::ERROR && metadata.fields().field(CRIT_FIELD).is_some()
            }
            other => *metadata.level() <= other.level_filter(),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Info
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = LoggerError;

    fn try_from(ordinal: u8) -> Result<Self, LoggerError> {
        Verbosity::ALL.get(ordinal as usize).copied().ok_or_else(|| {
            LoggerError::LoggerConfigurationError {
                message: format!(
                    "Unknown verbosity [{}]. Valid values are 0 (crit) to 5 (trace)",
                    ordinal
                ),
            }
        })
    }
}

impl From<Verbosity> for u8 {
    fn from(verbosity: Verbosity) -> Self {
        verbosity.ordinal()
    }
}

impl FromStr for Verbosity {
    type Err = LoggerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Ok(ordinal) = value.parse::<u8>() {
            return Verbosity::try_from(ordinal);
        }
        match value.to_ascii_lowercase().as_str() {
            "crit" | "critical" => Ok(Verbosity::Crit),
            "error" | "eror" => Ok(Verbosity::Error),
            "warn" | "warning" => Ok(Verbosity::Warn),
            "info" => Ok(Verbosity::Info),
            "debug" | "dbug" => Ok(Verbosity::Debug),
            "trace" | "trce" => Ok(Verbosity::Trace),
            _ => Err(LoggerError::LoggerConfigurationError {
                message: format!("Cannot parse the verbosity: [{}]", value),
            }),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn should_map_ordinals_from_crit_to_trace() {
        assert_eq!(Verbosity::Crit, Verbosity::try_from(0).unwrap());
        assert_eq!(Verbosity::Error, Verbosity::try_from(1).unwrap());
        assert_eq!(Verbosity::Warn, Verbosity::try_from(2).unwrap());
        assert_eq!(Verbosity::Info, Verbosity::try_from(3).unwrap());
        assert_eq!(Verbosity::Debug, Verbosity::try_from(4).unwrap());
        assert_eq!(Verbosity::Trace, Verbosity::try_from(5).unwrap());

        for verbosity in Verbosity::ALL.iter() {
            assert_eq!(*verbosity, Verbosity::try_from(verbosity.ordinal()).unwrap());
        }
    }

    #[test]
    fn should_reject_unknown_ordinals() {
        assert!(Verbosity::try_from(6).is_err());
        assert!(Verbosity::try_from(255).is_err());
        assert!("6".parse::<Verbosity>().is_err());
    }

    #[test]
    fn should_order_by_severity() {
        assert!(Verbosity::Trace < Verbosity::Debug);
        assert!(Verbosity::Debug < Verbosity::Info);
        assert!(Verbosity::Info < Verbosity::Warn);
        assert!(Verbosity::Warn < Verbosity::Error);
        assert!(Verbosity::Error < Verbosity::Crit);
    }

    #[test]
    fn should_parse_names_and_ordinals() {
        assert_eq!(Verbosity::Info, "info".parse().unwrap());
        assert_eq!(Verbosity::Info, " INFO ".parse().unwrap());
        assert_eq!(Verbosity::Info, "3".parse().unwrap());
        assert_eq!(Verbosity::Warn, "warning".parse().unwrap());
        assert_eq!(Verbosity::Crit, "critical".parse().unwrap());
        assert_eq!(Verbosity::Trace, "5".parse().unwrap());
        assert!("verbose".parse::<Verbosity>().is_err());
        assert!("".parse::<Verbosity>().is_err());
    }

    #[test]
    fn should_display_the_lowercase_name() {
        assert_eq!("crit", Verbosity::Crit.to_string());
        assert_eq!("debug", Verbosity::Debug.to_string());
    }

    #[test]
    fn should_serialize_as_ordinal() {
        assert_eq!("4", serde_json::to_string(&Verbosity::Debug).unwrap());
        assert_eq!(Verbosity::Warn, serde_json::from_str::<Verbosity>("2").unwrap());
        assert!(serde_json::from_str::<Verbosity>("9").is_err());
    }

    #[test]
    fn should_map_to_level_filters() {
        assert_eq!(LevelFilter::ERROR, Verbosity::Crit.level_filter());
        assert_eq!(LevelFilter::ERROR, Verbosity::Error.level_filter());
        assert_eq!(LevelFilter::INFO, Verbosity::Info.level_filter());
        assert_eq!(LevelFilter::TRACE, Verbosity::Trace.level_filter());
    }
}
