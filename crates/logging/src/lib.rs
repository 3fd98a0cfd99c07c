//! Airdropper Logging
//!
//! Shared tracing setup for Airdropper binaries. `RUST_LOG` always wins over
//! the level passed in code.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

const CRATES: &[&str] = &[
    "airdropper",
    "airdropper_distribution",
    "airdropper_keystore",
    "airdropper_settings",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown log level: {0}")]
pub struct ParseLevelError(String);

/// Verbosity of Airdropper's own crates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Level for a count of `-v` flags, starting from `Warn`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Filter directive: our crates at this level, dependencies at warn
    pub fn directive(&self) -> String {
        let mut directive = String::from("warn");
        for target in CRATES {
            directive.push_str(&format!(",{}={}", target, self.as_str()));
        }
        directive
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
///
/// Returns false if a subscriber was already installed.
pub fn try_init(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(fmt_layer::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter_for(level))
        .try_init()
        .is_ok()
}

/// Install the global subscriber, ignoring a second call
pub fn init(level: LogLevel) {
    if !try_init(level) {
        tracing::debug!("Logging already initialized");
    }
}
