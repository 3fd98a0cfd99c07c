//! Airdropper Settings
//!
//! Operator configuration stored as JSON, by default at
//! `~/.airdropper/settings.json`.
//!
//! ## Usage
//!
//! ```no_run
//! use airdropper_settings::{Mode, Settings};
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.network.mode = Mode::Live;
//! settings.network.rpc_url = "http://127.0.0.1:8899".to_string();
//! settings.save()?;
//!
//! let config = settings.distribution_config()?;
//! # Ok::<(), airdropper_settings::SettingsError>(())
//! ```

mod config;

pub use config::{Mode, NetworkSettings, OperatorSettings, ProgramSettings, Settings};

use std::path::PathBuf;

use airdropper_keystore::default_config_dir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid program id: {0}")]
    InvalidProgramId(String),

    #[error("No program id configured (required in live mode)")]
    MissingProgramId,
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
