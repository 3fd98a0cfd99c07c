//! Configuration types

use std::path::{Path, PathBuf};

use airdropper_distribution::{parse_program_id, DistributionConfig, LedgerMode};
use airdropper_keystore::{default_key_path, expand_path};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Ledger connection
    #[serde(default)]
    pub network: NetworkSettings,

    /// Deployed airdrop program
    #[serde(default)]
    pub program: ProgramSettings,

    /// Operator signer
    #[serde(default)]
    pub operator: OperatorSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.to_path_buf());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.to_path_buf());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Path this instance was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Operator keypair file with `~` and variables expanded
    pub fn keypair_path(&self) -> PathBuf {
        match &self.operator.keypair_path {
            Some(path) => expand_path(path),
            None => default_key_path(),
        }
    }

    /// Build the distribution client configuration.
    ///
    /// Mock mode tolerates a missing program id; live mode requires one.
    pub fn distribution_config(&self) -> Result<DistributionConfig> {
        let mode: LedgerMode = self.network.mode.into();
        let program_id = match self.program.program_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => parse_program_id(id)
                .map_err(|_| SettingsError::InvalidProgramId(id.to_string()))?,
            _ if mode == LedgerMode::Mock => DistributionConfig::mock().program_id,
            _ => return Err(SettingsError::MissingProgramId),
        };

        Ok(DistributionConfig {
            mode,
            rpc_url: self.network.rpc_url.clone(),
            ws_url: self.network.ws_url.clone(),
            program_id,
            commitment: self.network.commitment.clone(),
        })
    }
}

/// Ledger connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Websocket endpoint, derived from `rpc_url` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// processed, confirmed or finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    #[serde(default)]
    pub mode: Mode,
}

fn default_rpc_url() -> String {
    "https://api.devnet.solana.com".to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            ws_url: None,
            commitment: default_commitment(),
            mode: Mode::default(),
        }
    }
}

/// Where instructions are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-memory simulation of the program
    #[default]
    Mock,
    /// Deployed program over RPC
    Live,
}

impl From<Mode> for LedgerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mock => LedgerMode::Mock,
            Mode::Live => LedgerMode::Live,
        }
    }
}

/// Deployed program settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSettings {
    /// Base58 program id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
}

/// Operator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorSettings {
    /// Keypair file, `~/.airdropper/id.json` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "11111111111111111111111111111112";

    fn temp_settings_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("airdropper-settings-{}", uuid::Uuid::new_v4()))
            .join("settings.json")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.network.mode, Mode::Mock);
        assert_eq!(settings.network.commitment, "confirmed");
        assert!(settings.program.program_id.is_none());
        assert!(settings.keypair_path().ends_with("id.json"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_settings_path();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.network.rpc_url, default_rpc_url());
        assert_eq!(settings.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_settings_path();
        let mut settings = Settings::load_from(&path).unwrap();
        settings.network.mode = Mode::Live;
        settings.network.rpc_url = "http://127.0.0.1:8899".to_string();
        settings.program.program_id = Some(PROGRAM.to_string());
        settings.save().unwrap();

        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.network.mode, Mode::Live);
        assert_eq!(reloaded.network.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(reloaded.program.program_id.as_deref(), Some(PROGRAM));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "network": { "mode": "live" } }"#).unwrap();
        assert_eq!(settings.network.mode, Mode::Live);
        assert_eq!(settings.network.commitment, "confirmed");
        assert!(settings.operator.keypair_path.is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let parsed = serde_json::from_str::<Settings>(r#"{ "network": { "mode": "staging" } }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_distribution_config_live() {
        let mut settings = Settings::default();
        settings.network.mode = Mode::Live;
        settings.network.commitment = "finalized".to_string();
        settings.program.program_id = Some(format!(" {} ", PROGRAM));

        let config = settings.distribution_config().unwrap();
        assert_eq!(config.mode, LedgerMode::Live);
        assert_eq!(config.program_id, parse_program_id(PROGRAM).unwrap());
        assert_eq!(config.commitment, "finalized");
    }

    #[test]
    fn test_distribution_config_requires_program_in_live_mode() {
        let mut settings = Settings::default();
        settings.network.mode = Mode::Live;
        assert!(matches!(
            settings.distribution_config(),
            Err(SettingsError::MissingProgramId)
        ));

        settings.network.mode = Mode::Mock;
        assert_eq!(settings.distribution_config().unwrap().mode, LedgerMode::Mock);
    }

    #[test]
    fn test_invalid_program_id() {
        let mut settings = Settings::default();
        settings.program.program_id = Some("Airdrop1111".to_string());
        assert!(matches!(
            settings.distribution_config(),
            Err(SettingsError::InvalidProgramId(_))
        ));
    }

    #[test]
    fn test_keypair_path_expanded() {
        let mut settings = Settings::default();
        settings.operator.keypair_path = Some("/keys/operator.json".to_string());
        assert_eq!(settings.keypair_path(), PathBuf::from("/keys/operator.json"));
    }
}
