//! Operator keypair files
//!
//! Files use the Solana CLI layout: a JSON array of the 64 secret key bytes.
//! A bare base58 secret key string is accepted on load as well.

use std::fs;
use std::path::{Path, PathBuf};

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use thiserror::Error;
use tracing::{debug, info};

use crate::paths::default_config_dir;

const SECRET_KEY_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Keypair file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read keypair {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write keypair {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid keypair: {0}")]
    Invalid(String),
}

/// `~/.airdropper/id.json`
pub fn default_key_path() -> PathBuf {
    default_config_dir().join("id.json")
}

/// Parse keypair file contents: a 64-byte JSON array or a base58 string
pub fn parse_keypair(content: &str) -> Result<Keypair, KeystoreError> {
    let content = content.trim();

    let bytes = if content.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(content)
            .map_err(|e| KeystoreError::Invalid(format!("bad JSON byte array: {}", e)))?
    } else {
        bs58::decode(content)
            .into_vec()
            .map_err(|e| KeystoreError::Invalid(format!("bad base58: {}", e)))?
    };

    if bytes.len() != SECRET_KEY_LEN {
        return Err(KeystoreError::Invalid(format!(
            "expected {} bytes, got {}",
            SECRET_KEY_LEN,
            bytes.len()
        )));
    }

    Keypair::from_bytes(&bytes).map_err(|e| KeystoreError::Invalid(e.to_string()))
}

/// Load an existing keypair file
pub fn load_keypair(path: &Path) -> Result<Keypair, KeystoreError> {
    if !path.exists() {
        return Err(KeystoreError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| KeystoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let keypair = parse_keypair(&content)?;
    debug!("Loaded keypair {} from {:?}", keypair.pubkey(), path);
    Ok(keypair)
}

/// Write a keypair in the JSON array layout, creating parent directories.
///
/// The file is readable by the owner only on unix.
pub fn save_keypair(keypair: &Keypair, path: &Path) -> Result<(), KeystoreError> {
    let write_err = |source: std::io::Error| KeystoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let content = serde_json::to_string(&keypair.to_bytes().to_vec())
        .map_err(|e| KeystoreError::Invalid(e.to_string()))?;
    fs::write(path, content).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    Ok(())
}

/// Load the keypair at `path`, generating and saving a new one if missing
pub fn load_or_generate_keypair(path: &Path) -> Result<Keypair, KeystoreError> {
    if path.exists() {
        return load_keypair(path);
    }

    let keypair = Keypair::new();
    save_keypair(&keypair, path)?;
    info!("Generated new keypair {} at {:?}", keypair.pubkey(), path);
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("airdropper-keystore-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_generate_then_reload() {
        let path = temp_path("id.json");
        let first = load_or_generate_keypair(&path).unwrap();
        let second = load_or_generate_keypair(&path).unwrap();
        assert_eq!(first.pubkey(), second.pubkey());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_is_json_byte_array() {
        let path = temp_path("id.json");
        let keypair = Keypair::new();
        save_keypair(&keypair, &path).unwrap();

        let raw: Vec<u8> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, keypair.to_bytes().to_vec());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_base58_secret_accepted() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        assert_eq!(parse_keypair(&encoded).unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_missing_file() {
        let err = load_keypair(&temp_path("absent.json")).unwrap_err();
        assert!(matches!(err, KeystoreError::NotFound(_)));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = parse_keypair("[1,2,3]").unwrap_err();
        assert!(matches!(err, KeystoreError::Invalid(_)));
        assert!(parse_keypair("not-base58-0OIl").is_err());
    }

    #[test]
    fn test_default_key_path() {
        assert!(default_key_path().ends_with(".airdropper/id.json"));
    }
}
