//! Airdropper Keystore
//!
//! Operator keypair management and path utilities shared by Airdropper apps.
//!
//! ## Features
//!
//! - Solana CLI keypair files (JSON array of 64 bytes)
//! - Base58 secret key import
//! - Path expansion (`~`, environment variables)

mod keypair;
mod paths;

pub use keypair::{
    default_key_path, load_keypair, load_or_generate_keypair, parse_keypair, save_keypair,
    KeystoreError,
};
pub use paths::{default_config_dir, expand_path};

pub type Result<T> = std::result::Result<T, KeystoreError>;
