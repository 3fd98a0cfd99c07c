//! Distribution types and on-chain account layouts

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;

use crate::{DecodeError, StateReadError};

/// Anchor discriminators for the airdrop program.
/// Each is the first 8 bytes of SHA256("<namespace>:<name>").
pub mod discriminator {
    pub const INITIALIZE:        [u8; 8] = [0xaf, 0xaf, 0x6d, 0x1f, 0x0d, 0x98, 0x9b, 0xed];
    pub const AIRDROP:           [u8; 8] = [0x71, 0xad, 0x24, 0xee, 0x26, 0x98, 0x16, 0x75];
    pub const AIRDROP_STATE:     [u8; 8] = [0x01, 0x31, 0x6e, 0xcd, 0xb9, 0x88, 0xc6, 0xa5];
    pub const RECIPIENT_DATA:    [u8; 8] = [0xdf, 0x90, 0xa9, 0xd4, 0x6f, 0x25, 0xc6, 0xaa];
    pub const BATCH_EVENT:       [u8; 8] = [0x0f, 0x86, 0x6d, 0xa8, 0xe9, 0xa9, 0xf9, 0xe7];
}

/// Convert whole SOL to lamports, rounding to the nearest lamport.
///
/// Saturates: negative or NaN input gives 0, anything past `u64::MAX`
/// gives `u64::MAX`. Use [`checked_sol_to_lamports`] for operator input.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Like [`sol_to_lamports`], but `None` when the result does not fit a u64
pub fn checked_sol_to_lamports(sol: f64) -> Option<u64> {
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    // u64::MAX as f64 is 2^64, one past the largest representable value
    if lamports.is_finite() && lamports >= 0.0 && lamports < u64::MAX as f64 {
        Some(lamports as u64)
    } else {
        None
    }
}

/// Convert lamports to whole SOL for display
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// A validated batch, ready for exactly one submission.
///
/// Only [`crate::validate`] builds one. Submitting consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBatch {
    recipients: Vec<String>,
    amounts: Vec<f64>,
    lamports: Vec<u64>,
    total_lamports: u64,
}

impl DistributionBatch {
    /// `lamports` must be index-aligned with `amounts`, and their sum must
    /// fit a u64; `validate` checks both.
    pub(crate) fn new(recipients: Vec<String>, amounts: Vec<f64>, lamports: Vec<u64>) -> Self {
        debug_assert_eq!(recipients.len(), amounts.len());
        debug_assert_eq!(amounts.len(), lamports.len());
        let total_lamports = lamports.iter().fold(0u64, |acc, l| acc.saturating_add(*l));
        Self { recipients, amounts, lamports, total_lamports }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Amounts in whole SOL, index-aligned with `recipients`
    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Sum of all amounts in whole SOL
    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    /// Amounts converted to lamports
    pub fn amounts_in_lamports(&self) -> &[u64] {
        &self.lamports
    }

    /// Sum of the converted amounts, i.e. what the program adds to its total
    pub fn total_lamports(&self) -> u64 {
        self.total_lamports
    }
}

/// Result of reading an account that may not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup<T> {
    Found(T),
    NotFound,
}

impl<T> AccountLookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// On-chain aggregate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateState {
    /// Operator allowed to distribute
    pub owner: Pubkey,
    /// Cumulative lamports distributed
    pub total_distributed: u64,
    /// Completed batches
    pub total_batches: u64,
}

impl AggregateState {
    // 8 discriminator + 32 owner + 8 total_airdropped + 8 total_airdrops
    pub const LEN: usize = 8 + 32 + 8 + 8;

    pub fn new(owner: Pubkey) -> Self {
        Self {
            owner,
            total_distributed: 0,
            total_batches: 0,
        }
    }

    /// Decode account data
    ///
    /// Layout (after 8-byte discriminator):
    ///   0..32:  owner Pubkey
    ///  32..40:  total_airdropped u64
    ///  40..48:  total_airdrops u64
    pub fn decode(account: &Pubkey, data: &[u8]) -> Result<Self, StateReadError> {
        let d = account_body(account, data, &discriminator::AIRDROP_STATE, Self::LEN)?;
        Ok(Self {
            owner: Pubkey::new_from_array(read_array(&d[0..32])),
            total_distributed: u64::from_le_bytes(read_array(&d[32..40])),
            total_batches: u64::from_le_bytes(read_array(&d[40..48])),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&discriminator::AIRDROP_STATE);
        data.extend_from_slice(self.owner.as_ref());
        data.extend_from_slice(&self.total_distributed.to_le_bytes());
        data.extend_from_slice(&self.total_batches.to_le_bytes());
        data
    }
}

/// On-chain per-recipient state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientState {
    pub recipient: Pubkey,
    /// Cumulative lamports received across all batches
    pub amount_received: u64,
}

impl RecipientState {
    // 8 discriminator + 32 recipient + 8 amount_received
    pub const LEN: usize = 8 + 32 + 8;

    pub fn decode(account: &Pubkey, data: &[u8]) -> Result<Self, StateReadError> {
        let d = account_body(account, data, &discriminator::RECIPIENT_DATA, Self::LEN)?;
        Ok(Self {
            recipient: Pubkey::new_from_array(read_array(&d[0..32])),
            amount_received: u64::from_le_bytes(read_array(&d[32..40])),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&discriminator::RECIPIENT_DATA);
        data.extend_from_slice(self.recipient.as_ref());
        data.extend_from_slice(&self.amount_received.to_le_bytes());
        data
    }
}

/// Aggregate statistics for display, amounts in whole SOL.
///
/// An uninitialized program reports the zero value with an empty owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_distributed: f64,
    pub total_batches: u64,
    pub owner: String,
}

impl AggregateStats {
    pub fn is_initialized(&self) -> bool {
        !self.owner.is_empty()
    }
}

impl From<AccountLookup<AggregateState>> for AggregateStats {
    fn from(lookup: AccountLookup<AggregateState>) -> Self {
        match lookup {
            AccountLookup::Found(state) => Self {
                total_distributed: lamports_to_sol(state.total_distributed),
                total_batches: state.total_batches,
                owner: state.owner.to_string(),
            },
            AccountLookup::NotFound => Self::default(),
        }
    }
}

/// Emitted by the program once per completed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCompletedEvent {
    pub total_recipients: u32,
    /// Lamports paid out in the batch
    pub total_amount: u64,
    /// Unix timestamp of the block clock
    pub timestamp: i64,
}

impl BatchCompletedEvent {
    // 8 discriminator + 4 total_recipients + 8 total_amount + 8 timestamp
    pub const LEN: usize = 8 + 4 + 8 + 8;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < Self::LEN {
            return Err(DecodeError::TooShort { expected: Self::LEN, actual: data.len() });
        }
        if data[..8] != discriminator::BATCH_EVENT {
            return Err(DecodeError::Discriminator);
        }
        let d = &data[8..];
        Ok(Self {
            total_recipients: u32::from_le_bytes(read_array(&d[0..4])),
            total_amount: u64::from_le_bytes(read_array(&d[4..12])),
            timestamp: i64::from_le_bytes(read_array(&d[12..20])),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&discriminator::BATCH_EVENT);
        data.extend_from_slice(&self.total_recipients.to_le_bytes());
        data.extend_from_slice(&self.total_amount.to_le_bytes());
        data.extend_from_slice(&self.timestamp.to_le_bytes());
        data
    }

    /// Decode a `Program data: <base64>` log line.
    ///
    /// Returns `None` for lines that are not program data at all, and
    /// `Some(Err(DecodeError::Discriminator))` for data emitted by other events.
    pub fn from_log_line(line: &str) -> Option<Result<Self, DecodeError>> {
        let payload = line.strip_prefix("Program data: ")?;
        Some(
            STANDARD
                .decode(payload.trim())
                .map_err(|e| DecodeError::Base64(e.to_string()))
                .and_then(|bytes| Self::decode(&bytes)),
        )
    }

    /// Total in whole SOL
    pub fn total_sol(&self) -> f64 {
        lamports_to_sol(self.total_amount)
    }
}

fn account_body<'a>(
    account: &Pubkey,
    data: &'a [u8],
    expected: &[u8; 8],
    len: usize,
) -> Result<&'a [u8], StateReadError> {
    if data.len() < len {
        return Err(StateReadError::CorruptState {
            account: account.to_string(),
            reason: format!("expected {} bytes, got {}", len, data.len()),
        });
    }
    if &data[..8] != expected {
        return Err(StateReadError::CorruptState {
            account: account.to_string(),
            reason: "account discriminator mismatch".to_string(),
        });
    }
    Ok(&data[8..len])
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
