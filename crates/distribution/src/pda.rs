//! Program-derived addresses used by the airdrop program.
//!
//! The distribution client targets its writes and the state reader targets its
//! reads through these functions only, so both always agree on the address.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::ValidationError;

/// Seed of the single aggregate state account
pub const AIRDROP_STATE_SEED: &[u8] = b"airdrop_state";

/// Seed prefix of the per-recipient state accounts
pub const RECIPIENT_DATA_SEED: &[u8] = b"recipient_data";

/// Derive PDA for aggregate state: ["airdrop_state"]
pub fn aggregate_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AIRDROP_STATE_SEED], program_id)
}

/// Derive PDA for recipient state: ["recipient_data", recipient]
pub fn recipient_state_address(program_id: &Pubkey, recipient: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RECIPIENT_DATA_SEED, recipient.as_ref()], program_id)
}

/// Same as [`recipient_state_address`] for a base58 address string.
pub fn recipient_state_address_for(
    program_id: &Pubkey,
    recipient: &str,
) -> std::result::Result<(Pubkey, u8), ValidationError> {
    let recipient = parse_address(recipient)?;
    Ok(recipient_state_address(program_id, &recipient))
}

pub(crate) fn parse_address(address: &str) -> std::result::Result<Pubkey, ValidationError> {
    Pubkey::from_str(address.trim())
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))
}
