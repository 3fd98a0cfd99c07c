//! Airdropper Distribution
//!
//! Solana client for the batch airdrop program: one operator pays native SOL
//! to many recipients in a single atomic instruction.
//!
//! ## Distribution Flow
//!
//! 1. **Initialize**: The operator creates the aggregate state PDA once and
//!    becomes its owner. A second attempt fails with `AlreadyInitialized`.
//! 2. **Validate**: Recipient and amount lines are checked client-side
//!    (cardinality, address length, positive amounts, operator balance) before
//!    any transaction is built.
//! 3. **Distribute**: One `airdrop` instruction carries every recipient and
//!    amount. The program pays them all or none of them.
//! 4. **Read back**: Totals are always re-read from chain. A missing account
//!    is a zero state, a malformed one is `CorruptState`.
//! 5. **Watch**: Batch-completion events are pushed to subscribers.

mod client;
mod error;
mod events;
mod history;
mod mock;
mod pda;
mod reader;
mod types;
mod validate;

pub use client::{parse_program_id, DistributionClient, DistributionConfig, LedgerMode};
pub use error::{
    AirdropError, DecodeError, Result, StateReadError, SubmissionError, ValidationError,
};
pub use events::{parse_batch_events, SubscriptionId};
pub use history::{DistributionStatus, RecentDistributionRecord, RecentDistributions};
pub use mock::MockLedger;
pub use pda::{
    aggregate_state_address, recipient_state_address, recipient_state_address_for,
    AIRDROP_STATE_SEED, RECIPIENT_DATA_SEED,
};
pub use types::*;
pub use validate::{
    batch_total, parse_lines, validate, AmountInput, MAX_ADDRESS_LEN, MAX_BATCH_RECIPIENTS,
    MIN_ADDRESS_LEN,
};

/// Transaction identifier returned once a submission is confirmed
pub type TransactionId = solana_sdk::signature::Signature;
