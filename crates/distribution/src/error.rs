//! Error types for distribution operations

use thiserror::Error;

/// Client-side rejection of a batch. Never reaches the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter at least one recipient")]
    EmptyBatch,

    #[error("Number of recipients must match number of amounts ({recipients} recipients, {amounts} amounts)")]
    CardinalityMismatch { recipients: usize, amounts: usize },

    #[error("Batch too large: {count} recipients (max {max} per transaction)")]
    BatchTooLarge { count: usize, max: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance. Need {required} SOL but have {available} SOL")]
    InsufficientBalance { required: f64, available: f64 },
}

/// Failure while submitting or confirming a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Transport fault before a confirmation was observed
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// Preflight simulation rejected the transaction
    #[error("Simulation rejected transaction: {0}")]
    SimulationRejected(String),

    #[error("Insufficient funds at execution time")]
    InsufficientFunds,

    #[error("Airdrop program already initialized")]
    AlreadyInitialized,

    #[error("Airdrop program not initialized")]
    NotInitialized,

    #[error("Only the owner can distribute")]
    Unauthorized,

    #[error("Program rejected transaction (code {code}): {reason}")]
    ProgramRejected { code: u32, reason: String },

    #[error("No signer configured for this client")]
    MissingSigner,
}

impl SubmissionError {
    /// Map a custom error code raised by the airdrop program (or the Anchor
    /// framework underneath it).
    pub fn from_program_code(code: u32) -> Self {
        match code {
            // Anchor framework: AccountNotInitialized
            3012 => Self::NotInitialized,
            // AirdropError, numbered from 6000
            6002 => Self::Unauthorized,
            6003 => Self::InsufficientFunds,
            _ => Self::ProgramRejected {
                code,
                reason: program_error_message(code).to_string(),
            },
        }
    }

    /// Whether resubmitting could be safe.
    ///
    /// Only a transport fault qualifies. Anything the program or the runtime
    /// rejected must not be resent, a resent batch that did land pays twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn program_error_message(code: u32) -> &'static str {
    match code {
        100 => "Instruction discriminator not found",
        102 => "Instruction did not deserialize",
        2006 => "A seeds constraint was violated",
        6000 => "Arrays must have the same length",
        6001 => "No recipients provided",
        6002 => "Only owner can call this function",
        6003 => "Insufficient funds for airdrop",
        _ => "Unknown program error",
    }
}

/// An account exists but its contents cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateReadError {
    #[error("Corrupt account state at {account}: {reason}")]
    CorruptState { account: String, reason: String },
}

/// Malformed event payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Unexpected discriminator")]
    Discriminator,

    #[error("Invalid base64: {0}")]
    Base64(String),
}

#[derive(Error, Debug)]
pub enum AirdropError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    StateRead(#[from] StateReadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("RPC error: {0}")]
    Rpc(String),

    /// A test helper was called on a client talking to a real cluster
    #[error("{0} is only available in mock mode")]
    MockOnly(&'static str),
}

pub type Result<T> = std::result::Result<T, AirdropError>;
