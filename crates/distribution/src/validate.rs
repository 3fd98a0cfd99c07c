//! Client-side batch validation
//!
//! Checks run structural first (emptiness, cardinality, size), then per item
//! (addresses, amounts), then the balance, so the operator sees the most
//! basic problem first.

use crate::types::{checked_sol_to_lamports, lamports_to_sol, sol_to_lamports};
use crate::{DistributionBatch, ValidationError};

/// Shortest base58 encoding of a 32-byte address
pub const MIN_ADDRESS_LEN: usize = 32;

/// Longest base58 encoding of a 32-byte address
pub const MAX_ADDRESS_LEN: usize = 44;

/// Most recipients one airdrop instruction can carry.
///
/// Each recipient adds 40 bytes of instruction data; past this the
/// transaction no longer fits the 1232-byte packet limit.
pub const MAX_BATCH_RECIPIENTS: usize = 20;

/// Something that can be read as a whole-SOL amount
pub trait AmountInput {
    /// Parsed value, `None` if unparsable
    fn to_amount(&self) -> Option<f64>;

    /// The value as the operator entered it, for error messages
    fn raw(&self) -> String;

    /// Blank entries are dropped before validation
    fn is_blank(&self) -> bool {
        false
    }
}

impl AmountInput for str {
    fn to_amount(&self) -> Option<f64> {
        self.trim().parse().ok()
    }

    fn raw(&self) -> String {
        self.trim().to_string()
    }

    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl AmountInput for String {
    fn to_amount(&self) -> Option<f64> {
        self.as_str().to_amount()
    }

    fn raw(&self) -> String {
        self.as_str().raw()
    }

    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl AmountInput for &str {
    fn to_amount(&self) -> Option<f64> {
        (*self).to_amount()
    }

    fn raw(&self) -> String {
        (*self).raw()
    }

    fn is_blank(&self) -> bool {
        (*self).is_blank()
    }
}

impl AmountInput for f64 {
    fn to_amount(&self) -> Option<f64> {
        Some(*self)
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

/// Split pasted text into trimmed, non-blank lines
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Running total for display while the operator is still typing.
/// Unparsable entries count as zero.
pub fn batch_total<A: AmountInput>(amounts: &[A]) -> f64 {
    amounts
        .iter()
        .filter(|a| !a.is_blank())
        .filter_map(|a| a.to_amount())
        .filter(|a| a.is_finite())
        .sum()
}

/// Validate recipients and amounts against the operator's available balance
/// (whole SOL) and build a batch.
///
/// The balance comparison is done in lamports, so amounts that sum to the
/// balance exactly are accepted regardless of float rounding.
pub fn validate<R, A>(
    recipients: &[R],
    amounts: &[A],
    available_balance: f64,
) -> Result<DistributionBatch, ValidationError>
where
    R: AsRef<str>,
    A: AmountInput,
{
    let recipients: Vec<String> = recipients
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    let amounts: Vec<&A> = amounts.iter().filter(|a| !a.is_blank()).collect();

    if recipients.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    if recipients.len() != amounts.len() {
        return Err(ValidationError::CardinalityMismatch {
            recipients: recipients.len(),
            amounts: amounts.len(),
        });
    }
    if recipients.len() > MAX_BATCH_RECIPIENTS {
        return Err(ValidationError::BatchTooLarge {
            count: recipients.len(),
            max: MAX_BATCH_RECIPIENTS,
        });
    }

    if let Some(bad) = recipients
        .iter()
        .find(|r| !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&r.len()))
    {
        return Err(ValidationError::InvalidAddress(bad.clone()));
    }

    let mut parsed = Vec::with_capacity(amounts.len());
    let mut lamports = Vec::with_capacity(amounts.len());
    for amount in amounts {
        let value = amount.to_amount().filter(|v| v.is_finite() && *v > 0.0);
        // Sub-lamport amounts would be submitted as zero
        match value.and_then(|v| checked_sol_to_lamports(v).map(|l| (v, l))) {
            Some((value, converted)) if converted > 0 => {
                parsed.push(value);
                lamports.push(converted);
            }
            _ => return Err(ValidationError::InvalidAmount(amount.raw())),
        }
    }

    let available = sol_to_lamports(available_balance);
    let required = lamports.iter().try_fold(0u64, |acc, l| acc.checked_add(*l));
    match required {
        Some(required) if required <= available => {}
        Some(required) => {
            return Err(ValidationError::InsufficientBalance {
                required: lamports_to_sol(required),
                available: available_balance,
            })
        }
        // Past u64::MAX lamports, so more than any balance can hold
        None => {
            return Err(ValidationError::InsufficientBalance {
                required: parsed.iter().sum(),
                available: available_balance,
            })
        }
    }

    Ok(DistributionBatch::new(recipients, parsed, lamports))
}
