//! In-memory stand-in for the airdrop program.
//!
//! Mock mode executes the same instructions the live client would send,
//! decoding their data and applying the program's checks, so the wire format
//! and error model are exercised without a validator. Clones share state, so
//! several clients (owner and non-owner) can act on one simulated program.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::pda::{aggregate_state_address, recipient_state_address};
use crate::types::{discriminator, AggregateState, BatchCompletedEvent, RecipientState};
use crate::SubmissionError;

/// Anchor framework error codes the simulation raises
const ERR_INSTRUCTION_FALLBACK_NOT_FOUND: u32 = 100;
const ERR_INSTRUCTION_DID_NOT_DESERIALIZE: u32 = 102;
const ERR_CONSTRAINT_SEEDS: u32 = 2006;

/// AirdropError codes
const ERR_ARRAY_LENGTH_MISMATCH: u32 = 6000;
const ERR_NO_RECIPIENTS: u32 = 6001;

#[derive(Debug, Default, Clone)]
struct MockState {
    /// Program-owned account data by address
    accounts: HashMap<Pubkey, Vec<u8>>,
    /// Lamport balances by address
    balances: HashMap<Pubkey, u64>,
    /// Transaction counter for generating mock signatures
    tx_counter: u64,
}

/// Shared handle to the simulated program
#[derive(Debug, Clone)]
pub struct MockLedger {
    state: Arc<RwLock<MockState>>,
    events: broadcast::Sender<BatchCompletedEvent>,
}

impl MockLedger {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            events,
        }
    }

    /// Credit lamports to an address
    pub fn fund(&self, address: &Pubkey, lamports: u64) {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        let balance = state.balances.entry(*address).or_insert(0);
        *balance = balance.saturating_add(lamports);
        info!("[MOCK] Funded {} with {} lamports (balance {})", address, lamports, balance);
    }

    pub fn balance(&self, address: &Pubkey) -> u64 {
        let state = self.state.read().expect("mock ledger lock poisoned");
        state.balances.get(address).copied().unwrap_or(0)
    }

    pub fn account_data(&self, address: &Pubkey) -> Option<Vec<u8>> {
        let state = self.state.read().expect("mock ledger lock poisoned");
        state.accounts.get(address).cloned()
    }

    /// Overwrite raw account data, e.g. to simulate a corrupt account
    pub fn set_account_data(&self, address: &Pubkey, data: Vec<u8>) {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        state.accounts.insert(*address, data);
    }

    pub(crate) fn subscribe_events(&self) -> broadcast::Receiver<BatchCompletedEvent> {
        self.events.subscribe()
    }

    /// Execute a transaction atomically: every instruction applies or none do.
    pub(crate) fn process_transaction(
        &self,
        program_id: &Pubkey,
        instructions: &[Instruction],
        signer: &Pubkey,
    ) -> Result<Signature, SubmissionError> {
        let mut state = self.state.write().expect("mock ledger lock poisoned");

        let mut working = state.clone();
        let mut emitted = Vec::new();
        for instruction in instructions {
            if &instruction.program_id != program_id {
                return Err(SubmissionError::SimulationRejected(format!(
                    "unknown program {}",
                    instruction.program_id
                )));
            }
            for meta in instruction.accounts.iter().filter(|m| m.is_signer) {
                if &meta.pubkey != signer {
                    return Err(SubmissionError::SimulationRejected(format!(
                        "missing signature for {}",
                        meta.pubkey
                    )));
                }
            }
            if let Some(event) = execute(&mut working, program_id, instruction)? {
                emitted.push(event);
            }
        }

        working.tx_counter += 1;
        let signature = mock_signature(working.tx_counter);
        *state = working;
        drop(state);

        for event in emitted {
            // No receivers is fine
            let _ = self.events.send(event);
        }
        debug!("[MOCK] Transaction {} applied", signature);
        Ok(signature)
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn execute(
    state: &mut MockState,
    program_id: &Pubkey,
    instruction: &Instruction,
) -> Result<Option<BatchCompletedEvent>, SubmissionError> {
    if instruction.data.len() < 8 {
        return Err(SubmissionError::from_program_code(ERR_INSTRUCTION_FALLBACK_NOT_FOUND));
    }
    let (tag, args) = instruction.data.split_at(8);

    if tag == discriminator::INITIALIZE {
        initialize(state, program_id, instruction)?;
        Ok(None)
    } else if tag == discriminator::AIRDROP {
        airdrop(state, program_id, instruction, args).map(Some)
    } else {
        Err(SubmissionError::from_program_code(ERR_INSTRUCTION_FALLBACK_NOT_FOUND))
    }
}

fn account_at(instruction: &Instruction, index: usize) -> Result<Pubkey, SubmissionError> {
    instruction
        .accounts
        .get(index)
        .map(|m| m.pubkey)
        .ok_or_else(|| SubmissionError::SimulationRejected("not enough account keys".to_string()))
}

fn initialize(
    state: &mut MockState,
    program_id: &Pubkey,
    instruction: &Instruction,
) -> Result<(), SubmissionError> {
    let state_account = account_at(instruction, 0)?;
    let owner = account_at(instruction, 1)?;

    if state_account != aggregate_state_address(program_id).0 {
        return Err(SubmissionError::from_program_code(ERR_CONSTRAINT_SEEDS));
    }
    if state.accounts.contains_key(&state_account) {
        // System program refuses to allocate an account that is in use
        return Err(SubmissionError::AlreadyInitialized);
    }

    state.accounts.insert(state_account, AggregateState::new(owner).encode());
    info!("[MOCK] Airdrop state initialized, owner: {}", owner);
    Ok(())
}

fn airdrop(
    state: &mut MockState,
    program_id: &Pubkey,
    instruction: &Instruction,
    args: &[u8],
) -> Result<BatchCompletedEvent, SubmissionError> {
    let state_account = account_at(instruction, 0)?;
    let owner = account_at(instruction, 1)?;
    let loader = account_at(instruction, 2)?;
    let loader_data = account_at(instruction, 3)?;

    if state_account != aggregate_state_address(program_id).0
        || loader_data != recipient_state_address(program_id, &loader).0
    {
        return Err(SubmissionError::from_program_code(ERR_CONSTRAINT_SEEDS));
    }

    let mut aggregate = match state.accounts.get(&state_account) {
        Some(data) => AggregateState::decode(&state_account, data)
            .map_err(|e| SubmissionError::SimulationRejected(e.to_string()))?,
        None => return Err(SubmissionError::NotInitialized),
    };

    let (recipients, amounts) = decode_airdrop_args(args)
        .ok_or_else(|| SubmissionError::from_program_code(ERR_INSTRUCTION_DID_NOT_DESERIALIZE))?;

    if recipients.len() != amounts.len() {
        return Err(SubmissionError::from_program_code(ERR_ARRAY_LENGTH_MISMATCH));
    }
    if recipients.is_empty() {
        return Err(SubmissionError::from_program_code(ERR_NO_RECIPIENTS));
    }
    if owner != aggregate.owner {
        return Err(SubmissionError::Unauthorized);
    }

    let total_amount = amounts
        .iter()
        .try_fold(0u64, |acc, a| acc.checked_add(*a))
        .ok_or(SubmissionError::InsufficientFunds)?;
    let owner_balance = state.balances.get(&owner).copied().unwrap_or(0);
    if owner_balance < total_amount {
        return Err(SubmissionError::InsufficientFunds);
    }

    state.balances.insert(owner, owner_balance - total_amount);
    for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
        let balance = state.balances.entry(*recipient).or_insert(0);
        *balance = balance.saturating_add(*amount);

        let (address, _) = recipient_state_address(program_id, recipient);
        let mut record = match state.accounts.get(&address) {
            Some(data) => RecipientState::decode(&address, data)
                .map_err(|e| SubmissionError::SimulationRejected(e.to_string()))?,
            None => RecipientState { recipient: *recipient, amount_received: 0 },
        };
        record.amount_received = record.amount_received.saturating_add(*amount);
        state.accounts.insert(address, record.encode());
    }

    aggregate.total_distributed = aggregate.total_distributed.saturating_add(total_amount);
    aggregate.total_batches += 1;
    state.accounts.insert(state_account, aggregate.encode());

    info!(
        "[MOCK] Airdropped {} lamports to {} recipients (batch #{})",
        total_amount,
        recipients.len(),
        aggregate.total_batches,
    );

    Ok(BatchCompletedEvent {
        total_recipients: recipients.len() as u32,
        total_amount,
        timestamp: now(),
    })
}

/// Borsh `(Vec<Pubkey>, Vec<u64>)`
fn decode_airdrop_args(args: &[u8]) -> Option<(Vec<Pubkey>, Vec<u64>)> {
    let mut cursor = args;

    let count = take_u32(&mut cursor)? as usize;
    let mut recipients = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let bytes = take(&mut cursor, 32)?;
        recipients.push(Pubkey::try_from(bytes).ok()?);
    }

    let count = take_u32(&mut cursor)? as usize;
    let mut amounts = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let bytes = take(&mut cursor, 8)?;
        amounts.push(u64::from_le_bytes(bytes.try_into().ok()?));
    }

    cursor.is_empty().then_some((recipients, amounts))
}

fn take<'a>(cursor: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    if cursor.len() < len {
        return None;
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Some(head)
}

fn take_u32(cursor: &mut &[u8]) -> Option<u32> {
    let bytes = take(cursor, 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn mock_signature(counter: u64) -> Signature {
    let mut sig = [0u8; 64];
    sig[0..8].copy_from_slice(&counter.to_le_bytes());
    sig[8..16].copy_from_slice(b"mocktxn!");
    Signature::from(sig)
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
