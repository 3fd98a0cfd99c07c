//! Distribution client for interacting with Solana
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without Solana. Instructions are
//!   executed against an in-memory simulation of the airdrop program.
//! - **Live Mode**: Actual Solana RPC calls to the deployed airdrop program.
//!
//! A client is an explicitly constructed, caller-owned object: build one when
//! the operator's signer becomes available and drop it when it goes away.
//! Dropping it cancels every event subscription it created.
//!
//! At most one `execute_distribution` should be in flight per operator. The
//! client does not serialize concurrent calls, and does not retry: a
//! submitted transaction cannot be recalled, and resubmitting a batch that
//! already landed would pay twice.

use std::str::FromStr;
use std::sync::Arc;

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use solana_sdk_ids::system_program;
use tracing::{debug, info, warn};

use crate::events::EventListener;
use crate::pda::{aggregate_state_address, parse_address, recipient_state_address};
use crate::types::discriminator;
use crate::validate::{validate, AmountInput};
use crate::{
    AirdropError, DistributionBatch, MockLedger, Result, SubmissionError, TransactionId,
    ValidationError,
};

/// Ledger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Mock mode for development - the program is simulated in-memory
    Mock,
    /// Live Solana mode (requires deployed program)
    Live,
}

/// Distribution client configuration
#[derive(Debug, Clone)]
pub struct DistributionConfig {
    /// Ledger mode (Mock or Live)
    pub mode: LedgerMode,
    /// Solana RPC endpoint (only used in Live mode)
    pub rpc_url: String,
    /// Websocket endpoint for event subscriptions. Derived from `rpc_url` if None.
    pub ws_url: Option<String>,
    /// Program ID of the airdrop program
    pub program_id: [u8; 32],
    /// Commitment level for transactions and reads
    pub commitment: String,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Mock,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            ws_url: None,
            program_id: [0u8; 32],
            commitment: "confirmed".to_string(),
        }
    }
}

impl DistributionConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: LedgerMode::Mock,
            ..Default::default()
        }
    }

    /// Create a live configuration for a local test validator
    pub fn localnet(program_id: [u8; 32]) -> Self {
        Self {
            mode: LedgerMode::Live,
            rpc_url: "http://127.0.0.1:8899".to_string(),
            ws_url: Some("ws://127.0.0.1:8900".to_string()),
            program_id,
            ..Default::default()
        }
    }

    /// Create a live configuration for Solana devnet
    pub fn devnet(program_id: [u8; 32]) -> Self {
        Self {
            mode: LedgerMode::Live,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id,
            ..Default::default()
        }
    }

    /// Create a live configuration for Solana mainnet
    pub fn mainnet(program_id: [u8; 32]) -> Self {
        Self {
            mode: LedgerMode::Live,
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ws_url: None,
            program_id,
            commitment: "finalized".to_string(),
        }
    }

    /// Get commitment config for Solana client
    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "finalized" => CommitmentConfig::finalized(),
            "confirmed" => CommitmentConfig::confirmed(),
            "processed" => CommitmentConfig::processed(),
            _ => CommitmentConfig::confirmed(),
        }
    }

    /// Websocket endpoint, falling back to the RPC URL with a ws scheme
    pub fn websocket_url(&self) -> String {
        if let Some(ws) = &self.ws_url {
            return ws.clone();
        }
        if let Some(rest) = self.rpc_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.rpc_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.rpc_url.clone()
        }
    }
}

/// Which instruction a submission carried, for error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Initialize,
    Airdrop,
}

/// Distribution client for on-chain operations
///
/// This client abstracts the Solana RPC calls and transaction building.
/// In mock mode, instructions run against a [`MockLedger`].
pub struct DistributionClient {
    pub(crate) config: DistributionConfig,
    /// Operator signing capability (keypair, hardware wallet, ...)
    signer: Option<Arc<dyn Signer + Send + Sync>>,
    /// Operator public key
    operator: Pubkey,
    /// Solana RPC client (only used in Live mode)
    pub(crate) rpc_client: Option<Arc<RpcClient>>,
    /// Simulated program (only used in Mock mode)
    pub(crate) mock: MockLedger,
    pub(crate) listener: EventListener,
}

impl DistributionClient {
    /// Create a read-only client for an operator public key.
    ///
    /// Submissions fail with `MissingSigner`; reads work as usual.
    pub fn new(config: DistributionConfig, operator: Pubkey) -> Self {
        let rpc_client = Self::rpc_for(&config);
        Self {
            config,
            signer: None,
            operator,
            rpc_client,
            mock: MockLedger::new(),
            listener: EventListener::new(),
        }
    }

    /// Create a client that signs with any [`Signer`] implementation
    pub fn with_signer(config: DistributionConfig, signer: Arc<dyn Signer + Send + Sync>) -> Self {
        let operator = signer.pubkey();
        let rpc_client = Self::rpc_for(&config);
        Self {
            config,
            signer: Some(signer),
            operator,
            rpc_client,
            mock: MockLedger::new(),
            listener: EventListener::new(),
        }
    }

    /// Create a client that signs with a local keypair
    pub fn with_keypair(config: DistributionConfig, keypair: Keypair) -> Self {
        Self::with_signer(config, Arc::new(keypair))
    }

    /// Share a simulated program with other clients (mock mode)
    pub fn with_mock_ledger(mut self, ledger: MockLedger) -> Self {
        self.mock = ledger;
        self
    }

    fn rpc_for(config: &DistributionConfig) -> Option<Arc<RpcClient>> {
        if config.mode == LedgerMode::Live {
            Some(Arc::new(RpcClient::new_with_commitment(
                config.rpc_url.clone(),
                config.commitment_config(),
            )))
        } else {
            None
        }
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Operator public key
    pub fn operator(&self) -> &Pubkey {
        &self.operator
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == LedgerMode::Mock
    }

    /// Get program ID as Pubkey
    pub fn program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.config.program_id)
    }

    pub fn mock_ledger(&self) -> &MockLedger {
        &self.mock
    }

    /// Credit lamports to an address (mock mode only, for testing)
    pub fn fund_mock_account(&self, address: &Pubkey, lamports: u64) -> Result<()> {
        if !self.is_mock() {
            return Err(AirdropError::MockOnly("fund_mock_account"));
        }
        self.mock.fund(address, lamports);
        Ok(())
    }

    pub(crate) fn rpc(&self) -> Result<&Arc<RpcClient>> {
        self.rpc_client
            .as_ref()
            .ok_or_else(|| AirdropError::Rpc("RPC client not initialized".to_string()))
    }

    /// Aggregate state PDA for this client's program
    pub fn aggregate_state_address(&self) -> Pubkey {
        aggregate_state_address(&self.program_id()).0
    }

    /// Recipient state PDA for this client's program
    pub fn recipient_state_address(&self, recipient: &Pubkey) -> Pubkey {
        recipient_state_address(&self.program_id(), recipient).0
    }

    // ==================== Instruction Building ====================

    /// Build the one-time `initialize` instruction
    pub fn build_initialize_instruction(&self) -> Instruction {
        Instruction {
            program_id: self.program_id(),
            accounts: vec![
                AccountMeta::new(self.aggregate_state_address(), false), // airdrop_state (init)
                AccountMeta::new(self.operator, true),                   // owner (signer + payer)
                AccountMeta::new_readonly(system_program::id(), false),  // system_program
            ],
            data: discriminator::INITIALIZE.to_vec(),
        }
    }

    /// Build the batch `airdrop` instruction.
    ///
    /// The first recipient doubles as the program's `recipient_loader`
    /// account, together with its recipient state PDA. The program requires
    /// that distinguished writable account, so it is always `recipients[0]`.
    pub fn build_airdrop_instruction(&self, recipients: &[Pubkey], lamports: &[u64]) -> Instruction {
        let loader = recipients.first().copied().unwrap_or_default();

        let mut data = discriminator::AIRDROP.to_vec();
        data.extend_from_slice(&(recipients.len() as u32).to_le_bytes());
        for recipient in recipients {
            data.extend_from_slice(recipient.as_ref());
        }
        data.extend_from_slice(&(lamports.len() as u32).to_le_bytes());
        for amount in lamports {
            data.extend_from_slice(&amount.to_le_bytes());
        }

        Instruction {
            program_id: self.program_id(),
            accounts: vec![
                AccountMeta::new(self.aggregate_state_address(), false),  // airdrop_state
                AccountMeta::new(self.operator, true),                    // owner
                AccountMeta::new(loader, false),                          // recipient_loader
                AccountMeta::new(self.recipient_state_address(&loader), false), // recipient_data
                AccountMeta::new_readonly(system_program::id(), false),   // system_program
            ],
            data,
        }
    }

    // ==================== Submission ====================

    /// Initialize the aggregate state PDA with this operator as owner. One-time call.
    ///
    /// A second call fails with `AlreadyInitialized` and leaves the existing
    /// counters untouched.
    pub async fn initialize(&self) -> Result<TransactionId> {
        info!("Initializing airdrop state with owner {}", self.operator);

        let instruction = self.build_initialize_instruction();
        let signature = self.send_transaction(vec![instruction], Operation::Initialize).await?;

        info!("Airdrop state initialized: {}", signature);
        Ok(signature)
    }

    /// Validate and submit a distribution in one step.
    ///
    /// The operator balance is read fresh right before validation; nothing is
    /// sent if validation fails.
    pub async fn execute_distribution<R, A>(
        &self,
        recipients: &[R],
        amounts: &[A],
    ) -> Result<TransactionId>
    where
        R: AsRef<str>,
        A: AmountInput,
    {
        let operator = self.operator;
        let available = crate::types::lamports_to_sol(self.get_balance_lamports(&operator).await?);
        let batch = validate(recipients, amounts, available)?;
        self.submit_batch(batch).await
    }

    /// Submit a validated batch as one atomic instruction and wait for confirmation.
    ///
    /// Returns once the configured commitment level is reached. State is not
    /// read back; call `get_stats()` afterwards for fresh totals.
    pub async fn submit_batch(&self, batch: DistributionBatch) -> Result<TransactionId> {
        let recipients = batch
            .recipients()
            .iter()
            .map(|r| parse_address(r))
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;
        let lamports = batch.amounts_in_lamports();

        info!(
            "Distributing {} SOL ({} lamports) to {} recipients",
            batch.total(),
            batch.total_lamports(),
            recipients.len(),
        );

        let instruction = self.build_airdrop_instruction(&recipients, lamports);
        let signature = self.send_transaction(vec![instruction], Operation::Airdrop).await?;

        info!("Distribution confirmed: {}", signature);
        Ok(signature)
    }

    /// Send a transaction to Solana (or the mock ledger) and wait for confirmation
    async fn send_transaction(
        &self,
        instructions: Vec<Instruction>,
        operation: Operation,
    ) -> Result<TransactionId> {
        let signer = self.signer.as_ref().ok_or(SubmissionError::MissingSigner)?;

        if self.is_mock() {
            return self
                .mock
                .process_transaction(&self.program_id(), &instructions, &signer.pubkey())
                .map_err(|e| {
                    warn!("[MOCK] {:?} rejected: {}", operation, e);
                    e.into()
                });
        }

        let rpc = self.rpc()?;
        let blockhash = rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let signer: &dyn Signer = signer.as_ref();
        let signers: Vec<&dyn Signer> = vec![signer];
        let tx = Transaction::new_signed_with_payer(
            &instructions,
            Some(&self.operator),
            &signers,
            blockhash,
        );

        debug!("Sending {:?} transaction", operation);
        rpc.send_and_confirm_transaction(&tx).await.map_err(|e| {
            let err = classify_client_error(&e, operation);
            warn!("{:?} failed: {} ({})", operation, err, e);
            err.into()
        })
    }
}

/// Map an RPC failure onto the submission error model.
///
/// A failure carrying a transaction error was rejected by the runtime or the
/// program and must not be retried. Anything else is a transport fault.
fn classify_client_error(err: &ClientError, operation: Operation) -> SubmissionError {
    match err.get_transaction_error() {
        Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) => {
            match (operation, code) {
                // System program: account already in use
                (Operation::Initialize, 0) => SubmissionError::AlreadyInitialized,
                // System program: transfer with insufficient lamports
                (Operation::Airdrop, 1) => SubmissionError::InsufficientFunds,
                _ => SubmissionError::from_program_code(code),
            }
        }
        Some(TransactionError::InstructionError(_, InstructionError::InsufficientFunds))
        | Some(TransactionError::InsufficientFundsForFee)
        | Some(TransactionError::InsufficientFundsForRent { .. }) => SubmissionError::InsufficientFunds,
        Some(other) => SubmissionError::SimulationRejected(other.to_string()),
        None => SubmissionError::Transport(err.to_string()),
    }
}

impl std::fmt::Debug for DistributionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionClient")
            .field("mode", &self.config.mode)
            .field("program_id", &self.program_id())
            .field("operator", &self.operator)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

/// Parse a base58 program id into config bytes
pub fn parse_program_id(program_id: &str) -> std::result::Result<[u8; 32], ValidationError> {
    Pubkey::from_str(program_id.trim())
        .map(|p| p.to_bytes())
        .map_err(|_| ValidationError::InvalidAddress(program_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{sol_to_lamports, AccountLookup, AggregateState};
    use solana_client::client_error::ClientErrorKind;
    use solana_sdk::native_token::LAMPORTS_PER_SOL;

    const PROGRAM_ID: [u8; 32] = [9u8; 32];

    fn mock_config() -> DistributionConfig {
        DistributionConfig {
            program_id: PROGRAM_ID,
            ..DistributionConfig::mock()
        }
    }

    fn funded_client(sol: u64) -> DistributionClient {
        let client = DistributionClient::with_keypair(mock_config(), Keypair::new());
        client.fund_mock_account(client.operator(), sol * LAMPORTS_PER_SOL).unwrap();
        client
    }

    #[test]
    fn test_default_config() {
        let config = DistributionConfig::default();
        assert!(config.rpc_url.contains("solana"));
        assert_eq!(config.commitment, "confirmed");
        assert_eq!(config.mode, LedgerMode::Mock);
    }

    #[test]
    fn test_devnet_config() {
        let config = DistributionConfig::devnet(PROGRAM_ID);
        assert_eq!(config.mode, LedgerMode::Live);
        assert_eq!(config.program_id, PROGRAM_ID);
        assert_eq!(config.websocket_url(), "wss://api.devnet.solana.com");
    }

    #[test]
    fn test_mainnet_uses_finalized() {
        let config = DistributionConfig::mainnet(PROGRAM_ID);
        assert_eq!(config.commitment_config(), CommitmentConfig::finalized());
    }

    #[test]
    fn test_unknown_commitment_falls_back() {
        let config = DistributionConfig {
            commitment: "bogus".to_string(),
            ..Default::default()
        };
        assert_eq!(config.commitment_config(), CommitmentConfig::confirmed());
    }

    #[test]
    fn test_websocket_url() {
        let config = DistributionConfig {
            rpc_url: "http://localhost:8899".to_string(),
            ..Default::default()
        };
        assert_eq!(config.websocket_url(), "ws://localhost:8899");

        let config = DistributionConfig::localnet(PROGRAM_ID);
        assert_eq!(config.websocket_url(), "ws://127.0.0.1:8900");
    }

    #[test]
    fn test_parse_program_id() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_program_id(&key.to_string()).unwrap(), key.to_bytes());
        assert!(parse_program_id("nope").is_err());
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = DistributionClient::new(mock_config(), Pubkey::new_unique());
        assert!(client.is_mock());
        assert_eq!(client.program_id(), Pubkey::new_from_array(PROGRAM_ID));
    }

    #[test]
    fn test_airdrop_instruction_layout() {
        let client = DistributionClient::new(mock_config(), Pubkey::new_unique());
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        let ix = client.build_airdrop_instruction(&[a, b], &[1, 2]);

        assert_eq!(&ix.data[..8], &discriminator::AIRDROP);
        assert_eq!(ix.data.len(), 8 + 4 + 2 * 32 + 4 + 2 * 8);
        assert_eq!(&ix.data[8..12], &2u32.to_le_bytes());
        assert_eq!(&ix.data[12..44], a.as_ref());

        // Loader is the first recipient, writable, with its own state PDA
        assert_eq!(ix.accounts[2].pubkey, a);
        assert!(ix.accounts[2].is_writable);
        assert_eq!(ix.accounts[3].pubkey, client.recipient_state_address(&a));
        assert!(ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[4].pubkey, system_program::id());
    }

    #[test]
    fn test_initialize_instruction_layout() {
        let operator = Pubkey::new_unique();
        let client = DistributionClient::new(mock_config(), operator);
        let ix = client.build_initialize_instruction();
        assert_eq!(ix.data, discriminator::INITIALIZE.to_vec());
        assert_eq!(ix.accounts[0].pubkey, client.aggregate_state_address());
        assert_eq!(ix.accounts[1].pubkey, operator);
        assert!(ix.accounts[1].is_signer);
    }

    #[tokio::test]
    async fn test_mock_initialize_sets_owner() {
        let client = funded_client(1);
        client.initialize().await.unwrap();

        let state = client.fetch_aggregate_state().await.unwrap();
        assert_eq!(state, AccountLookup::Found(AggregateState::new(*client.operator())));
    }

    #[tokio::test]
    async fn test_double_initialize_rejected() {
        let client = funded_client(10);
        client.initialize().await.unwrap();
        client
            .execute_distribution(&[Pubkey::new_unique().to_string()], &["1.0"])
            .await
            .unwrap();

        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, AirdropError::Submission(SubmissionError::AlreadyInitialized)));

        // Counters survive the rejected re-initialization
        let stats = client.get_stats().await.unwrap();
        assert_eq!(stats.total_batches, 1);
        assert_eq!(stats.total_distributed, 1.0);
    }

    #[tokio::test]
    async fn test_distribution_before_initialize() {
        let client = funded_client(10);
        let err = client
            .execute_distribution(&[Pubkey::new_unique().to_string()], &["1.0"])
            .await
            .unwrap_err();
        assert!(matches!(err, AirdropError::Submission(SubmissionError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_execute_distribution_updates_state() {
        let client = funded_client(10);
        client.initialize().await.unwrap();

        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let before = client.get_stats().await.unwrap();

        client
            .execute_distribution(&[a.to_string(), b.to_string()], &["1.5", "2.0"])
            .await
            .unwrap();

        let after = client.get_stats().await.unwrap();
        assert_eq!(after.total_distributed - before.total_distributed, 3.5);
        assert_eq!(after.total_batches - before.total_batches, 1);
        assert_eq!(client.get_recipient_amount(&a.to_string()).await.unwrap(), 1.5);
        assert_eq!(client.get_recipient_amount(&b.to_string()).await.unwrap(), 2.0);
        assert_eq!(client.mock_ledger().balance(&a), sol_to_lamports(1.5));
        assert_eq!(client.mock_ledger().balance(client.operator()), sol_to_lamports(6.5));
    }

    #[tokio::test]
    async fn test_insufficient_balance_never_submits() {
        let client = funded_client(1);
        client.initialize().await.unwrap();

        let err = client
            .execute_distribution(&[Pubkey::new_unique().to_string()], &["2.0"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AirdropError::Validation(ValidationError::InsufficientBalance { .. })
        ));
        assert_eq!(client.get_stats().await.unwrap().total_batches, 0);
    }

    #[tokio::test]
    async fn test_spend_entire_balance() {
        let client = DistributionClient::with_keypair(mock_config(), Keypair::new());
        client.fund_mock_account(client.operator(), 300_000_000).unwrap();
        client.initialize().await.unwrap();

        client
            .execute_distribution(&[Pubkey::new_unique().to_string(), Pubkey::new_unique().to_string()], &["0.1", "0.2"])
            .await
            .unwrap();
        assert_eq!(client.mock_ledger().balance(client.operator()), 0);
        assert_eq!(client.get_stats().await.unwrap().total_batches, 1);
    }

    #[tokio::test]
    async fn test_non_owner_rejected() {
        let owner = funded_client(10);
        owner.initialize().await.unwrap();

        let intruder = DistributionClient::with_keypair(mock_config(), Keypair::new())
            .with_mock_ledger(owner.mock_ledger().clone());
        intruder.fund_mock_account(intruder.operator(), 10 * LAMPORTS_PER_SOL).unwrap();

        let err = intruder
            .execute_distribution(&[Pubkey::new_unique().to_string()], &["1.0"])
            .await
            .unwrap_err();
        assert!(matches!(err, AirdropError::Submission(SubmissionError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_balance_race_rejected_at_execution() {
        let client = funded_client(10);
        client.initialize().await.unwrap();

        // Validated while 10 SOL were available
        let batch = validate(&[Pubkey::new_unique().to_string()], &["5"], 10.0).unwrap();

        // A concurrent spend leaves only 1 SOL
        client
            .execute_distribution(&[Pubkey::new_unique().to_string()], &["9"])
            .await
            .unwrap();

        let err = client.submit_batch(batch).await.unwrap_err();
        assert!(matches!(err, AirdropError::Submission(SubmissionError::InsufficientFunds)));
        assert_eq!(client.get_stats().await.unwrap().total_batches, 1);
    }

    #[tokio::test]
    async fn test_unparsable_recipient_caught_before_submission() {
        let client = funded_client(10);
        client.initialize().await.unwrap();

        // Right length, but not base58
        let bogus = "0".repeat(40);
        let err = client.execute_distribution(&[bogus.clone()], &["1"]).await.unwrap_err();
        assert!(matches!(err, AirdropError::Validation(ValidationError::InvalidAddress(a)) if a == bogus));
        assert_eq!(client.get_stats().await.unwrap().total_batches, 0);
    }

    #[tokio::test]
    async fn test_live_without_signer() {
        let client = DistributionClient::new(DistributionConfig::devnet(PROGRAM_ID), Pubkey::new_unique());
        let err = client
            .send_transaction(vec![client.build_initialize_instruction()], Operation::Initialize)
            .await
            .unwrap_err();
        assert!(matches!(err, AirdropError::Submission(SubmissionError::MissingSigner)));
    }

    #[tokio::test]
    async fn test_fund_rejected_in_live_mode() {
        let client = DistributionClient::new(DistributionConfig::devnet(PROGRAM_ID), Pubkey::new_unique());
        let err = client.fund_mock_account(&Pubkey::new_unique(), 1).unwrap_err();
        assert!(matches!(err, AirdropError::MockOnly("fund_mock_account")));
    }

    fn tx_error(err: TransactionError) -> ClientError {
        ClientError::from(ClientErrorKind::TransactionError(err))
    }

    #[test]
    fn test_classify_already_in_use_on_initialize() {
        let err = tx_error(TransactionError::InstructionError(0, InstructionError::Custom(0)));
        assert_eq!(
            classify_client_error(&err, Operation::Initialize),
            SubmissionError::AlreadyInitialized,
        );
    }

    #[test]
    fn test_classify_program_errors() {
        let err = tx_error(TransactionError::InstructionError(0, InstructionError::Custom(6002)));
        assert_eq!(classify_client_error(&err, Operation::Airdrop), SubmissionError::Unauthorized);

        let err = tx_error(TransactionError::InstructionError(0, InstructionError::Custom(1)));
        assert_eq!(classify_client_error(&err, Operation::Airdrop), SubmissionError::InsufficientFunds);

        let err = tx_error(TransactionError::InsufficientFundsForFee);
        assert_eq!(classify_client_error(&err, Operation::Airdrop), SubmissionError::InsufficientFunds);
    }

    #[test]
    fn test_classify_other_runtime_rejection() {
        let err = tx_error(TransactionError::BlockhashNotFound);
        let classified = classify_client_error(&err, Operation::Airdrop);
        assert!(matches!(classified, SubmissionError::SimulationRejected(_)));
        assert!(!classified.is_retryable());
    }

    #[test]
    fn test_classify_transport() {
        let err = ClientError::from(ClientErrorKind::Custom("connection refused".to_string()));
        let classified = classify_client_error(&err, Operation::Airdrop);
        assert!(matches!(classified, SubmissionError::Transport(_)));
        assert!(classified.is_retryable());
    }
}
