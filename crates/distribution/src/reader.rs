//! State reads: aggregate stats, per-recipient totals, balances.
//!
//! Every call goes to the ledger; nothing is cached. A missing account is a
//! valid zero state. An account that exists but does not decode is
//! `CorruptState` and is never turned into a zero.

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::pda::parse_address;
use crate::types::lamports_to_sol;
use crate::{
    AccountLookup, AggregateState, AggregateStats, AirdropError, DistributionClient,
    RecipientState, Result, StateReadError,
};

impl DistributionClient {
    /// Raw data of a program-owned account, `None` if it does not exist
    async fn fetch_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        if self.is_mock() {
            return Ok(self.mock.account_data(address));
        }

        let rpc = self.rpc()?;
        let response = rpc
            .get_account_with_commitment(address, self.config.commitment_config())
            .await
            .map_err(|e| AirdropError::Rpc(format!("get_account {}: {}", address, e)))?;

        match response.value {
            Some(account) if account.owner != self.program_id() => {
                Err(StateReadError::CorruptState {
                    account: address.to_string(),
                    reason: format!("owned by {}, not the airdrop program", account.owner),
                }
                .into())
            }
            Some(account) => Ok(Some(account.data)),
            None => Ok(None),
        }
    }

    /// Read the aggregate state account
    pub async fn fetch_aggregate_state(&self) -> Result<AccountLookup<AggregateState>> {
        let address = self.aggregate_state_address();
        debug!("Fetching aggregate state {}", address);

        match self.fetch_account_data(&address).await? {
            Some(data) => Ok(AccountLookup::Found(AggregateState::decode(&address, &data)?)),
            None => {
                debug!("Aggregate state not initialized");
                Ok(AccountLookup::NotFound)
            }
        }
    }

    /// Read a recipient's state account.
    ///
    /// The record is returned as stored. The program writes a batch's records
    /// into the first recipient's account, so the stored `recipient` can name
    /// a different address than the one queried; that is logged here and
    /// `get_recipient_amount` treats it as nothing received.
    pub async fn fetch_recipient_state(
        &self,
        recipient: &Pubkey,
    ) -> Result<AccountLookup<RecipientState>> {
        let address = self.recipient_state_address(recipient);
        debug!("Fetching recipient state for {} at {}", recipient, address);

        match self.fetch_account_data(&address).await? {
            Some(data) => {
                let state = RecipientState::decode(&address, &data)?;
                if state.recipient != *recipient {
                    warn!(
                        "Recipient record at {} belongs to {}, not {}",
                        address, state.recipient, recipient
                    );
                }
                Ok(AccountLookup::Found(state))
            }
            None => Ok(AccountLookup::NotFound),
        }
    }

    /// Aggregate statistics in whole SOL.
    ///
    /// An uninitialized program yields `{ 0, 0, "" }`.
    pub async fn get_stats(&self) -> Result<AggregateStats> {
        Ok(self.fetch_aggregate_state().await?.into())
    }

    /// Total SOL an address has received, 0 if it never received anything
    pub async fn get_recipient_amount(&self, address: &str) -> Result<f64> {
        let recipient = parse_address(address)?;
        let received = match self.fetch_recipient_state(&recipient).await? {
            AccountLookup::Found(state) if state.recipient == recipient => state.amount_received,
            AccountLookup::Found(_) | AccountLookup::NotFound => 0,
        };
        Ok(lamports_to_sol(received))
    }

    /// Ledger balance of an address in whole SOL
    pub async fn get_balance(&self, address: &str) -> Result<f64> {
        let address = parse_address(address)?;
        Ok(lamports_to_sol(self.get_balance_lamports(&address).await?))
    }

    /// Ledger balance of an address in lamports
    pub async fn get_balance_lamports(&self, address: &Pubkey) -> Result<u64> {
        if self.is_mock() {
            return Ok(self.mock.balance(address));
        }

        let rpc = self.rpc()?;
        rpc.get_balance(address)
            .await
            .map_err(|e| AirdropError::Rpc(format!("get_balance: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DistributionConfig, ValidationError};
    use solana_sdk::native_token::LAMPORTS_PER_SOL;

    fn client() -> DistributionClient {
        let config = DistributionConfig {
            program_id: [3u8; 32],
            ..DistributionConfig::mock()
        };
        DistributionClient::new(config, Pubkey::new_unique())
    }

    #[tokio::test]
    async fn test_stats_uninitialized() {
        let stats = client().get_stats().await.unwrap();
        assert_eq!(stats, AggregateStats { total_distributed: 0.0, total_batches: 0, owner: String::new() });
    }

    #[tokio::test]
    async fn test_recipient_never_paid() {
        let amount = client()
            .get_recipient_amount(&Pubkey::new_unique().to_string())
            .await
            .unwrap();
        assert_eq!(amount, 0.0);
    }

    #[tokio::test]
    async fn test_corrupt_aggregate_state_is_error() {
        let client = client();
        let address = client.aggregate_state_address();
        client.mock_ledger().set_account_data(&address, vec![1, 2, 3]);

        let err = client.get_stats().await.unwrap_err();
        assert!(matches!(err, AirdropError::StateRead(StateReadError::CorruptState { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_recipient_state_is_error() {
        let client = client();
        let recipient = Pubkey::new_unique();
        let address = client.recipient_state_address(&recipient);
        client.mock_ledger().set_account_data(&address, vec![0u8; RecipientState::LEN]);

        let err = client.get_recipient_amount(&recipient.to_string()).await.unwrap_err();
        assert!(matches!(err, AirdropError::StateRead(StateReadError::CorruptState { .. })));
    }

    #[tokio::test]
    async fn test_record_of_other_recipient_not_counted() {
        let client = client();
        let queried = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let stored = RecipientState { recipient: other, amount_received: 5 * LAMPORTS_PER_SOL };
        client
            .mock_ledger()
            .set_account_data(&client.recipient_state_address(&queried), stored.encode());

        let lookup = client.fetch_recipient_state(&queried).await.unwrap();
        assert_eq!(lookup, AccountLookup::Found(stored));
        let amount = client.get_recipient_amount(&queried.to_string()).await.unwrap();
        assert_eq!(amount, 0.0);
    }

    #[tokio::test]
    async fn test_stats_decoded_from_account() {
        let client = client();
        let owner = Pubkey::new_unique();
        let state = AggregateState { owner, total_distributed: 2 * LAMPORTS_PER_SOL, total_batches: 4 };
        client.mock_ledger().set_account_data(&client.aggregate_state_address(), state.encode());

        let stats = client.get_stats().await.unwrap();
        assert_eq!(stats.total_distributed, 2.0);
        assert_eq!(stats.total_batches, 4);
        assert_eq!(stats.owner, owner.to_string());
    }

    #[tokio::test]
    async fn test_balance_in_whole_units() {
        let client = client();
        let who = Pubkey::new_unique();
        client.mock_ledger().fund(&who, 1_500_000_000);
        assert_eq!(client.get_balance(&who.to_string()).await.unwrap(), 1.5);
    }

    #[tokio::test]
    async fn test_invalid_address_on_read() {
        let err = client().get_balance("garbage").await.unwrap_err();
        assert!(matches!(err, AirdropError::Validation(ValidationError::InvalidAddress(_))));
    }
}
