//! Raffle contract client over JSON-RPC
//!
//! Reads go straight to the contract; writes are signed with the configured key and
//! only reported as successful after the requested number of confirmations and a
//! successful receipt status.

use crate::error::{Result, RoundError};
use crate::traits::LedgerClient;
use async_trait::async_trait;
use ethers::contract::parse_log;
use ethers::prelude::*;
use ethers::providers::Http;
use round_config::LedgerSettings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use ::types::{Round, RoundNumber, TxReference};
use url::Url;

abigen!(
    RaffleContract,
    r#"[
        function currentRoundId() external view returns (uint256)
        function getRound(uint256 roundId) external view returns (uint256 startTime, uint256 endTime, bool isActive, bool isCompleted, address winner, uint256 winningTokenId)
        function createRound(uint256 startTime, uint256 endTime) external returns (uint256)
        function submitSnapshot(uint256 roundId, uint256[] tokenIds, address[] owners) external
        function requestDraw() external
        event RoundCreated(uint256 indexed roundId, uint256 startTime, uint256 endTime)
    ]"#
);

type SignedClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersLedgerClient {
    contract: RaffleContract<SignedClient>,
    confirmations: usize,
}

impl EthersLedgerClient {
    /// Connect to the RPC endpoint and bind the signer to the node's chain id
    pub async fn connect(settings: &LedgerSettings) -> Result<Self> {
        info!("🌐 Connecting to ledger at {}", settings.rpc_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RoundError::ledger(format!("Failed to build HTTP client: {}", e)))?;
        let url: Url = settings.rpc_url.parse().map_err(|e| RoundError::Configuration {
            message: format!("Invalid RPC URL '{}': {}", settings.rpc_url, e),
        })?;
        let provider = Provider::<Http>::new(Http::new_with_client(url, http_client));

        let private_key = settings
            .private_key
            .as_deref()
            .ok_or_else(|| RoundError::Configuration {
                message: "ledger.private_key is required".to_string(),
            })?;
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| RoundError::Configuration {
                message: format!("Invalid private key format: {}", e),
            })?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| RoundError::ledger(format!("Failed to fetch chain id: {}", e)))?;
        let wallet = wallet.with_chain_id(chain_id.as_u64());
        let signer_address = wallet.address();

        let contract_address: Address =
            settings
                .contract_address
                .parse()
                .map_err(|e| RoundError::Configuration {
                    message: format!(
                        "Invalid contract address '{}': {}",
                        settings.contract_address, e
                    ),
                })?;

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = RaffleContract::new(contract_address, client);

        info!("✅ Ledger client ready");
        info!("   - Chain id: {}", chain_id);
        info!("   - Contract: {:#x}", contract_address);
        info!("   - Signer: {:#x}", signer_address);

        Ok(Self {
            contract,
            confirmations: settings.confirmations,
        })
    }

    /// Send a prepared call and wait for a successful receipt
    async fn send_and_wait<D: ethers::abi::Detokenize>(
        &self,
        call: ContractCall<SignedClient, D>,
        label: &str,
    ) -> std::result::Result<TransactionReceipt, String> {
        let pending = call
            .send()
            .await
            .map_err(|e| format!("{} send failed: {}", label, e))?;
        let tx_hash = *pending;
        debug!("{} sent: {:#x}", label, tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| format!("{} confirmation failed: {}", label, e))?
            .ok_or_else(|| format!("{} transaction {:#x} dropped", label, tx_hash))?;

        if receipt.status != Some(U64::from(1)) {
            return Err(format!(
                "{} transaction {:#x} reverted",
                label, receipt.transaction_hash
            ));
        }
        Ok(receipt)
    }
}

fn to_secs(value: U256, field: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(RoundError::ledger(format!("{} out of range: {}", field, value)));
    }
    Ok(value.as_u64())
}

fn round_number(value: U256) -> Result<RoundNumber> {
    to_secs(value, "round id")
}

fn parse_owners(owners: &[String]) -> std::result::Result<Vec<Address>, String> {
    owners
        .iter()
        .map(|owner| {
            owner
                .parse::<Address>()
                .map_err(|e| format!("Invalid owner address '{}': {}", owner, e))
        })
        .collect()
}

#[async_trait]
impl LedgerClient for EthersLedgerClient {
    async fn current_round_number(&self) -> Result<RoundNumber> {
        let current = self
            .contract
            .current_round_id()
            .call()
            .await
            .map_err(|e| RoundError::ledger(format!("currentRoundId failed: {}", e)))?;
        round_number(current)
    }

    async fn get_round(&self, number: RoundNumber) -> Result<Round> {
        let (start, end, is_active, is_completed, winner, winning_id) = self
            .contract
            .get_round(U256::from(number))
            .call()
            .await
            .map_err(|e| RoundError::ledger(format!("getRound({}) failed: {}", number, e)))?;

        if start.is_zero() && end.is_zero() {
            return Err(RoundError::RoundNotFound { round: number });
        }

        let winner = Round::normalize_winner(Some(format!("{:#x}", winner)));
        let winning_item_id = winner.as_ref().map(|_| winning_id);

        Ok(Round {
            number,
            start_time: to_secs(start, "startTime")?,
            end_time: to_secs(end, "endTime")?,
            is_active,
            is_completed,
            winner,
            winning_item_id,
        })
    }

    async fn create_round(&self, start_time: u64, end_time: u64) -> Result<Option<RoundNumber>> {
        let call = self
            .contract
            .create_round(U256::from(start_time), U256::from(end_time));
        let receipt = self
            .send_and_wait(call, "createRound")
            .await
            .map_err(RoundError::ledger)?;

        let created = receipt
            .logs
            .into_iter()
            .find_map(|log| parse_log::<RoundCreatedFilter>(log).ok());

        match created {
            Some(event) => Ok(Some(round_number(event.round_id)?)),
            None => {
                warn!(
                    "⚠️ createRound {:#x} confirmed without a RoundCreated log",
                    receipt.transaction_hash
                );
                Ok(None)
            }
        }
    }

    async fn submit_snapshot(
        &self,
        round: RoundNumber,
        item_ids: Vec<U256>,
        owners: Vec<String>,
    ) -> Result<TxReference> {
        let owners =
            parse_owners(&owners).map_err(|message| RoundError::Submission { round, message })?;

        let call = self
            .contract
            .submit_snapshot(U256::from(round), item_ids, owners);
        let receipt = self
            .send_and_wait(call, "submitSnapshot")
            .await
            .map_err(|message| RoundError::Submission { round, message })?;

        Ok(TxReference::new(format!("{:#x}", receipt.transaction_hash)))
    }

    async fn request_draw(&self) -> Result<()> {
        let call = self.contract.request_draw();
        let receipt = self
            .send_and_wait(call, "requestDraw")
            .await
            .map_err(RoundError::ledger)?;
        info!("🎲 Draw requested: {:#x}", receipt.transaction_hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_secs_rejects_overflow() {
        assert_eq!(to_secs(U256::from(42u64), "t").unwrap(), 42);
        assert!(to_secs(U256::from(u64::MAX) + 1, "t").is_err());
    }

    #[test]
    fn test_parse_owners() {
        let owners = vec!["0x00000000000000000000000000000000000000aa".to_string()];
        assert_eq!(parse_owners(&owners).unwrap().len(), 1);
        assert!(parse_owners(&["0xnotanaddress".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_connect_requires_private_key() {
        let settings = LedgerSettings::default();
        let result = EthersLedgerClient::connect(&settings).await;
        assert!(matches!(result, Err(RoundError::Configuration { .. })));
    }
}
