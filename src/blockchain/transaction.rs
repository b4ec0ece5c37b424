//! Transaction building, signing, submission and confirmation polling.
//!
//! # Lifecycle
//! ```text
//! Built → Signed → Submitted → Pending → Confirmed | Failed | TimedOut
//! ```
//!
//! Polling is bounded by `max_poll_attempts`; one status query per attempt,
//! `poll_interval_ms` apart.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tokio::time::sleep;

use crate::blockchain::account::AccountClient;
use crate::blockchain::payload::{EntryFunction, RawTransaction, SignedTransaction, TypeTag};
use crate::blockchain::types::{
    Address, BlockchainError, BlockchainResult, Coin, ConfirmationStatus, TransactionReceipt,
    TransportError, TxHash,
};
use crate::config::NamesConfig;
use crate::observability::metrics;

/// Node error code for a sender that does not exist on-chain.
const ACCOUNT_NOT_FOUND: &str = "account_not_found";

/// Move abort raised when a coin store is published twice.
const COIN_STORE_ALREADY_PUBLISHED: &str = "ECOIN_STORE_ALREADY_PUBLISHED";

/// Transaction `type` reported while still in the mempool.
const PENDING_TRANSACTION: &str = "pending_transaction";

/// Error body returned by the node on rejected requests.
#[derive(Debug, Default, Deserialize)]
struct NodeError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    vm_error_code: Option<u64>,
}

impl NodeError {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| NodeError {
            message: body.to_string(),
            ..NodeError::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

/// The fields of a transaction view that matter for confirmation.
#[derive(Debug, Deserialize)]
struct TransactionView {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    vm_status: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Builds, signs, submits and confirms transactions for one account.
pub struct TransactionSubmitter<'a> {
    account: &'a AccountClient,
}

impl<'a> TransactionSubmitter<'a> {
    pub fn new(account: &'a AccountClient) -> Self {
        Self { account }
    }

    /// Fill in sender, sequence number, gas and expiration around `payload`.
    pub async fn build(&self, payload: EntryFunction) -> BlockchainResult<RawTransaction> {
        let config = self.account.config();
        let sequence_number = self.account.sequence_number().await?;
        let gas_unit_price = self.account.gas_unit_price().await;
        let chain_id = self.account.chain_id().await?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Ok(RawTransaction {
            sender: self.account.address(),
            sequence_number,
            payload: payload.into(),
            max_gas_amount: config.max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs: now + config.expiration_secs,
            chain_id,
        })
    }

    pub fn sign(&self, raw: RawTransaction) -> BlockchainResult<SignedTransaction> {
        self.account.identity().sign_transaction(raw)
    }

    /// POST the signed transaction and return its hash.
    pub async fn submit(&self, signed: &SignedTransaction) -> BlockchainResult<TxHash> {
        let url = self.account.url("transactions");
        let result = self
            .account
            .gateway()
            .post_bcs(&url, signed.to_bytes()?, self.account.proxy())
            .await;

        match result {
            Ok(response) => {
                let submitted: SubmitResponse = response.json()?;
                tracing::info!(
                    address = %self.account.address(),
                    function = %signed.raw.payload.label(),
                    tx_hash = %submitted.hash,
                    "Transaction submitted"
                );
                Ok(TxHash(submitted.hash))
            }
            Err(TransportError::ServerError { status, body }) => {
                metrics::record_transaction("rejected");
                Err(classify_rejection(&self.account.address(), status, body))
            }
            Err(TransportError::NotFound { url }) => {
                metrics::record_transaction("rejected");
                Err(BlockchainError::SubmissionError { status: 404, body: url })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Poll until the transaction leaves the pending state or the budget runs out.
    pub async fn wait_for_transaction(&self, hash: &TxHash) -> BlockchainResult<ConfirmationStatus> {
        let config = self.account.config();
        let max_attempts = config.max_poll_attempts;
        let interval = Duration::from_millis(config.poll_interval_ms);

        for attempt in 1..=max_attempts {
            let view = match self.account.transaction_by_hash(&hash.0).await {
                // Not yet indexed by the node.
                Err(TransportError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
                Ok(value) => Some(
                    serde_json::from_value::<TransactionView>(value)
                        .map_err(|e| TransportError::Decode(e.to_string()))?,
                ),
            };

            match view {
                Some(view) if view.kind != PENDING_TRANSACTION => {
                    let status = if view.success == Some(true) {
                        metrics::record_transaction("confirmed");
                        ConfirmationStatus::Confirmed(TransactionReceipt {
                            hash: hash.clone(),
                            version: view.version.as_deref().and_then(|v| v.parse().ok()),
                            vm_status: view.vm_status.unwrap_or_default(),
                            polls: attempt,
                        })
                    } else {
                        metrics::record_transaction("failed");
                        ConfirmationStatus::Failed {
                            hash: hash.clone(),
                            reason: view
                                .vm_status
                                .unwrap_or_else(|| "unknown vm status".to_string()),
                        }
                    };
                    return Ok(status);
                }
                _ => {
                    tracing::debug!(tx_hash = %hash, attempt, "Transaction pending");
                }
            }

            if attempt < max_attempts {
                sleep(interval).await;
            }
        }

        metrics::record_transaction("timed_out");
        tracing::warn!(tx_hash = %hash, attempts = max_attempts, "Transaction confirmation timed out");
        Ok(ConfirmationStatus::TimedOut {
            hash: hash.clone(),
            attempts: max_attempts,
        })
    }

    /// Build, sign, submit and wait; non-success outcomes become errors.
    pub async fn submit_and_wait(&self, payload: EntryFunction) -> BlockchainResult<TransactionReceipt> {
        let raw = self.build(payload).await?;
        let signed = self.sign(raw)?;
        let hash = self.submit(&signed).await?;
        self.wait_for_transaction(&hash).await?.into_result()
    }

    /// Register `name` through the configured name-service router.
    pub async fn register_domain(
        &self,
        config: &NamesConfig,
        name: &str,
    ) -> BlockchainResult<TransactionReceipt> {
        let payload = register_domain_payload(config, name)?;
        self.submit_and_wait(payload).await
    }
}

/// `0x1::managed_coin::register<coin>()`.
pub fn register_coin_payload(coin: &Coin) -> BlockchainResult<EntryFunction> {
    let coin_type: TypeTag = coin.type_tag().parse()?;
    EntryFunction::natural("0x1::managed_coin", "register", vec![coin_type], vec![])
}

/// `router::register_domain(name, duration_secs, target_addr, to_addr)`.
///
/// Both optional addresses are left empty so the name resolves to the sender.
pub fn register_domain_payload(config: &NamesConfig, name: &str) -> BlockchainResult<EntryFunction> {
    EntryFunction::natural(
        &config.router_module,
        &config.register_function,
        vec![],
        vec![
            bcs::to_bytes(name)?,
            bcs::to_bytes(&config.registration_duration_secs)?,
            bcs::to_bytes(&None::<Address>)?,
            bcs::to_bytes(&None::<Address>)?,
        ],
    )
}

/// Map a rejected submission onto the error taxonomy.
///
/// The structured `error_code` is preferred; the message is only inspected
/// when the node did not send one.
fn classify_rejection(sender: &Address, status: u16, body: String) -> BlockchainError {
    let error = NodeError::parse(&body);
    let not_found = match error.error_code.as_deref() {
        Some(code) => code == ACCOUNT_NOT_FOUND,
        None => error.message.contains(ACCOUNT_NOT_FOUND),
    };
    if not_found {
        tracing::error!(address = %sender, "Account wasn't activated, send gas to activate this account");
        return BlockchainError::AccountNotActivated(sender.to_string());
    }
    tracing::debug!(
        status,
        error_code = ?error.error_code,
        vm_error_code = ?error.vm_error_code,
        "Submission rejected"
    );
    BlockchainError::SubmissionError { status, body }
}

/// True if a registration error means the coin store already exists.
pub fn is_already_registered(error: &BlockchainError) -> bool {
    match error {
        BlockchainError::SubmissionError { body, .. } => {
            let error = NodeError::parse(body);
            error.message.contains(COIN_STORE_ALREADY_PUBLISHED)
                || error
                    .error_code
                    .as_deref()
                    .is_some_and(|code| code.contains(COIN_STORE_ALREADY_PUBLISHED))
        }
        BlockchainError::TransactionFailed { reason, .. } => reason.contains(COIN_STORE_ALREADY_PUBLISHED),
        _ => false,
    }
}
