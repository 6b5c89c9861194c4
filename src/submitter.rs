//! Single-transaction submission
//!
//! Sends one candidate call to the target contract, waits for its receipt and
//! classifies the result. Failures are reported as a [`SubmissionOutcome`] so one
//! bad candidate never ends the trial sequence.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{
    DynProvider, PendingTransactionError, Provider, ProviderBuilder, WatchTxError,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::catalog::CandidateCall;
use crate::config::{explorer_link, AppConfig};
use crate::console::StatusSink;
use crate::error::{ClaimError, Result};
use crate::signing::Wallet;
use crate::units::{gas_cost_eth, gwei_to_wei};

/// Fully specified transaction for one candidate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub chain_id: u64,
    pub gas_price_wei: u128,
    pub gas_limit: u64,
    pub confirmations: u64,
    pub timeout: Duration,
}

/// Receipt fields the claim flow cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub tx_hash: B256,
    /// Receipt status 1
    pub success: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub log_count: usize,
    pub block_number: Option<u64>,
}

/// A confirmed, successful candidate transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: B256,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    /// Fee in ether, six decimals
    pub cost_eth: Decimal,
    pub event_count: usize,
    pub block_number: Option<u64>,
}

impl Confirmation {
    pub fn from_receipt(receipt: &ClaimReceipt) -> Self {
        Self {
            tx_hash: receipt.tx_hash,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            cost_eth: gas_cost_eth(receipt.gas_used, receipt.effective_gas_price),
            event_count: receipt.log_count,
            block_number: receipt.block_number,
        }
    }
}

/// Result of attempting one candidate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Confirmed(Confirmation),
    Reverted { tx_hash: B256, gas_used: u64 },
    SubmissionError(String),
}

impl SubmissionOutcome {
    /// Classify a mined receipt by its status
    pub fn from_receipt(receipt: &ClaimReceipt) -> Self {
        if receipt.success {
            SubmissionOutcome::Confirmed(Confirmation::from_receipt(receipt))
        } else {
            SubmissionOutcome::Reverted {
                tx_hash: receipt.tx_hash,
                gas_used: receipt.gas_used,
            }
        }
    }
}

/// Network access used by the claim flow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing account
    fn address(&self) -> Address;

    /// Native balance of the signing account, in wei
    async fn balance(&self) -> Result<U256>;

    /// Sign, broadcast and wait for the receipt of one transaction
    async fn send_call(&self, request: CallRequest) -> Result<ClaimReceipt>;
}

/// alloy HTTP provider with the wallet attached
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
    address: Address,
}

impl AlloyChainClient {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn connect(rpc_url: &str, wallet: &Wallet) -> Result<Self> {
        let url = rpc_url.parse().map_err(|e| {
            ClaimError::InvalidConfig(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url);
        debug!(
            "Connected to {} as {} (chain {})",
            rpc_url,
            wallet.address(),
            wallet.chain_id()
        );

        Ok(Self::new(DynProvider::new(provider), wallet.address()))
    }
}

/// Legacy-priced envelope; only the nonce is left for the provider to fill
fn transaction_request(from: Address, request: &CallRequest) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_to(request.to)
        .with_input(request.input.clone())
        .with_value(request.value)
        .with_chain_id(request.chain_id)
        .with_gas_price(request.gas_price_wei)
        .with_gas_limit(request.gas_limit)
}

fn confirmation_error(
    err: PendingTransactionError,
    tx_hash: B256,
    timeout: Duration,
) -> ClaimError {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => ClaimError::Timeout(format!(
            "no receipt for {:?} after {}s",
            tx_hash,
            timeout.as_secs()
        )),
        other => {
            ClaimError::Network(format!("Tx confirmation failed for {:?}: {}", tx_hash, other))
        }
    }
}

fn claim_receipt(receipt: &TransactionReceipt) -> ClaimReceipt {
    ClaimReceipt {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
        log_count: receipt.inner.logs().len(),
        block_number: receipt.block_number,
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| ClaimError::Network(format!("Failed to read wallet balance: {}", e)))
    }

    async fn send_call(&self, request: CallRequest) -> Result<ClaimReceipt> {
        let pending = self
            .provider
            .send_transaction(transaction_request(self.address, &request))
            .await
            .map_err(|e| ClaimError::Network(format!("Broadcast failed: {}", e)))?;
        let tx_hash = *pending.tx_hash();
        debug!("Broadcast {:?}, waiting for {} confirmation(s)", tx_hash, request.confirmations);

        let receipt = pending
            .with_required_confirmations(request.confirmations)
            .with_timeout(Some(request.timeout))
            .get_receipt()
            .await
            .map_err(|e| confirmation_error(e, tx_hash, request.timeout))?;

        Ok(claim_receipt(&receipt))
    }
}

/// Static transaction parameters shared by every attempt
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub contract: Address,
    pub chain_id: u64,
    pub gas_price_wei: u128,
    pub gas_limit: u64,
    pub confirmations: u64,
    pub confirmation_timeout: Duration,
    pub explorer_tx_url: String,
}

impl SubmitterSettings {
    pub fn from_config(config: &AppConfig, contract: Address) -> Result<Self> {
        Ok(Self {
            contract,
            chain_id: config.network.chain_id,
            gas_price_wei: gwei_to_wei(config.gas.gas_price_gwei)?,
            gas_limit: config.gas.gas_limit,
            confirmations: config.claim.confirmations,
            confirmation_timeout: config.claim.confirmation_timeout(),
            explorer_tx_url: config.network.explorer_tx_url.clone(),
        })
    }
}

/// Submits candidate calls one at a time
pub struct Submitter<C: ChainClient> {
    client: Arc<C>,
    settings: SubmitterSettings,
    sink: Arc<dyn StatusSink>,
}

impl<C: ChainClient> Submitter<C> {
    pub fn new(client: Arc<C>, settings: SubmitterSettings, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            client,
            settings,
            sink,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }

    /// Transaction envelope for `call`: zero value, configured gas and chain
    pub fn request_for(&self, call: &CandidateCall) -> CallRequest {
        CallRequest {
            to: self.settings.contract,
            input: call.payload.clone(),
            value: U256::ZERO,
            chain_id: self.settings.chain_id,
            gas_price_wei: self.settings.gas_price_wei,
            gas_limit: self.settings.gas_limit,
            confirmations: self.settings.confirmations,
            timeout: self.settings.confirmation_timeout,
        }
    }

    /// Send `call` and wait for its receipt. Errors are returned, not swallowed.
    pub async fn submit(&self, call: &CandidateCall) -> Result<ClaimReceipt> {
        self.client.send_call(self.request_for(call)).await
    }

    /// Attempt `call` and report how it ended. Never fails.
    #[instrument(skip(self, call), fields(method = %call.name))]
    pub async fn try_method(&self, call: &CandidateCall) -> SubmissionOutcome {
        self.sink.info(&format!("Trying {}...", call.name));

        let outcome = match self.submit(call).await {
            Ok(receipt) => SubmissionOutcome::from_receipt(&receipt),
            Err(e) => {
                if !e.is_attempt_scoped() {
                    warn!("Unexpected error class while trying {}: {}", call.name, e);
                }
                SubmissionOutcome::SubmissionError(e.to_string())
            }
        };

        match &outcome {
            SubmissionOutcome::Confirmed(confirmation) => {
                let hash = format!("{:?}", confirmation.tx_hash);
                debug!("{} confirmed in tx {}", call.name, hash);
                self.sink.success(&format!("{} succeeded!", call.name));
                self.sink.gas(&format!(
                    "Gas used: {} | Cost: {} ETH",
                    confirmation.gas_used, confirmation.cost_eth
                ));
                self.sink
                    .info(&format!("Events emitted: {}", confirmation.event_count));
                self.sink
                    .link(&explorer_link(&self.settings.explorer_tx_url, &hash));
            }
            SubmissionOutcome::Reverted { tx_hash, gas_used } => {
                let hash = format!("{:?}", tx_hash);
                debug!("{} reverted in tx {} ({} gas)", call.name, hash, gas_used);
                self.sink
                    .error(&format!("{} failed: transaction reverted", call.name));
                self.sink
                    .link(&explorer_link(&self.settings.explorer_tx_url, &hash));
            }
            SubmissionOutcome::SubmissionError(reason) => {
                debug!("{} submission error: {}", call.name, reason);
                self.sink.error(&format!("{} failed: {}", call.name, reason));
            }
        }

        outcome
    }
}
