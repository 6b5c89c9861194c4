//! Claim orchestration
//!
//! Gates the run on the signer's balance, then walks the candidate catalog in order
//! and stops at the first call that confirms on-chain.

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::catalog;
use crate::config::AppConfig;
use crate::console::StatusSink;
use crate::error::{ClaimError, Result};
use crate::submitter::{ChainClient, Confirmation, SubmissionOutcome, Submitter};
use crate::units::{eth_to_wei, wei_to_eth};

/// Phases of one orchestration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Init,
    CheckingBalance,
    /// Not enough native balance for gas
    Aborted,
    /// Candidates are being attempted
    Trialing,
    Success,
    /// Every candidate failed
    Exhausted,
    Done,
    /// Unrecovered error, reachable from any phase
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Init => "INIT",
            RunPhase::CheckingBalance => "CHECKING_BALANCE",
            RunPhase::Aborted => "ABORTED",
            RunPhase::Trialing => "TRIALING",
            RunPhase::Success => "SUCCESS",
            RunPhase::Exhausted => "EXHAUSTED",
            RunPhase::Done => "DONE",
            RunPhase::Failed => "FAILED",
        }
    }

    /// Check if this phase can transition to another phase
    pub fn can_transition_to(&self, target: RunPhase) -> bool {
        use RunPhase::*;

        match (self, target) {
            (_, Failed) => true,
            (Init, CheckingBalance) => true,
            (CheckingBalance, Aborted) | (CheckingBalance, Trialing) => true,
            (Trialing, Success) | (Trialing, Exhausted) => true,
            (Aborted, Done) | (Success, Done) | (Exhausted, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final state of one orchestration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Success {
        method: String,
        confirmation: Confirmation,
    },
    ExhaustedAllMethods {
        attempts: usize,
    },
    AbortedInsufficientFunds {
        balance_wei: U256,
        required_wei: U256,
    },
    FatalError(String),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success { .. })
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> u8 {
        match self {
            RunResult::Success { .. } => 0,
            RunResult::FatalError(_) => 1,
            RunResult::ExhaustedAllMethods { .. } => 2,
            RunResult::AbortedInsufficientFunds { .. } => 3,
        }
    }
}

/// Outcome of the pre-run balance check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceCheck {
    pub balance_wei: U256,
    pub required_wei: U256,
}

impl BalanceCheck {
    pub fn is_sufficient(&self) -> bool {
        self.balance_wei >= self.required_wei
    }

    pub fn balance_eth(&self) -> Decimal {
        wei_to_eth(self.balance_wei)
    }

    pub fn required_eth(&self) -> Decimal {
        wei_to_eth(self.required_wei)
    }

    pub fn ensure_sufficient(&self) -> Result<()> {
        if self.is_sufficient() {
            Ok(())
        } else {
            Err(ClaimError::InsufficientFunds {
                balance_wei: self.balance_wei.to_string(),
                required_wei: self.required_wei.to_string(),
            })
        }
    }
}

/// Run-level parameters
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Minimum native balance before any attempt
    pub min_balance_wei: U256,
    /// Pause between consecutive attempts
    pub retry_delay: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            min_balance_wei: eth_to_wei(config.claim.min_balance_eth)?,
            retry_delay: config.claim.retry_delay(),
        })
    }
}

/// Drives one claim run from balance check to terminal result
pub struct ClaimOrchestrator<C: ChainClient> {
    submitter: Submitter<C>,
    settings: OrchestratorSettings,
    sink: Arc<dyn StatusSink>,
    phase: RunPhase,
}

impl<C: ChainClient> ClaimOrchestrator<C> {
    pub fn new(
        submitter: Submitter<C>,
        settings: OrchestratorSettings,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            submitter,
            settings,
            sink,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, target: RunPhase) -> Result<()> {
        if !self.phase.can_transition_to(target) {
            return Err(ClaimError::InvalidStateTransition {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }
        debug!("Run phase {} -> {}", self.phase, target);
        self.phase = target;
        Ok(())
    }

    /// Compare the signer's balance with the configured minimum
    pub async fn check_balance(&self) -> Result<BalanceCheck> {
        let balance_wei = self.submitter.client().balance().await?;
        let check = BalanceCheck {
            balance_wei,
            required_wei: self.settings.min_balance_wei,
        };
        debug!(
            "Balance check: {} wei (minimum {} wei)",
            check.balance_wei, check.required_wei
        );
        Ok(check)
    }

    /// Run the whole claim flow. Errors end up in [`RunResult::FatalError`].
    pub async fn run(&mut self) -> RunResult {
        self.phase = RunPhase::Init;

        match self.execute().await {
            Ok(result) => {
                if let Err(e) = self.transition(RunPhase::Done) {
                    error!("{}", e);
                }
                result
            }
            Err(e) => {
                self.phase = RunPhase::Failed;
                error!("Claim run failed: {}", e);
                self.sink.error(&format!("Fatal error: {}", e));
                RunResult::FatalError(e.to_string())
            }
        }
    }

    async fn execute(&mut self) -> Result<RunResult> {
        let wallet = self.submitter.client().address();
        let contract: Address = self.submitter.settings().contract;

        info!("Starting claim run: wallet={} contract={}", wallet, contract);
        self.sink.info(&format!("Wallet: {}", wallet));
        self.sink.info(&format!("Contract: {}", contract));

        self.transition(RunPhase::CheckingBalance)?;
        let check = self.check_balance().await?;
        self.sink
            .info(&format!("Balance: {} ETH", check.balance_eth()));

        if let Err(e) = check.ensure_sufficient() {
            self.transition(RunPhase::Aborted)?;
            info!("{}", e);
            self.sink.error(&format!(
                "Insufficient balance: {} ETH, need at least {} ETH",
                check.balance_eth(),
                check.required_eth()
            ));
            return Ok(RunResult::AbortedInsufficientFunds {
                balance_wei: check.balance_wei,
                required_wei: check.required_wei,
            });
        }

        self.transition(RunPhase::Trialing)?;
        let methods = catalog::all_methods(wallet);
        let total = methods.len();
        self.sink
            .info(&format!("Trying {} claim methods...", total));

        for (index, call) in methods.iter().enumerate() {
            debug!(
                "Attempt {}/{}: {} ({} tier, selector 0x{})",
                index + 1,
                total,
                call.name,
                call.tier,
                hex::encode(call.selector())
            );

            match self.submitter.try_method(call).await {
                SubmissionOutcome::Confirmed(confirmation) => {
                    self.transition(RunPhase::Success)?;
                    self.sink
                        .success(&format!("Claim succeeded with {}", call.name));
                    return Ok(RunResult::Success {
                        method: call.name.clone(),
                        confirmation,
                    });
                }
                SubmissionOutcome::Reverted { .. } | SubmissionOutcome::SubmissionError(_) => {
                    if index + 1 < total {
                        self.sink.info(&format!(
                            "Waiting {}ms before next method...",
                            self.settings.retry_delay.as_millis()
                        ));
                        tokio::time::sleep(self.settings.retry_delay).await;
                    }
                }
            }
        }

        self.transition(RunPhase::Exhausted)?;
        self.sink.error("All claim methods failed");
        Ok(RunResult::ExhaustedAllMethods { attempts: total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CLAIM_SELECTOR, COMPLEX_CLAIM_SELECTOR, MINT_SELECTOR};
    use crate::console::{MemorySink, StatusTag};
    use crate::submitter::{CallRequest, ClaimReceipt, MockChainClient, SubmitterSettings};
    use alloy::primitives::{address, B256};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CALLER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const CONTRACT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    fn receipt(success: bool) -> ClaimReceipt {
        ClaimReceipt {
            tx_hash: B256::repeat_byte(0x11),
            success,
            gas_used: 21_000,
            effective_gas_price: 100_000_000_000,
            log_count: 1,
            block_number: Some(7),
        }
    }

    fn selector_of(request: &CallRequest) -> [u8; 4] {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&request.input[..4]);
        selector
    }

    fn orchestrator(
        mock: MockChainClient,
    ) -> (ClaimOrchestrator<MockChainClient>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let submitter_settings = SubmitterSettings {
            contract: CONTRACT,
            chain_id: 6342,
            gas_price_wei: 100_000_000_000,
            gas_limit: 300_000,
            confirmations: 1,
            confirmation_timeout: Duration::from_secs(120),
            explorer_tx_url: "https://explorer.test/tx/{hash}".to_string(),
        };
        let submitter = Submitter::new(Arc::new(mock), submitter_settings, sink.clone());
        let settings = OrchestratorSettings {
            min_balance_wei: U256::from(ONE_ETH / 1000),
            retry_delay: Duration::from_millis(2000),
        };
        (ClaimOrchestrator::new(submitter, settings, sink.clone()), sink)
    }

    fn funded_mock() -> MockChainClient {
        let mut mock = MockChainClient::new();
        mock.expect_address().return_const(CALLER);
        mock.expect_balance().returning(|| Ok(U256::from(ONE_ETH)));
        mock
    }

    #[test]
    fn test_phase_transitions() {
        use RunPhase::*;

        assert!(Init.can_transition_to(CheckingBalance));
        assert!(CheckingBalance.can_transition_to(Aborted));
        assert!(CheckingBalance.can_transition_to(Trialing));
        assert!(Trialing.can_transition_to(Success));
        assert!(Trialing.can_transition_to(Exhausted));
        assert!(Exhausted.can_transition_to(Done));
        assert!(Trialing.can_transition_to(Failed));

        assert!(!Init.can_transition_to(Trialing));
        assert!(!Aborted.can_transition_to(Trialing));
        assert!(!Success.can_transition_to(Trialing));
        assert!(!Done.can_transition_to(Init));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunResult::ExhaustedAllMethods { attempts: 5 }.exit_code(), 2);
        assert_eq!(RunResult::FatalError("rpc down".into()).exit_code(), 1);
        assert_eq!(
            RunResult::AbortedInsufficientFunds {
                balance_wei: U256::ZERO,
                required_wei: U256::from(1u64),
            }
            .exit_code(),
            3
        );
    }

    #[test]
    fn test_settings_from_config() {
        let settings = OrchestratorSettings::from_config(&AppConfig::default_config()).unwrap();
        assert_eq!(settings.min_balance_wei, U256::from(ONE_ETH / 1000));
        assert_eq!(settings.retry_delay, Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_insufficient_balance_aborts_without_submitting() {
        let mut mock = MockChainClient::new();
        mock.expect_address().return_const(CALLER);
        mock.expect_balance()
            .returning(|| Ok(U256::from(ONE_ETH / 10_000)));
        mock.expect_send_call().never();
        let (mut orchestrator, sink) = orchestrator(mock);

        let check = orchestrator.check_balance().await.unwrap();
        assert!(!check.is_sufficient());
        assert_eq!(check.balance_eth(), dec!(0.0001));

        let result = orchestrator.run().await;
        assert_eq!(
            result,
            RunResult::AbortedInsufficientFunds {
                balance_wei: U256::from(ONE_ETH / 10_000),
                required_wei: U256::from(ONE_ETH / 1000),
            }
        );
        assert_eq!(orchestrator.phase(), RunPhase::Done);
        assert!(sink.contains(StatusTag::Error, "Insufficient balance"));
    }

    #[tokio::test]
    async fn test_balance_exactly_at_minimum_is_sufficient() {
        let mut mock = MockChainClient::new();
        mock.expect_address().return_const(CALLER);
        mock.expect_balance()
            .returning(|| Ok(U256::from(ONE_ETH / 1000)));
        mock.expect_send_call()
            .times(1)
            .returning(|_| Ok(receipt(true)));
        let (mut orchestrator, _) = orchestrator(mock);

        assert!(orchestrator.run().await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_confirmation() {
        let mut mock = funded_mock();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        mock.expect_send_call().times(3).returning(move |request| {
            let attempt = seen.fetch_add(1, Ordering::SeqCst);
            match selector_of(&request) {
                s if s == CLAIM_SELECTOR => Ok(receipt(true)),
                s if s == MINT_SELECTOR => Ok(receipt(false)),
                _ => Err(ClaimError::Network(format!("attempt {} rejected", attempt))),
            }
        });
        let (mut orchestrator, sink) = orchestrator(mock);

        let start = tokio::time::Instant::now();
        let result = orchestrator.run().await;

        match result {
            RunResult::Success {
                method,
                confirmation,
            } => {
                assert_eq!(method, "claim(1)");
                assert_eq!(confirmation.cost_eth, dec!(0.0021));
                assert_eq!(confirmation.event_count, 1);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
        assert_eq!(orchestrator.phase(), RunPhase::Done);
        assert!(sink.contains(StatusTag::Success, "Claim succeeded with claim(1)"));
        assert!(!sink.contains(StatusTag::Info, "Trying publicClaim"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_reverted_exhausts_with_paced_attempts() {
        let mut mock = funded_mock();
        let attempted = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = attempted.clone();
        mock.expect_send_call().times(5).returning(move |request| {
            log.lock().unwrap().push(selector_of(&request));
            Ok(receipt(false))
        });
        let (mut orchestrator, sink) = orchestrator(mock);

        let start = tokio::time::Instant::now();
        let result = orchestrator.run().await;

        assert_eq!(result, RunResult::ExhaustedAllMethods { attempts: 5 });
        // four pauses between five attempts, none after the last
        assert_eq!(start.elapsed(), Duration::from_millis(8000));

        let expected: Vec<[u8; 4]> = catalog::all_methods(CALLER)
            .iter()
            .map(|c| c.selector())
            .collect();
        assert_eq!(*attempted.lock().unwrap(), expected);
        assert_eq!(orchestrator.phase(), RunPhase::Done);
        assert!(sink.contains(StatusTag::Error, "All claim methods failed"));
        assert_eq!(
            sink.lines()
                .iter()
                .filter(|(_, line)| line.starts_with("Waiting 2000ms"))
                .count(),
            4
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_error_does_not_abort_loop() {
        let mut mock = funded_mock();
        mock.expect_send_call()
            .times(5)
            .returning(|request| {
                if selector_of(&request) == COMPLEX_CLAIM_SELECTOR {
                    Ok(receipt(true))
                } else {
                    Err(ClaimError::Timeout("no receipt after 120s".into()))
                }
            });
        let (mut orchestrator, sink) = orchestrator(mock);

        let result = orchestrator.run().await;
        match result {
            RunResult::Success { method, .. } => assert_eq!(method, "complexClaim"),
            other => panic!("expected success, got {:?}", other),
        }
        assert!(sink.contains(StatusTag::Error, "mint() failed"));
        assert!(sink.contains(StatusTag::Link, "https://explorer.test/tx/0x1111"));
    }

    #[tokio::test]
    async fn test_balance_failure_is_fatal() {
        let mut mock = MockChainClient::new();
        mock.expect_address().return_const(CALLER);
        mock.expect_balance()
            .returning(|| Err(ClaimError::Network("connection refused".into())));
        mock.expect_send_call().never();
        let (mut orchestrator, sink) = orchestrator(mock);

        let result = orchestrator.run().await;
        match result {
            RunResult::FatalError(reason) => assert!(reason.contains("connection refused")),
            other => panic!("expected fatal error, got {:?}", other),
        }
        assert_eq!(orchestrator.phase(), RunPhase::Failed);
        assert!(sink.contains(StatusTag::Error, "Fatal error"));
    }

    #[tokio::test]
    async fn test_orchestrator_can_run_twice() {
        let mut mock = funded_mock();
        mock.expect_send_call()
            .times(2)
            .returning(|_| Ok(receipt(true)));
        let (mut orchestrator, _) = orchestrator(mock);

        assert!(orchestrator.run().await.is_success());
        assert!(orchestrator.run().await.is_success());
    }
}
