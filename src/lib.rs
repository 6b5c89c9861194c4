pub mod catalog;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod signing;
pub mod submitter;
pub mod units;

pub use catalog::{
    all_methods, build_complex_call, build_public_claim_call, CallTier, CandidateCall,
};
pub use config::AppConfig;
pub use console::{ConsoleSink, MemorySink, StatusSink, StatusTag};
pub use error::{ClaimError, Result};
pub use orchestrator::{BalanceCheck, ClaimOrchestrator, OrchestratorSettings, RunPhase, RunResult};
pub use signing::Wallet;
pub use submitter::{
    AlloyChainClient, CallRequest, ChainClient, ClaimReceipt, Confirmation, SubmissionOutcome,
    Submitter, SubmitterSettings,
};
