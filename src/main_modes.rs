use megaclaim::catalog::all_methods;
use megaclaim::cli::{format_methods, methods_json};
use megaclaim::config::{parse_contract_address, AppConfig};
use megaclaim::console::{ConsoleSink, StatusSink};
use megaclaim::error::{ClaimError, Result};
use megaclaim::orchestrator::{ClaimOrchestrator, OrchestratorSettings, RunResult};
use megaclaim::prompt::prompt_contract_address;
use megaclaim::signing::Wallet;
use megaclaim::submitter::{AlloyChainClient, ChainClient, Submitter, SubmitterSettings};
use megaclaim::units::wei_to_eth;
use std::sync::Arc;
use tracing::info;

/// Run the claim flow once and return the process exit code
pub async fn run_claim(config: AppConfig, contract: Option<String>) -> Result<u8> {
    let sink: Arc<dyn StatusSink> = Arc::new(ConsoleSink::detect());

    let wallet = Wallet::from_env(config.network.chain_id)?;

    let contract = match contract
        .filter(|c| !c.trim().is_empty())
        .or_else(|| config.claim.contract_address.clone())
    {
        Some(raw) => parse_contract_address(&raw)?,
        None => tokio::task::spawn_blocking(prompt_contract_address)
            .await
            .map_err(|e| ClaimError::Internal(format!("address prompt failed: {}", e)))??,
    };

    info!(
        "Claiming on chain {} via {}",
        config.network.chain_id, config.network.rpc_url
    );

    let client = Arc::new(AlloyChainClient::connect(&config.network.rpc_url, &wallet)?);
    let submitter = Submitter::new(
        client,
        SubmitterSettings::from_config(&config, contract)?,
        sink.clone(),
    );
    let mut orchestrator = ClaimOrchestrator::new(
        submitter,
        OrchestratorSettings::from_config(&config)?,
        sink.clone(),
    );

    let result = orchestrator.run().await;
    report(sink.as_ref(), &result);
    Ok(result.exit_code())
}

fn report(sink: &dyn StatusSink, result: &RunResult) {
    match result {
        RunResult::Success {
            method,
            confirmation,
        } => sink.success(&format!(
            "Done: {} confirmed in block {} (cost {} ETH)",
            method,
            confirmation
                .block_number
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string()),
            confirmation.cost_eth
        )),
        RunResult::ExhaustedAllMethods { attempts } => sink.warn(&format!(
            "Done: none of the {} methods succeeded. The contract may not be claimable by this wallet.",
            attempts
        )),
        RunResult::AbortedInsufficientFunds { required_wei, .. } => sink.warn(&format!(
            "Done: top up at least {} ETH and run again",
            wei_to_eth(*required_wei)
        )),
        RunResult::FatalError(reason) => sink.error(&format!("Done: run aborted: {}", reason)),
    }
}

/// Print the candidate calls for an address
pub fn show_methods(config: &AppConfig, address: Option<&str>, json: bool) -> Result<u8> {
    let caller = match address {
        Some(raw) => parse_contract_address(raw)?,
        None => Wallet::from_env(config.network.chain_id)?.address(),
    };
    let calls = all_methods(caller);

    if json {
        let rendered = serde_json::to_string_pretty(&methods_json(&calls))
            .map_err(|e| ClaimError::Internal(format!("JSON encoding failed: {}", e)))?;
        println!("{rendered}");
        return Ok(0);
    }

    println!("Candidate calls for {}:", caller);
    for row in format_methods(&calls) {
        println!("  {}", row);
    }
    Ok(0)
}

/// Print the signer's address and balance
pub async fn show_balance(config: &AppConfig) -> Result<u8> {
    let wallet = Wallet::from_env(config.network.chain_id)?;
    let client = AlloyChainClient::connect(&config.network.rpc_url, &wallet)?;

    let balance = client.balance().await?;
    println!("Address: {}", wallet.address());
    println!("Balance: {} ETH", wei_to_eth(balance));
    println!("Minimum: {} ETH", config.claim.min_balance_eth);
    Ok(0)
}
