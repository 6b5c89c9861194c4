use clap::{Parser, Subcommand};

use crate::catalog::CandidateCall;

#[derive(Parser, Debug)]
#[command(name = "megaclaim")]
#[command(version = "0.1.0")]
#[command(about = "Try claim/mint entry points on a contract until one succeeds", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Try every candidate method against the contract (default)
    Run {
        /// Target contract address (prompted for when not configured)
        #[arg(long, env = "CONTRACT_ADDRESS")]
        contract: Option<String>,
    },
    /// Print the candidate calls for an address without sending anything
    Methods {
        /// Caller address embedded in the payloads (defaults to the configured wallet)
        #[arg(long)]
        address: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the signer's address and native balance
    Balance,
}

/// One display row per candidate call
pub fn format_methods(calls: &[CandidateCall]) -> Vec<String> {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            format!(
                "{}. {:<13} [{}] {}",
                i + 1,
                call.name,
                call.tier,
                call.payload_hex()
            )
        })
        .collect()
}

/// Candidate calls as a JSON array
pub fn methods_json(calls: &[CandidateCall]) -> serde_json::Value {
    serde_json::Value::Array(
        calls
            .iter()
            .map(|call| {
                serde_json::json!({
                    "name": call.name,
                    "tier": call.tier.as_str(),
                    "selector": format!("0x{}", hex::encode(call.selector())),
                    "payload": call.payload_hex(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::all_methods;
    use alloy::primitives::Address;

    #[test]
    fn test_parse_run_with_contract() {
        let cli = Cli::try_parse_from([
            "megaclaim",
            "run",
            "--contract",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run { contract }) => assert!(contract.is_some()),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, "config/default.toml");
    }

    #[test]
    fn test_parse_no_subcommand() {
        let cli = Cli::try_parse_from(["megaclaim", "--config", "claim.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "claim.toml");
    }

    #[test]
    fn test_format_methods() {
        let rows = format_methods(&all_methods(Address::ZERO));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "1. mint()        [standard] 0x1249c58b");
        assert!(rows[4].starts_with("5. complexClaim  [complex] 0x84bb1e42"));
    }

    #[test]
    fn test_methods_json() {
        let value = methods_json(&all_methods(Address::ZERO));
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[1]["name"], "freeMint()");
        assert_eq!(items[1]["tier"], "standard");
        assert_eq!(items[2]["selector"], "0x379607f5");
        assert_eq!(items[0]["payload"], "0x1249c58b");
    }
}
