use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;

use crate::error::{ClaimError, Result};
use crate::units::gwei_to_wei;

pub const DEFAULT_RPC_URL: &str = "https://carrot.megaeth.com/rpc";
pub const DEFAULT_CHAIN_ID: u64 = 6342;
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://www.oklink.com/megaeth-testnet/tx/{hash}";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub gas: GasConfig,
    pub claim: ClaimConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Block explorer transaction URL, `{hash}` is replaced by the tx hash
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
}

fn default_explorer_tx_url() -> String {
    DEFAULT_EXPLORER_TX_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Legacy gas price in gwei
    pub gas_price_gwei: Decimal,
    /// Gas limit per candidate transaction
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimConfig {
    /// Target contract (prompted for when absent)
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Minimum native balance required before any attempt
    pub min_balance_eth: Decimal,
    /// Pause between consecutive candidate attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How long to wait for a receipt before giving up on a candidate
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Block confirmations required for a receipt to count
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_confirmations() -> u64 {
    1
}

impl ClaimConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration with a specific config file
    pub fn load_from<P: AsRef<Path>>(config_file: P) -> std::result::Result<Self, ConfigError> {
        // A missing .env is fine, the variables may come from the real environment
        let _ = dotenvy::dotenv();

        let builder = Self::defaults()?
            .add_source(File::from(config_file.as_ref()).required(false))
            // Override with environment variables (MEGACLAIM__GAS__GAS_LIMIT, etc.)
            .add_source(
                Environment::with_prefix("MEGACLAIM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Conventional names used by wallet tooling
            .set_override_option("network.rpc_url", non_empty_env("RPC_URL"))?
            .set_override_option("claim.contract_address", non_empty_env("CONTRACT_ADDRESS"))?;

        builder.build()?.try_deserialize()
    }

    fn defaults() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("network.rpc_url", DEFAULT_RPC_URL)?
            .set_default("network.chain_id", DEFAULT_CHAIN_ID)?
            .set_default("network.explorer_tx_url", DEFAULT_EXPLORER_TX_URL)?
            .set_default("gas.gas_price_gwei", "0.001")?
            .set_default("gas.gas_limit", 300_000)?
            .set_default("claim.min_balance_eth", "0.001")?
            .set_default("claim.retry_delay_ms", 2000)?
            .set_default("claim.confirmation_timeout_secs", 120)?
            .set_default("claim.confirmations", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Create a default configuration for CLI usage
    pub fn default_config() -> Self {
        use rust_decimal_macros::dec;

        Self {
            network: NetworkConfig {
                rpc_url: DEFAULT_RPC_URL.to_string(),
                chain_id: DEFAULT_CHAIN_ID,
                explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
            },
            gas: GasConfig {
                gas_price_gwei: dec!(0.001),
                gas_limit: 300_000,
            },
            claim: ClaimConfig {
                contract_address: None,
                min_balance_eth: dec!(0.001),
                retry_delay_ms: default_retry_delay_ms(),
                confirmation_timeout_secs: default_confirmation_timeout_secs(),
                confirmations: default_confirmations(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match url::Url::parse(&self.network.rpc_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "rpc_url must be http(s), got scheme '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("rpc_url is not a valid URL: {}", e)),
        }

        if self.network.chain_id == 0 {
            errors.push("chain_id must be non-zero".to_string());
        }

        if !self.network.explorer_tx_url.contains("{hash}") {
            errors.push("explorer_tx_url must contain a {hash} placeholder".to_string());
        }

        match gwei_to_wei(self.gas.gas_price_gwei) {
            Ok(wei) if wei > 0 => {}
            Ok(_) => errors.push(format!(
                "gas_price_gwei {} is below 1 wei",
                self.gas.gas_price_gwei
            )),
            Err(e) => errors.push(format!("gas_price_gwei is invalid: {}", e)),
        }

        if self.gas.gas_limit < 21_000 {
            errors.push("gas_limit must be at least 21000".to_string());
        }

        if self.claim.min_balance_eth.is_sign_negative() {
            errors.push("min_balance_eth must not be negative".to_string());
        }

        if self.claim.confirmations == 0 {
            errors.push("confirmations must be at least 1".to_string());
        }

        if let Some(addr) = &self.claim.contract_address {
            if let Err(e) = parse_contract_address(addr) {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Substitute `{hash}` in an explorer URL template
pub fn explorer_link(template: &str, tx_hash: &str) -> String {
    template.replace("{hash}", tx_hash)
}

/// Parse a `0x`-prefixed 20-byte hex contract address
pub fn parse_contract_address(raw: &str) -> Result<Address> {
    let trimmed = raw.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ClaimError::InvalidAddress(format!("'{}' must start with 0x", trimmed)))?;

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClaimError::InvalidAddress(format!(
            "'{}' is not a 20-byte hex address",
            trimmed
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| ClaimError::InvalidAddress(format!("'{}': {}", trimmed, e)))?;
    Ok(Address::from_slice(&bytes))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.claim.retry_delay(), Duration::from_millis(2000));
        assert_eq!(config.network.chain_id, 6342);
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = AppConfig::default_config();
        config.network.rpc_url = "ftp://example.org".to_string();
        config.gas.gas_price_gwei = dec!(0);
        config.gas.gas_limit = 1000;
        config.claim.contract_address = Some("0x1234".to_string());

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].contains("http(s)"));
    }

    #[test]
    fn test_validate_rejects_sub_wei_gas_price() {
        let mut config = AppConfig::default_config();
        config.gas.gas_price_gwei = dec!(0.0000000001);

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("below 1 wei"));

        config.gas.gas_price_gwei = dec!(0.000000001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_contract_address() {
        let addr = parse_contract_address(" 0x5FbDB2315678afecb367f032d93F642f64180aa3 ").unwrap();
        assert_eq!(
            hex::encode(addr.as_slice()),
            "5fbdb2315678afecb367f032d93f642f64180aa3"
        );

        assert!(parse_contract_address("5FbDB2315678afecb367f032d93F642f64180aa3").is_err());
        assert!(parse_contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa").is_err());
        assert!(parse_contract_address("0xzzbDB2315678afecb367f032d93F642f64180aa3").is_err());
        assert!(parse_contract_address("").is_err());
    }

    #[test]
    fn test_explorer_link() {
        let config = AppConfig::default_config();
        assert_eq!(
            explorer_link(&config.network.explorer_tx_url, "0xabc"),
            "https://www.oklink.com/megaeth-testnet/tx/0xabc"
        );
    }
}
