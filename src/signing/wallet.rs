use crate::error::{ClaimError, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use tracing::info;
use zeroize::Zeroize;

/// Environment variables checked, in order, for the signing key
pub const PRIVATE_KEY_ENV_VARS: [&str; 2] = ["MEGACLAIM_PRIVATE_KEY", "PRIVATE_KEY"];

/// Wallet holding the key that signs every candidate transaction
///
/// # Security
/// The private key string is zeroized right after the signer is built and is never
/// stored in the Wallet struct.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a private key hex string (with or without `0x`)
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self> {
        let mut secure_key = private_key.trim().trim_start_matches("0x").to_string();

        let parsed = secure_key.parse::<PrivateKeySigner>();
        secure_key.zeroize();

        let signer = parsed
            .map_err(|e| ClaimError::Wallet(format!("Invalid private key: {}", e)))?
            .with_chain_id(Some(chain_id));

        info!("Wallet initialized: {} (private key zeroized from memory)", signer.address());

        Ok(Self { signer, chain_id })
    }

    /// Create a wallet from the environment
    pub fn from_env(chain_id: u64) -> Result<Self> {
        let mut private_key = PRIVATE_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                ClaimError::MissingConfig(format!(
                    "{} environment variable not set",
                    PRIVATE_KEY_ENV_VARS.join(" or ")
                ))
            })?;

        let result = Self::from_private_key(&private_key, chain_id);
        private_key.zeroize();

        result
    }

    /// Get the wallet address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Network wallet for an alloy provider
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (DO NOT use in production!)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::from_private_key(TEST_KEY, 6342).unwrap();

        assert_eq!(wallet.chain_id(), 6342);
        assert_eq!(
            format!("{:?}", wallet.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_accepts_unprefixed_key() {
        let wallet = Wallet::from_private_key(&TEST_KEY[2..], 1).unwrap();
        assert_eq!(
            hex::encode(wallet.address().as_slice()),
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = Wallet::from_private_key("0xnotakey", 1).unwrap_err();
        assert!(matches!(err, ClaimError::Wallet(_)));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let wallet = Wallet::from_private_key(TEST_KEY, 6342).unwrap();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains("ac0974bec39a17e3"));
        assert!(debug.contains("chain_id"));
    }
}
