use thiserror::Error;

/// Main error type for the claim bot
#[derive(Error, Debug)]
pub enum ClaimError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Crypto/signing errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    // Precondition errors
    #[error("Insufficient funds: balance {balance_wei} wei, need at least {required_wei} wei")]
    InsufficientFunds {
        balance_wei: String,
        required_wei: String,
    },

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Confirmation timeout: {0}")]
    Timeout(String),

    // State machine errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ClaimError
pub type Result<T> = std::result::Result<T, ClaimError>;

impl ClaimError {
    /// Whether this error is confined to a single candidate attempt.
    ///
    /// Attempt-scoped errors are downgraded to a submission outcome and the trial
    /// sequence moves on; everything else ends the run.
    pub fn is_attempt_scoped(&self) -> bool {
        matches!(self, ClaimError::Network(_) | ClaimError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_scoped_errors() {
        assert!(ClaimError::Network("connection refused".into()).is_attempt_scoped());
        assert!(ClaimError::Timeout("no receipt after 120s".into()).is_attempt_scoped());
        assert!(!ClaimError::MissingConfig("PRIVATE_KEY".into()).is_attempt_scoped());
        assert!(!ClaimError::Wallet("bad key".into()).is_attempt_scoped());
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = ClaimError::InsufficientFunds {
            balance_wei: "10".into(),
            required_wei: "1000".into(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 10 wei, need at least 1000 wei"
        );
    }
}
