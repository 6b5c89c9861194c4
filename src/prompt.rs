//! Interactive contract address entry, used when no address is configured.

use alloy::primitives::Address;
use std::io::{self, BufRead, Write};

use crate::config::parse_contract_address;
use crate::error::{ClaimError, Result};

/// Attempts allowed before giving up on interactive input
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

/// Ask on stdin for the target contract address
pub fn prompt_contract_address() -> Result<Address> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    read_contract_address(&mut stdin.lock(), &mut stdout)
}

/// Read a contract address from `input`, re-asking on malformed entries
pub fn read_contract_address<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<Address> {
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        write!(output, "Enter contract address (0x...): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ClaimError::MissingConfig(
                "no contract address provided (input closed)".to_string(),
            ));
        }

        match parse_contract_address(&line) {
            Ok(address) => return Ok(address),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }

    Err(ClaimError::InvalidAddress(format!(
        "no valid contract address after {} attempts",
        MAX_PROMPT_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_valid_address() {
        let mut input = Cursor::new("0x5FbDB2315678afecb367f032d93F642f64180aa3\n");
        let mut output = Vec::new();

        let addr = read_contract_address(&mut input, &mut output).unwrap();
        assert_eq!(
            hex::encode(addr.as_slice()),
            "5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        assert!(String::from_utf8(output).unwrap().contains("Enter contract address"));
    }

    #[test]
    fn test_reprompts_after_invalid_entry() {
        let mut input = Cursor::new("nope\n0x5FbDB2315678afecb367f032d93F642f64180aa3\n");
        let mut output = Vec::new();

        assert!(read_contract_address(&mut input, &mut output).is_ok());
        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Enter contract address").count(), 2);
        assert!(printed.contains("must start with 0x"));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut input = Cursor::new("a\nb\nc\nd\n");
        let mut output = Vec::new();

        let err = read_contract_address(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAddress(_)));
    }

    #[test]
    fn test_closed_input() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        let err = read_contract_address(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, ClaimError::MissingConfig(_)));
    }
}
