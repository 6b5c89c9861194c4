//! Candidate claim/mint calls
//!
//! Builds the fixed, ordered list of raw calldata payloads tried against the target
//! contract. Order runs from the cheapest, most common interfaces to the most complex
//! one and must not be rearranged.

use alloy::primitives::{Address, Bytes, U256};
use std::fmt;

/// `mint()`
pub const MINT_SELECTOR: [u8; 4] = [0x12, 0x49, 0xc5, 0x8b];
/// `freeMint()`
pub const FREE_MINT_SELECTOR: [u8; 4] = [0x3f, 0x8b, 0x5c, 0x32];
/// `claim(uint256)`
pub const CLAIM_SELECTOR: [u8; 4] = [0x37, 0x96, 0x07, 0xf5];
/// Public claim, `claim(address)` selector followed by a receiver and a quantity word
pub const PUBLIC_CLAIM_SELECTOR: [u8; 4] = [0x1e, 0x83, 0x40, 0x9a];
/// Drop-style `claim(address,uint256,address,uint256,(bytes32[],uint256,uint256,address),bytes)`
pub const COMPLEX_CLAIM_SELECTOR: [u8; 4] = [0x84, 0xbb, 0x1e, 0x42];

/// Sentinel address drop contracts use for the chain's native token.
pub const NATIVE_TOKEN_SENTINEL: Address = Address::new([0xee; 20]);

/// Quantity claimed by every quantity-taking candidate.
const CLAIM_QUANTITY: u64 = 1;

/// Priority tier of a candidate call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallTier {
    /// Zero-argument mint entry points
    Standard,
    /// Simple claim functions with literal arguments
    Claim,
    /// Drop-contract claim with an allowlist proof tuple
    Complex,
}

impl CallTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallTier::Standard => "standard",
            CallTier::Claim => "claim",
            CallTier::Complex => "complex",
        }
    }
}

impl fmt::Display for CallTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded function invocation that may be attempted against the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCall {
    pub name: String,
    pub tier: CallTier,
    pub payload: Bytes,
}

impl CandidateCall {
    fn new(name: &str, tier: CallTier, payload: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            tier,
            payload: Bytes::from(payload),
        }
    }

    /// First four payload bytes
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        let len = self.payload.len().min(4);
        selector[..len].copy_from_slice(&self.payload[..len]);
        selector
    }

    /// `0x`-prefixed lowercase calldata
    pub fn payload_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.payload))
    }
}

/// Left-pad an address into a 32-byte ABI word.
pub fn address_word(address: Address) -> [u8; 32] {
    address.into_word().0
}

fn uint_word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn encode(selector: [u8; 4], words: &[[u8; 32]]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + words.len() * 32);
    payload.extend_from_slice(&selector);
    for word in words {
        payload.extend_from_slice(word);
    }
    payload
}

/// Drop-contract claim of one token for `address`, paid in the native token at price zero,
/// with an empty allowlist proof and an unlimited per-wallet quantity.
pub fn build_complex_call(address: Address) -> Bytes {
    let zero = [0u8; 32];
    let words = [
        // _receiver
        address_word(address),
        // _quantity
        uint_word(U256::from(CLAIM_QUANTITY)),
        // _currency
        address_word(NATIVE_TOKEN_SENTINEL),
        // _pricePerToken
        zero,
        // offset of _allowlistProof
        uint_word(U256::from(0xc0)),
        // offset of _data
        uint_word(U256::from(0x160)),
        // _allowlistProof.proof offset, relative to the tuple
        uint_word(U256::from(0x80)),
        // _allowlistProof.quantityLimitPerWallet
        uint_word(U256::MAX),
        // _allowlistProof.pricePerToken
        zero,
        // _allowlistProof.currency
        zero,
        // proof length
        zero,
        // _data length
        zero,
    ];
    Bytes::from(encode(COMPLEX_CLAIM_SELECTOR, &words))
}

/// Public claim of one unit for `address`.
pub fn build_public_claim_call(address: Address) -> Bytes {
    Bytes::from(encode(
        PUBLIC_CLAIM_SELECTOR,
        &[address_word(address), uint_word(U256::from(CLAIM_QUANTITY))],
    ))
}

/// Every candidate call for `address`, in trial order.
pub fn all_methods(address: Address) -> Vec<CandidateCall> {
    vec![
        CandidateCall::new("mint()", CallTier::Standard, MINT_SELECTOR.to_vec()),
        CandidateCall::new("freeMint()", CallTier::Standard, FREE_MINT_SELECTOR.to_vec()),
        CandidateCall::new(
            "claim(1)",
            CallTier::Claim,
            encode(CLAIM_SELECTOR, &[uint_word(U256::from(CLAIM_QUANTITY))]),
        ),
        CandidateCall::new(
            "publicClaim",
            CallTier::Claim,
            build_public_claim_call(address).to_vec(),
        ),
        CandidateCall::new(
            "complexClaim",
            CallTier::Complex,
            build_complex_call(address).to_vec(),
        ),
    ]
}
