//! Conversions between wei, gwei and ether amounts.
//!
//! Configuration carries human amounts as `Decimal` (e.g. `0.0025` gwei, `0.001` ETH);
//! the chain speaks integer wei.

use alloy::primitives::U256;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{ClaimError, Result};

pub const WEI_PER_GWEI: u128 = 1_000_000_000;
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Decimal places kept when reporting an ether cost.
pub const COST_DECIMALS: u32 = 6;

/// Convert a gwei amount to integer wei, truncating sub-wei fractions.
pub fn gwei_to_wei(gwei: Decimal) -> Result<u128> {
    scale_to_wei(gwei, WEI_PER_GWEI, "gas price")
}

/// Convert an ether amount to integer wei, truncating sub-wei fractions.
pub fn eth_to_wei(eth: Decimal) -> Result<U256> {
    scale_to_wei(eth, WEI_PER_ETH, "ether amount").map(U256::from)
}

fn scale_to_wei(amount: Decimal, unit: u128, what: &str) -> Result<u128> {
    if amount.is_sign_negative() {
        return Err(ClaimError::Internal(format!(
            "{} must not be negative: {}",
            what, amount
        )));
    }
    let unit = Decimal::from_u128(unit)
        .ok_or_else(|| ClaimError::Internal(format!("unit for {} out of range", what)))?;
    amount
        .checked_mul(unit)
        .and_then(|wei| wei.trunc().to_u128())
        .ok_or_else(|| ClaimError::Internal(format!("{} out of range: {}", what, amount)))
}

/// Render a wei amount as ether. Values beyond `Decimal` range saturate at `Decimal::MAX`.
pub fn wei_to_eth(wei: U256) -> Decimal {
    let Ok(wei) = u128::try_from(wei) else {
        return Decimal::MAX;
    };
    match i128::try_from(wei)
        .ok()
        .and_then(|w| Decimal::try_from_i128_with_scale(w, 18).ok())
    {
        Some(eth) => eth.normalize(),
        // Too many significant digits for a scale-18 mantissa: drop to gwei precision.
        None => Decimal::from_u128(wei / WEI_PER_GWEI)
            .and_then(|gwei| gwei.checked_div(Decimal::from(1_000_000_000u64)))
            .unwrap_or(Decimal::MAX),
    }
}

/// Transaction fee in ether: `gas_used × effective_gas_price`, rounded to six decimals.
pub fn gas_cost_eth(gas_used: u64, effective_gas_price: u128) -> Decimal {
    let fee_wei = U256::from(gas_used).saturating_mul(U256::from(effective_gas_price));
    wei_to_eth(fee_wei)
        .round_dp_with_strategy(COST_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
