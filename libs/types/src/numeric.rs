//! Integer amounts in smallest units
//!
//! All ledger arithmetic is integer-only: currency in its smallest unit,
//! tokens in base units. Division truncates toward zero. Products that can
//! exceed 128 bits are formed in a 256-bit intermediate before dividing.

use ethnum::U256;

/// Amount in an asset's smallest unit
pub type Amount = u128;

/// Largest decimal precision whose scale factor fits in an `Amount`
pub const MAX_DECIMALS: u8 = 38;

/// Decimal precision of the reserve currency
pub const CURRENCY_DECIMALS: u8 = 18;

/// `10^decimals`, or `None` when it does not fit in an `Amount`
pub fn pow10(decimals: u8) -> Option<Amount> {
    10u128.checked_pow(u32::from(decimals))
}

/// Scale a whole-unit quantity to smallest units (`whole * 10^decimals`)
pub fn parse_units(whole: Amount, decimals: u8) -> Option<Amount> {
    whole.checked_mul(pow10(decimals)?)
}

/// Whole currency units to smallest currency units
pub fn currency_units(whole: Amount) -> Option<Amount> {
    parse_units(whole, CURRENCY_DECIMALS)
}

/// `a * b / denominator`, multiplying first, truncating toward zero
///
/// Returns `None` when the denominator is zero or the quotient does not
/// fit back into an `Amount`. The product itself never overflows.
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Option<Amount> {
    if denominator == 0 {
        return None;
    }
    let product = U256::from(a) * U256::from(b);
    let quotient = product / U256::from(denominator);
    let (high, low) = quotient.into_words();
    if high != 0 {
        return None;
    }
    Some(low)
}
