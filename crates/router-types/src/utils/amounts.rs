//! Token amount scaling.
//!
//! Balances and quotes travel in human units while provider requests and the
//! shortfall are computed in smallest units. All conversions are checked so
//! that out-of-range values surface as `None` instead of panicking.

use rust_decimal::Decimal;

/// Returns `10^decimals`, or `None` if it exceeds the `Decimal` range.
pub fn pow10(decimals: u32) -> Option<Decimal> {
	let mut value = Decimal::ONE;
	for _ in 0..decimals {
		value = value.checked_mul(Decimal::TEN)?;
	}
	Some(value)
}

/// Converts a human-unit amount into smallest units (`amount * 10^decimals`).
pub fn to_smallest_units(amount: Decimal, decimals: u32) -> Option<Decimal> {
	amount.checked_mul(pow10(decimals)?)
}

/// Converts a smallest-unit amount into human units (`raw / 10^decimals`).
pub fn from_smallest_units(raw: Decimal, decimals: u32) -> Option<Decimal> {
	raw.checked_div(pow10(decimals)?).map(|v| v.normalize())
}
