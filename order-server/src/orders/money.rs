//! Money helpers using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal` internally and converts to `f64` for
//! storage/serialization, rounded to 2 decimal places.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.round_dp(DECIMAL_PLACES).to_f64().unwrap_or(0.0)
}

/// Round a monetary value to 2 decimal places
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Line subtotal: price × quantity
pub fn line_subtotal(price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(price) * Decimal::from(quantity))
}

/// Sum monetary values without accumulating float error
pub fn sum2(values: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(values.into_iter().map(to_decimal).sum())
}
