//! Transform implementations for bank rows

mod currency;

pub use currency::{CurrencyConverter, CurrencyRates, round2, transform};
