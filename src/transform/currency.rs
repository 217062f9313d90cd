//! Currency conversion transformer
//!
//! Turns raw [`BankRow`]s into [`BankRecord`]s by parsing the USD market cap
//! and deriving GBP, EUR and INR values from a rate table.

use crate::banks::{BankRecord, BankRow};
use crate::error::EtlError;
use crate::etl::Transformer;
use eyre::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Multipliers relative to USD, keyed by currency code
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrencyRates {
    rates: HashMap<String, f64>,
}

impl CurrencyRates {
    /// Read a `Currency,Rate` CSV file
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            EtlError::transform(format!(
                "failed to open rate file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file)
    }

    /// Read `Currency,Rate` CSV data from any reader
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();
        for row in rdr.deserialize::<RateRow>() {
            let row = row.map_err(|e| EtlError::transform(format!("malformed rate table: {}", e)))?;
            rates.insert(row.currency.to_uppercase(), row.rate);
        }

        Ok(Self { rates })
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    /// Look up a rate that must be present
    pub fn require(&self, currency: &str) -> Result<f64> {
        self.get(currency).ok_or_else(|| {
            EtlError::transform(format!("rate table has no entry for {}", currency)).into()
        })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(String, f64)> for CurrencyRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Round to two decimal places, halves away from zero
///
/// Values too large to scale by 100 are returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_infinite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Transformer that adds GBP, EUR and INR market caps to each row
///
/// # Example
/// ```
/// use bankcap::banks::BankRow;
/// use bankcap::etl::Transformer;
/// use bankcap::transform::{CurrencyConverter, CurrencyRates};
///
/// let rates: CurrencyRates = [("GBP", 0.8), ("EUR", 0.93), ("INR", 82.95)]
///     .into_iter()
///     .map(|(code, rate)| (code.to_string(), rate))
///     .collect();
/// let converter = CurrencyConverter::new(&rates).unwrap();
///
/// let record = converter.transform(BankRow::new("Bank A", "100.00")).unwrap();
/// assert_eq!(record.mc_gbp_billion, 80.0);
/// assert_eq!(record.mc_inr_billion, 8295.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyConverter {
    gbp: f64,
    eur: f64,
    inr: f64,
}

impl CurrencyConverter {
    /// Build a converter, failing if any required currency is missing
    pub fn new(rates: &CurrencyRates) -> Result<Self> {
        Ok(Self {
            gbp: rates.require("GBP")?,
            eur: rates.require("EUR")?,
            inr: rates.require("INR")?,
        })
    }

    /// Load the rate table at `path` and build a converter from it
    pub fn from_rates_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rates = CurrencyRates::from_csv_file(path)?;
        if rates.is_empty() {
            return Err(
                EtlError::transform(format!("rate file {} has no rates", path.display())).into(),
            );
        }
        log::debug!("Loaded {} rates from {}", rates.len(), path.display());
        Self::new(&rates)
    }
}

impl Transformer for CurrencyConverter {
    type Input = BankRow;
    type Output = BankRecord;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let usd: f64 = input.market_cap.trim().parse().map_err(|_| {
            EtlError::transform(format!(
                "market cap '{}' for {} is not a number",
                input.market_cap, input.name
            ))
        })?;

        Ok(BankRecord {
            name: input.name,
            mc_usd_billion: usd,
            mc_gbp_billion: round2(usd * self.gbp),
            mc_eur_billion: round2(usd * self.eur),
            mc_inr_billion: round2(usd * self.inr),
        })
    }
}

/// Convert `rows` using the rate table at `rates_path`
pub fn transform(rows: Vec<BankRow>, rates_path: impl AsRef<Path>) -> Result<Vec<BankRecord>> {
    CurrencyConverter::from_rates_file(rates_path)?.transform_many(rows)
}
