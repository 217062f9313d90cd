//! Row types for the largest-banks table

use crate::error::EtlError;
use eyre::Result;
use serde::{Deserialize, Serialize};

pub const GBP_LABEL: &str = "MC_GBP_Billion";
pub const EUR_LABEL: &str = "MC_EUR_Billion";
pub const INR_LABEL: &str = "MC_INR_Billion";

/// A row as it appears in the source table, before any parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRow {
    pub name: String,
    /// Raw USD market cap text, newlines already stripped
    pub market_cap: String,
}

impl BankRow {
    pub fn new(name: impl Into<String>, market_cap: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            market_cap: market_cap.into(),
        }
    }
}

/// A converted row, in the column order it is written to every sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub mc_usd_billion: f64,
    pub mc_gbp_billion: f64,
    pub mc_eur_billion: f64,
    pub mc_inr_billion: f64,
}

/// Output names for the two extracted columns
///
/// The derived currency columns always use [`GBP_LABEL`], [`EUR_LABEL`] and
/// [`INR_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabels {
    pub name: String,
    pub market_cap: String,
}

impl ColumnLabels {
    /// Build labels from an ordered list: name column first, market cap second
    ///
    /// # Errors
    /// Fails with [`EtlError::Extraction`] unless exactly two labels are given.
    pub fn from_list<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        match labels {
            [name, market_cap] => Ok(Self {
                name: name.as_ref().trim().to_string(),
                market_cap: market_cap.as_ref().trim().to_string(),
            }),
            _ => Err(EtlError::extraction(format!(
                "expected 2 column labels (name, market cap), got {}",
                labels.len()
            ))
            .into()),
        }
    }

    /// All five output column names in write order
    pub fn header(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.market_cap.as_str(),
            GBP_LABEL,
            EUR_LABEL,
            INR_LABEL,
        ]
    }
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            market_cap: "MC_USD_Billion".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header() {
        assert_eq!(
            ColumnLabels::default().header(),
            [
                "Name",
                "MC_USD_Billion",
                "MC_GBP_Billion",
                "MC_EUR_Billion",
                "MC_INR_Billion"
            ]
        );
    }

    #[test]
    fn test_from_list_requires_two_labels() {
        let labels = ColumnLabels::from_list(&["Bank", "USD"]).unwrap();
        assert_eq!(labels.name, "Bank");
        assert_eq!(labels.market_cap, "USD");

        let err = ColumnLabels::from_list(&["Name"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Extraction(_))
        ));
        assert!(ColumnLabels::from_list(&["a", "b", "c"]).is_err());
    }
}
