//! Transformer trait for row conversion

use eyre::Result;

/// Transformer trait for converting one row shape into another
///
/// Typical uses:
/// - Parsing raw text fields into numbers
/// - Enriching a row with derived columns
///
/// # Example
/// ```
/// use bankcap::etl::Transformer;
/// use eyre::Result;
///
/// struct Doubler;
///
/// impl Transformer for Doubler {
///     type Input = f64;
///     type Output = f64;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input * 2.0)
///     }
/// }
///
/// assert_eq!(Doubler.transform_many(vec![1.0, 2.5]).unwrap(), vec![2.0, 5.0]);
/// ```
pub trait Transformer: Send + Sync {
    /// Input row type
    type Input: Send;

    /// Output row type after transformation
    type Output: Send;

    /// Transform a single row
    ///
    /// # Errors
    /// Returns an error if the row cannot be converted
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform every row, stopping at the first failure
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parse;

    impl Transformer for Parse {
        type Input = &'static str;
        type Output = i32;

        fn transform(&self, input: Self::Input) -> Result<Self::Output> {
            Ok(input.parse()?)
        }
    }

    #[test]
    fn test_transform_many_keeps_order() {
        let output = Parse.transform_many(vec!["3", "1", "2"]).unwrap();
        assert_eq!(output, vec![3, 1, 2]);
    }

    #[test]
    fn test_transform_many_stops_on_error() {
        assert!(Parse.transform_many(vec!["1", "x", "2"]).is_err());
    }
}
