//! Extractor trait for pulling rows out of a source

use eyre::Result;

/// Extractor trait for extracting rows from a source
///
/// Implementors define where rows come from:
/// - An HTML table fetched over HTTP or read from disk
/// - A previously saved CSV snapshot
///
/// # Example
/// ```no_run
/// use bankcap::etl::Extractor;
/// use eyre::Result;
///
/// struct FixedRows(Vec<String>);
///
/// impl Extractor for FixedRows {
///     type Item = String;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of rows extracted
    type Item: Send;

    /// Extract all rows from the source, in source order
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}
