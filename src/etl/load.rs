//! Loader trait for writing rows to a sink

use eyre::Result;

/// Loader trait for loading rows into a destination
///
/// A run fans the same result set out to several loaders (a CSV file and a
/// database table); each one replaces whatever it held before.
///
/// # Example
/// ```no_run
/// use bankcap::etl::Loader;
/// use eyre::Result;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     type Item = String;
///
///     async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
///         Ok(items.len())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The type of rows to load
    type Item: Send;

    /// Load rows into the destination
    ///
    /// Returns the number of rows written
    ///
    /// # Errors
    /// Returns an error if loading fails (I/O, database, etc.)
    fn load(
        &self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
