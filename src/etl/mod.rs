//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Each stage of a run is one of these traits: a source that yields rows,
//! a per-row transformer, and one or more sinks the rows are loaded into.

mod extract;
mod load;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use transform::Transformer;
