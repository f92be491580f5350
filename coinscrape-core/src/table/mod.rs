//! HTML table extraction with a pluggable cell-resolution policy.

pub mod extract;
pub mod policy;

pub use extract::{extract_table, RawRow, RawTable};
pub use policy::{ExtractPolicy, HeaderNaming, RowKey};
