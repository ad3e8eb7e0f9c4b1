//! Selective loading of the SEC Financial Statement Data Sets.
//!
//! Each quarter directory holds four tab-delimited files: `sub.txt` (one row per
//! filing), `pre.txt` (presentation lines), `tag.txt` (taxonomy tags) and
//! `num.txt` (numeric facts). A run resolves the accession numbers (`adsh`) of
//! the selected company's filings from `sub.txt`, then copies only the rows that
//! belong to them. Tags are matched through the `(tag, version)` pairs used by the
//! selected presentation rows.

pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod quarters;
pub mod resolve;
pub mod source;
pub mod table;

pub use filter::{FilingSet, RowFilter, RowPredicate, TagVersionSet};
pub use loader::{LoadStats, SelectiveLoader};
pub use pipeline::{Pipeline, QuarterSummary, RunSummary};
pub use quarters::{quarter_locations, QuarterLocation};
pub use source::{Header, RecordSource, Row};
pub use table::Table;
