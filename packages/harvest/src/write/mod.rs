//! Serialization of accumulated records to flat files.
//!
//! Every writer treats an empty input as a no-op: nothing is written and
//! the caller gets an explicit [`WriteOutcome::Empty`] to report instead
//! of an empty file on disk.

pub mod records;
pub mod tables;
pub mod tree;

use std::path::PathBuf;

pub use records::{read_records, write_records};
pub use tables::write_table_set;
pub use tree::write_tree;

/// What a writer did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write; no file was created.
    Empty,
    /// Output written with this many top-level rows or entries.
    Written { path: PathBuf, rows: usize },
}
