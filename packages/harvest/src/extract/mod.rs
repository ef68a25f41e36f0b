//! Shape-tolerant record extraction from raw page bodies.

pub mod json;
pub mod table;

pub use json::JsonExtractor;
pub use table::{extract_rows, parse_tables, split_name_id, CellField, RowSchema, Table};
