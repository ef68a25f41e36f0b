//! Flat records and per-row extraction reports.
//!
//! A record is an unordered field-to-value mapping extracted from one
//! source row or JSON element. The field set is not fixed in advance;
//! writers union all observed keys before emitting tabular output.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;

/// One extracted record. Insertion order follows the source row; tabular
/// writers re-sort the unioned field names themselves.
pub type Record = IndexMap<String, String>;

/// A row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based index of the row within its page or document.
    pub index: usize,
    pub reason: String,
}

/// Outcome of extracting one raw page or document: the records that
/// parsed plus the rows that were skipped, with reasons.
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

impl ExtractReport {
    /// Record a skipped row with its reason.
    pub fn skip(&mut self, index: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedRow {
            index,
            reason: reason.into(),
        });
    }

    /// Number of successfully extracted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Lexicographically sorted union of all field names across records.
pub fn field_union(records: &[Record]) -> Vec<String> {
    let mut fields = BTreeSet::new();
    for record in records {
        for key in record.keys() {
            fields.insert(key.clone());
        }
    }
    fields.into_iter().collect()
}

/// Render a JSON value as a flat field value. Scalars become their text
/// form, null becomes the empty string, and nested values are kept as
/// compact JSON rather than dropped.
pub fn value_to_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
