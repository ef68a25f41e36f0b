//! Extraction of flat records from JSON page envelopes.
//!
//! Different deployments wrap their row arrays in different container
//! keys, so the extractor probes an explicit ordered candidate list and
//! falls back to a bare top-level array. Anything else degrades to an
//! empty page with a logged warning rather than an error.

use serde_json::Value;
use tracing::warn;

use crate::record::{value_to_field, ExtractReport, Record};

/// Default ordered list of container keys probed in page envelopes.
pub const DEFAULT_CONTAINER_KEYS: [&str; 6] =
    ["data", "rows", "list", "result", "results", "items"];

/// Extracts records from JSON page responses.
#[derive(Debug, Clone)]
pub struct JsonExtractor {
    container_keys: Vec<String>,
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_KEYS)
    }
}

impl JsonExtractor {
    /// Create an extractor probing the given container keys, in order.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn container_keys(&self) -> &[String] {
        &self.container_keys
    }

    /// Locate the row container: the first configured key holding an
    /// array, or the top-level value when it is itself an array.
    fn rows<'a>(&self, body: &'a Value) -> Option<&'a [Value]> {
        if let Value::Object(map) = body {
            for key in &self.container_keys {
                if let Some(Value::Array(rows)) = map.get(key) {
                    return Some(rows);
                }
            }
        }
        if let Value::Array(rows) = body {
            return Some(rows);
        }
        None
    }

    /// Extract all records from one page body. Pure function of its
    /// input: the same body always yields the same report.
    pub fn extract(&self, body: &Value) -> ExtractReport {
        let mut report = ExtractReport::default();

        let Some(rows) = self.rows(body) else {
            warn!(
                shape = %envelope_shape(body),
                "unexpected page envelope, treating as empty"
            );
            return report;
        };

        for (index, row) in rows.iter().enumerate() {
            match row {
                Value::Object(fields) => {
                    let record: Record = fields
                        .iter()
                        .map(|(key, value)| (key.clone(), value_to_field(value)))
                        .collect();
                    report.records.push(record);
                }
                other => report.skip(index, format!("expected object row, got {}", kind(other))),
            }
        }
        report
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn envelope_shape(body: &Value) -> String {
    match body {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        other => kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_matching_container_key_wins() {
        let extractor = JsonExtractor::default();
        let body = json!({
            "total": 2,
            "rows": [{"a": "1"}],
            "items": [{"a": "ignored"}]
        });

        let report = extractor.extract(&body);

        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].get("a").unwrap(), "1");
    }

    #[test]
    fn test_container_key_order_is_configuration() {
        let extractor = JsonExtractor::new(["items", "rows"]);
        let body = json!({
            "rows": [{"a": "from rows"}],
            "items": [{"a": "from items"}]
        });

        let report = extractor.extract(&body);

        assert_eq!(report.records[0].get("a").unwrap(), "from items");
    }

    #[test]
    fn test_top_level_array_used_directly() {
        let extractor = JsonExtractor::default();
        let body = json!([{"a": "1"}, {"b": "2"}]);

        let report = extractor.extract(&body);

        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_container_key_must_hold_an_array() {
        let extractor = JsonExtractor::default();
        let body = json!({"data": "not a list", "rows": [{"a": "1"}]});

        let report = extractor.extract(&body);

        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].get("a").unwrap(), "1");
    }

    #[test]
    fn test_unexpected_shape_yields_empty_report() {
        let extractor = JsonExtractor::default();

        let report = extractor.extract(&json!({"message": "maintenance"}));

        assert!(report.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_non_object_rows_are_skipped_with_reason() {
        let extractor = JsonExtractor::default();
        let body = json!({"data": [{"a": "1"}, "stray", {"b": "2"}]});

        let report = extractor.extract(&body);

        assert_eq!(report.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert!(report.skipped[0].reason.contains("string"));
    }

    #[test]
    fn test_scalar_values_are_stringified() {
        let extractor = JsonExtractor::default();
        let body = json!({"data": [{"id": 7, "active": true, "gone": null}]});

        let record = &extractor.extract(&body).records[0];

        assert_eq!(record.get("id").unwrap(), "7");
        assert_eq!(record.get("active").unwrap(), "true");
        assert_eq!(record.get("gone").unwrap(), "");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = JsonExtractor::default();
        let body = json!({"data": [{"a": "1", "b": "2"}, {"a": "3"}]});

        let first = extractor.extract(&body);
        let second = extractor.extract(&body);

        assert_eq!(first.records, second.records);
        assert_eq!(first.skipped, second.skipped);
    }
}
