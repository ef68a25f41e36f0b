//! Nested JSON document output for hierarchical harvests.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::write::WriteOutcome;

/// Write a hierarchical result set as a single pretty-printed JSON
/// document. An empty set writes nothing.
pub fn write_tree<T: Serialize>(path: &Path, entries: &[T]) -> Result<WriteOutcome> {
    if entries.is_empty() {
        info!("no records to write");
        return Ok(WriteOutcome::Empty);
    }

    let body = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, body)?;

    info!(path = %path.display(), entries = entries.len(), "tree document written");
    Ok(WriteOutcome::Written {
        path: path.to_path_buf(),
        rows: entries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Node {
        name: String,
        children: Vec<String>,
    }

    #[test]
    fn test_empty_tree_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");

        let outcome = write_tree::<Node>(&path, &[]).unwrap();

        assert_eq!(outcome, WriteOutcome::Empty);
        assert!(!path.exists());
    }

    #[test]
    fn test_tree_document_is_nested_not_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let entries = vec![Node {
            name: "firm".to_string(),
            children: vec!["licensee".to_string()],
        }];

        write_tree(&path, &entries).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["name"], "firm");
        assert_eq!(value[0]["children"][0], "licensee");
    }
}
