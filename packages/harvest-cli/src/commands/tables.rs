//! `harvest tables`: snapshot the aggregation site's licence tables.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use harvest::extract::parse_tables;
use harvest::session::RetryPolicy;
use harvest::tables_site::{discover_form_fields, TableSiteClient, TableSiteConfig};
use harvest::write::{write_table_set, WriteOutcome};
use url::Url;

#[derive(Args, Debug)]
pub struct TablesArgs {
    /// Table page on the aggregation site.
    #[arg(long, default_value = "https://webb-site.com/dbpub/SFClicount.asp")]
    url: Url,

    /// HTTP method for the snapshot request (GET or POST).
    #[arg(long, default_value = "GET")]
    method: String,

    /// Literal request parameters as a JSON object, e.g. '{"key":"value"}'.
    #[arg(long)]
    params: Option<String>,

    /// Output directory; one CSV per parsed table.
    #[arg(long, default_value = "sfc_licences")]
    output: PathBuf,
}

pub async fn run(args: TablesArgs) -> Result<()> {
    let method = args
        .method
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let params = match &args.params {
        Some(raw) => parse_params(raw)?,
        None => Vec::new(),
    };

    tracing::info!(url = %args.url, method = ?method, params = params.len(), "requesting snapshot");
    let config = TableSiteConfig::new(args.url)
        .with_method(method)
        .with_params(params);
    let client = TableSiteClient::new(config, RetryPolicy::default())?;

    let html = match client.fetch_document().await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(error = %e, "snapshot request failed");
            println!("Snapshot failed: {e}. Nothing written.");
            return Ok(());
        }
    };

    let tables = parse_tables(&html);
    if tables.is_empty() {
        print_form_hints(&html);
        return Ok(());
    }

    match write_table_set(&args.output, &tables)? {
        WriteOutcome::Empty => println!("No tables to write."),
        WriteOutcome::Written { path, rows } => {
            println!("Done. Wrote {} table(s) to {}.", rows, path.display());
        }
    }
    Ok(())
}

/// Parse the `--params` literal into key/value pairs. String values keep
/// their text; other JSON scalars are rendered compactly.
fn parse_params(raw: &str) -> Result<Vec<(String, String)>> {
    let map: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => bail!(
            "could not parse --params as a JSON object (example: --params '{{\"key\":\"value\"}}'): {e}"
        ),
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// No tables parsed: dump the page's form controls so the operator can
/// set correct parameter names and values.
fn print_form_hints(html: &str) {
    let fields = discover_form_fields(html);
    if fields.is_empty() {
        println!("No tables parsed and no form found on the page. Nothing written.");
        return;
    }

    println!("No tables parsed. Candidate form fields and example values:");
    let mut seen = BTreeSet::new();
    for field in fields {
        if seen.insert(field.name.clone()) {
            println!("  - {}: e.g. '{}'", field.name, field.value);
        }
    }
}
