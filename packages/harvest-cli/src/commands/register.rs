//! `harvest register`: page through the register name search.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use harvest::paginate::Paginator;
use harvest::register::{default_prefixes, RegisterClient, RegisterConfig};
use harvest::session::RetryPolicy;
use harvest::write::{write_records, WriteOutcome};
use url::Url;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Search endpoint of the public register.
    #[arg(
        long,
        default_value = "https://apps.sfc.hk/publicregWeb/searchByNameJson"
    )]
    url: Url,

    /// Output CSV path.
    #[arg(long, default_value = "sfc_corporations.csv")]
    output: PathBuf,

    /// Search prefix; repeatable. Defaults to one prefix per letter a-z.
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Records per page.
    #[arg(long, default_value_t = 100)]
    page_limit: usize,

    /// Delay between page fetches (and between prefixes), in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Entity type to search for.
    #[arg(long, default_value = "corporation")]
    entity_type: String,

    /// Licence status filter.
    #[arg(long, default_value = "active")]
    licence_status: String,
}

pub async fn run(args: RegisterArgs) -> Result<()> {
    let cookies = std::env::var("SFC_REGISTER_COOKIES").context(
        "SFC_REGISTER_COOKIES must be set to a browser session cookie blob \
         (k=v; k=v, including JSESSIONID)",
    )?;

    let config = RegisterConfig::new(args.url, cookies)
        .with_entity_type(args.entity_type)
        .with_licence_status(args.licence_status);
    let client = RegisterClient::new(config, RetryPolicy::default())?;

    let prefixes = if args.prefixes.is_empty() {
        default_prefixes()
    } else {
        args.prefixes
    };
    let delay = Duration::from_millis(args.delay_ms);
    let paginator = Paginator::new(args.page_limit).with_page_delay(delay);

    let harvest = client.harvest(&prefixes, &paginator, delay).await;
    for (prefix, error) in &harvest.failures {
        tracing::warn!(prefix = %prefix, error = %error, "prefix ended early");
    }

    match write_records(&args.output, &harvest.records)? {
        WriteOutcome::Empty => println!("No records to write."),
        WriteOutcome::Written { path, rows } => {
            println!(
                "Done. Wrote {} rows to {} ({} of {} prefixes ended early).",
                rows,
                path.display(),
                harvest.failures.len(),
                prefixes.len()
            );
        }
    }
    Ok(())
}
