//! `harvest firms`: build the firm/licensee/organization tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use firecrawl_client::FirecrawlClient;
use harvest::error::{FetchError, FetchResult};
use harvest::firms::{FirmHarvestConfig, FirmHarvester, PageSource};
use harvest::write::{write_tree, WriteOutcome};

#[derive(Args, Debug)]
pub struct FirmsArgs {
    /// Firm index page on the aggregation site.
    #[arg(long, default_value = "https://webb-site.com/dbpub/SFClicount.asp")]
    index_url: String,

    /// Output JSON path.
    #[arg(long, default_value = "sfc_licensee_data.json")]
    output: PathBuf,

    /// Process at most this many firms.
    #[arg(long)]
    max_firms: Option<usize>,

    /// Keep at most this many licensees per firm.
    #[arg(long)]
    max_licensees: Option<usize>,

    /// Keep at most this many organizations per licensee.
    #[arg(long)]
    max_organizations: Option<usize>,
}

/// Adapts the crawling-service client to the harvest page seam.
struct FirecrawlSource(FirecrawlClient);

#[async_trait]
impl PageSource for FirecrawlSource {
    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        let document = self
            .0
            .scrape(url)
            .await
            .map_err(|e| FetchError::Service(e.to_string()))?;
        Ok(document.html)
    }
}

pub async fn run(args: FirmsArgs) -> Result<()> {
    let client = FirecrawlClient::from_env()
        .context("FIRECRAWL_API_KEY must be set for the crawling service")?;

    let config = FirmHarvestConfig {
        max_firms: args.max_firms,
        max_licensees_per_firm: args.max_licensees,
        max_organizations_per_licensee: args.max_organizations,
        ..FirmHarvestConfig::new(args.index_url)
    };
    let harvester = FirmHarvester::new(FirecrawlSource(client), config);

    let trees = match harvester.harvest().await {
        Ok(trees) => trees,
        Err(e) => {
            tracing::error!(error = %e, "firm index scrape failed");
            Vec::new()
        }
    };

    match write_tree(&args.output, &trees)? {
        WriteOutcome::Empty => println!("No records to write."),
        WriteOutcome::Written { path, rows } => {
            println!("Done. Wrote {} firm(s) to {}.", rows, path.display());
        }
    }
    Ok(())
}
