//! Fixed-window pagination with early-exit error reporting.
//!
//! One partition (a search prefix, a firm) is paged through by repeated
//! fixed-size-window requests. A short or empty page signals end-of-stream;
//! a fetch error ends the partition early while keeping whatever was
//! already accumulated.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};
use crate::record::Record;

/// Fetches one page of records for a partition at a given offset.
///
/// Implementations issue a single request and decode the body into raw
/// records; the session-level retry policy has already run by the time an
/// error is returned here.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        partition: &str,
        offset: usize,
        limit: usize,
    ) -> FetchResult<Vec<Record>>;
}

/// Result of paginating one partition.
#[derive(Debug, Default)]
pub struct PartitionRun {
    pub partition: String,
    pub records: Vec<Record>,
    /// Pages requested, including a final empty one.
    pub pages: usize,
    /// Set when pagination ended early. Accumulated records are kept.
    pub error: Option<FetchError>,
}

impl PartitionRun {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives the fetch loop for one partition: request windows of
/// `page_limit` records until a short or empty page, sleeping `page_delay`
/// between consecutive fetches. The delay is fixed, not adaptive.
#[derive(Debug, Clone)]
pub struct Paginator {
    page_limit: usize,
    page_delay: Duration,
}

impl Paginator {
    pub fn new(page_limit: usize) -> Self {
        Self {
            page_limit: page_limit.max(1),
            page_delay: Duration::from_millis(500),
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Fetch all records for one partition. Once a page comes back with
    /// fewer than `page_limit` records (or empty), no further requests are
    /// issued for this partition.
    pub async fn run<F>(&self, fetcher: &F, partition: &str) -> PartitionRun
    where
        F: PageFetcher + ?Sized,
    {
        let mut run = PartitionRun {
            partition: partition.to_string(),
            ..PartitionRun::default()
        };
        let mut offset = 0;

        loop {
            let page = match fetcher.fetch_page(partition, offset, self.page_limit).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        partition,
                        offset,
                        records_kept = run.records.len(),
                        error = %e,
                        "pagination ended early"
                    );
                    run.error = Some(e);
                    return run;
                }
            };

            run.pages += 1;
            let count = page.len();
            debug!(partition, offset, count, "page fetched");
            run.records.extend(page);

            if count < self.page_limit {
                break;
            }
            offset += self.page_limit;

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(
            partition,
            records = run.records.len(),
            pages = run.pages,
            "partition complete"
        );
        run
    }
}
