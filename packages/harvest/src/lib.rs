//! Harvesting of public licensing registers into flat files.
//!
//! Three sources share one loop: build a session once, page through each
//! partition with fixed-size windows and bounded retry, extract flat
//! records tolerantly, and write everything at the end.
//!
//! # Example
//!
//! ```rust,ignore
//! use harvest::paginate::Paginator;
//! use harvest::register::{default_prefixes, RegisterClient, RegisterConfig};
//! use harvest::session::RetryPolicy;
//! use harvest::write::write_records;
//!
//! let config = RegisterConfig::new(search_url, cookie_blob);
//! let client = RegisterClient::new(config, RetryPolicy::default())?;
//! let paginator = Paginator::new(100);
//! let harvest = client.harvest(&default_prefixes(), &paginator, delay).await;
//! write_records("corporations.csv".as_ref(), &harvest.records)?;
//! ```

pub mod error;
pub mod extract;
pub mod firms;
pub mod paginate;
pub mod record;
pub mod register;
pub mod session;
pub mod tables_site;
pub mod write;

pub use error::{FetchError, FetchResult, HarvestError, Result};
pub use extract::{JsonExtractor, RowSchema, Table};
pub use paginate::{PageFetcher, Paginator, PartitionRun};
pub use record::{ExtractReport, Record, SkippedRow};
pub use session::{RetryPolicy, Session, SessionConfig};
pub use write::WriteOutcome;
