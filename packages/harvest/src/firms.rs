//! Firm → licensee → organization tree harvest.
//!
//! Walks the aggregation site three levels deep: the firm index page, one
//! page per firm listing its licensees, and one page per licensee listing
//! the organizations they have acted for. Pages arrive as rendered HTML
//! through a [`PageSource`], so the production crawling-service client and
//! test doubles plug in behind the same seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::extract::table::{extract_rows, RowSchema};
use crate::record::Record;

/// Fetches rendered HTML for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> FetchResult<String>;
}

/// One organization entry on a licensee's history page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub organization: String,
    pub role: String,
    pub activity: String,
    #[serde(rename = "from")]
    pub from_date: String,
    #[serde(rename = "until")]
    pub until_date: String,
}

/// One licensee row on a firm page, with the organizations harvested
/// from their personal page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licensee {
    pub name: String,
    pub sfc_id: String,
    pub role: String,
    pub license_start: String,
    pub license_end: String,
    pub personal_url: String,
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

/// One firm with its licensees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmTree {
    pub firm_name: String,
    pub firm_url: String,
    #[serde(default)]
    pub licensees: Vec<Licensee>,
}

/// Configuration for the firm-tree harvest.
#[derive(Debug, Clone)]
pub struct FirmHarvestConfig {
    /// Firm index page listing one firm per table row.
    pub index_url: String,
    /// Optional caps; unbounded when `None`. Truncation is logged.
    pub max_firms: Option<usize>,
    pub max_licensees_per_firm: Option<usize>,
    pub max_organizations_per_licensee: Option<usize>,
}

impl FirmHarvestConfig {
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            max_firms: None,
            max_licensees_per_firm: None,
            max_organizations_per_licensee: None,
        }
    }
}

fn firm_index_schema() -> RowSchema {
    RowSchema::new(2).text(1, "firm_name").href(1, "firm_url")
}

fn licensee_schema() -> RowSchema {
    RowSchema::new(7)
        .href(1, "personal_url")
        .name_with_id(1, "name", "sfc_id")
        .text(5, "role")
        .text(6, "license_start")
        .text(7, "license_end")
}

fn organization_schema() -> RowSchema {
    RowSchema::new(6)
        .text(1, "organization")
        .text(3, "role")
        .text(4, "activity")
        .text(5, "from")
        .text(6, "until")
}

/// Harvests the firm/licensee/organization tree through a [`PageSource`].
pub struct FirmHarvester<S> {
    source: S,
    config: FirmHarvestConfig,
}

impl<S: PageSource> FirmHarvester<S> {
    pub fn new(source: S, config: FirmHarvestConfig) -> Self {
        Self { source, config }
    }

    /// Run the full harvest. An unreachable index page fails the whole
    /// harvest; a failed firm or licensee page degrades to an empty
    /// branch and the rest of the tree is still built.
    pub async fn harvest(&self) -> FetchResult<Vec<FirmTree>> {
        let mut firms = self.firm_links().await?;
        info!(count = firms.len(), "firm index scraped");
        truncate_logged(&mut firms, self.config.max_firms, "firms");

        let mut trees = Vec::with_capacity(firms.len());
        for (firm_name, firm_url) in firms {
            let licensees = match self.licensees_for_firm(&firm_url).await {
                Ok(licensees) => licensees,
                Err(e) => {
                    warn!(firm = %firm_name, error = %e, "firm page failed, keeping empty branch");
                    Vec::new()
                }
            };
            trees.push(FirmTree {
                firm_name,
                firm_url,
                licensees,
            });
        }
        Ok(trees)
    }

    /// Scrape the index page into `(firm name, firm URL)` pairs.
    async fn firm_links(&self) -> FetchResult<Vec<(String, String)>> {
        let html = self.source.fetch_html(&self.config.index_url).await?;
        let base = Url::parse(&self.config.index_url).ok();
        let report = extract_rows(&html, &firm_index_schema(), base.as_ref());
        for skipped in &report.skipped {
            debug!(row = skipped.index, reason = %skipped.reason, "index row skipped");
        }

        Ok(report
            .records
            .into_iter()
            .map(|mut record| (take(&mut record, "firm_name"), take(&mut record, "firm_url")))
            .filter(|(name, url)| !name.is_empty() && !url.is_empty())
            .collect())
    }

    async fn licensees_for_firm(&self, firm_url: &str) -> FetchResult<Vec<Licensee>> {
        let html = self.source.fetch_html(firm_url).await?;
        let base = Url::parse(firm_url).ok();
        let report = extract_rows(&html, &licensee_schema(), base.as_ref());
        for skipped in &report.skipped {
            debug!(row = skipped.index, reason = %skipped.reason, "licensee row skipped");
        }

        let mut licensees: Vec<Licensee> = report
            .records
            .into_iter()
            .map(|mut record| Licensee {
                name: take(&mut record, "name"),
                sfc_id: take(&mut record, "sfc_id"),
                role: take(&mut record, "role"),
                license_start: take(&mut record, "license_start"),
                license_end: take(&mut record, "license_end"),
                personal_url: take(&mut record, "personal_url"),
                organizations: Vec::new(),
            })
            .collect();
        truncate_logged(
            &mut licensees,
            self.config.max_licensees_per_firm,
            "licensees",
        );

        for licensee in &mut licensees {
            licensee.organizations = match self.organizations_for(&licensee.personal_url).await {
                Ok(organizations) => organizations,
                Err(e) => {
                    warn!(
                        licensee = %licensee.name,
                        error = %e,
                        "personal page failed, keeping empty organization list"
                    );
                    Vec::new()
                }
            };
        }
        Ok(licensees)
    }

    async fn organizations_for(&self, personal_url: &str) -> FetchResult<Vec<Organization>> {
        let html = self.source.fetch_html(personal_url).await?;
        let report = extract_rows(&html, &organization_schema(), None);
        for skipped in &report.skipped {
            debug!(row = skipped.index, reason = %skipped.reason, "organization row skipped");
        }

        let mut organizations: Vec<Organization> = report
            .records
            .into_iter()
            .map(|mut record| Organization {
                organization: take(&mut record, "organization"),
                role: take(&mut record, "role"),
                activity: take(&mut record, "activity"),
                from_date: take(&mut record, "from"),
                until_date: take(&mut record, "until"),
            })
            .collect();
        truncate_logged(
            &mut organizations,
            self.config.max_organizations_per_licensee,
            "organizations",
        );
        Ok(organizations)
    }
}

fn take(record: &mut Record, field: &str) -> String {
    record.shift_remove(field).unwrap_or_default()
}

fn truncate_logged<T>(items: &mut Vec<T>, cap: Option<usize>, what: &'static str) {
    if let Some(cap) = cap {
        if items.len() > cap {
            info!(what, kept = cap, dropped = items.len() - cap, "limit applied");
            items.truncate(cap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct CannedSource {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageSource for CannedSource {
        async fn fetch_html(&self, url: &str) -> FetchResult<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Service(format!("no page for {url}")))
        }
    }

    const INDEX_URL: &str = "https://site.example.com/dbpub/index.asp";

    fn index_page() -> String {
        r#"
        <table>
          <tr><th>Row</th><th>Firm</th><th>Licensees</th></tr>
          <tr><td>1</td><td><a href="/dbpub/firm?f=1">Alpha Securities</a></td><td>2</td></tr>
          <tr><td>2</td><td><a href="/dbpub/firm?f=2">Beta Capital</a></td><td>0</td></tr>
        </table>
        "#
        .to_string()
    }

    fn firm_page() -> String {
        r#"
        <table>
          <tr>
            <td>1</td>
            <td><a href="/dbpub/person?p=9">WONG Ka Ho (XYZ789)</a></td>
            <td>-</td><td>-</td><td>-</td>
            <td>Representative</td>
            <td>2020-05-04</td>
            <td></td>
          </tr>
        </table>
        "#
        .to_string()
    }

    fn person_page() -> String {
        r#"
        <table>
          <tr>
            <td>1</td>
            <td>Alpha Securities</td>
            <td>-</td>
            <td>Representative</td>
            <td>Dealing in securities</td>
            <td>2020-05-04</td>
            <td>2023-01-31</td>
          </tr>
          <tr>
            <td>2</td>
            <td>Old Firm</td>
            <td>-</td>
            <td>Representative</td>
            <td>Advising</td>
            <td>2018-02-01</td>
          </tr>
        </table>
        "#
        .to_string()
    }

    fn source() -> CannedSource {
        let mut pages = HashMap::new();
        pages.insert(INDEX_URL.to_string(), index_page());
        pages.insert(
            "https://site.example.com/dbpub/firm?f=1".to_string(),
            firm_page(),
        );
        pages.insert(
            "https://site.example.com/dbpub/person?p=9".to_string(),
            person_page(),
        );
        // firm?f=2 is intentionally absent.
        CannedSource { pages }
    }

    #[tokio::test]
    async fn test_builds_three_level_tree() {
        let harvester = FirmHarvester::new(source(), FirmHarvestConfig::new(INDEX_URL));

        let trees = harvester.harvest().await.unwrap();

        assert_eq!(trees.len(), 2);
        let alpha = &trees[0];
        assert_eq!(alpha.firm_name, "Alpha Securities");
        assert_eq!(alpha.firm_url, "https://site.example.com/dbpub/firm?f=1");
        assert_eq!(alpha.licensees.len(), 1);

        let licensee = &alpha.licensees[0];
        assert_eq!(licensee.name, "WONG Ka Ho");
        assert_eq!(licensee.sfc_id, "XYZ789");
        assert_eq!(licensee.role, "Representative");
        assert_eq!(licensee.license_start, "2020-05-04");
        assert_eq!(licensee.license_end, "");
        assert_eq!(licensee.organizations.len(), 2);
        assert_eq!(licensee.organizations[0].organization, "Alpha Securities");
        assert_eq!(licensee.organizations[0].until_date, "2023-01-31");
        // Short organization row leaves the until date empty.
        assert_eq!(licensee.organizations[1].until_date, "");
    }

    #[tokio::test]
    async fn test_failed_firm_page_keeps_empty_branch() {
        let harvester = FirmHarvester::new(source(), FirmHarvestConfig::new(INDEX_URL));

        let trees = harvester.harvest().await.unwrap();

        let beta = &trees[1];
        assert_eq!(beta.firm_name, "Beta Capital");
        assert!(beta.licensees.is_empty());
    }

    #[tokio::test]
    async fn test_firm_cap_truncates() {
        let config = FirmHarvestConfig {
            max_firms: Some(1),
            ..FirmHarvestConfig::new(INDEX_URL)
        };
        let harvester = FirmHarvester::new(source(), config);

        let trees = harvester.harvest().await.unwrap();

        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].firm_name, "Alpha Securities");
    }

    #[tokio::test]
    async fn test_organization_cap_truncates() {
        let config = FirmHarvestConfig {
            max_organizations_per_licensee: Some(1),
            ..FirmHarvestConfig::new(INDEX_URL)
        };
        let harvester = FirmHarvester::new(source(), config);

        let trees = harvester.harvest().await.unwrap();

        assert_eq!(trees[0].licensees[0].organizations.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_index_fails_the_harvest() {
        let harvester = FirmHarvester::new(
            CannedSource {
                pages: HashMap::new(),
            },
            FirmHarvestConfig::new(INDEX_URL),
        );

        assert!(harvester.harvest().await.is_err());
    }

    #[test]
    fn test_tree_serializes_with_wire_field_names() {
        let tree = FirmTree {
            firm_name: "Alpha".to_string(),
            firm_url: "https://site.example.com/f/1".to_string(),
            licensees: vec![Licensee {
                name: "WONG".to_string(),
                sfc_id: "X1".to_string(),
                role: "RO".to_string(),
                license_start: "2020-01-01".to_string(),
                license_end: String::new(),
                personal_url: "https://site.example.com/p/9".to_string(),
                organizations: vec![Organization {
                    organization: "Alpha".to_string(),
                    role: "RO".to_string(),
                    activity: "Dealing".to_string(),
                    from_date: "2020-01-01".to_string(),
                    until_date: String::new(),
                }],
            }],
        };

        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["firm_name"], "Alpha");
        assert_eq!(value["licensees"][0]["sfc_id"], "X1");
        assert_eq!(value["licensees"][0]["organizations"][0]["from"], "2020-01-01");
        assert_eq!(value["licensees"][0]["organizations"][0]["until"], "");
    }
}
