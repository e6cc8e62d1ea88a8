//! Restricted-name list backed by a published sheet.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SourceError;
use crate::sources::{CachedSet, TableFetcher};

const FIRST_NAME_COLUMN: &str = "First_name";
const LAST_NAME_COLUMN: &str = "Last_name";

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Case-insensitive (first, last) membership test against a cached sheet.
pub struct NameBlacklist {
    fetcher: Arc<dyn TableFetcher>,
    sheet_url: String,
    entries: CachedSet<(String, String)>,
}

impl NameBlacklist {
    pub fn new(fetcher: Arc<dyn TableFetcher>, sheet_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            fetcher,
            sheet_url: sheet_url.into(),
            entries: CachedSet::new("blacklist", ttl),
        }
    }

    async fn fetch(&self) -> Result<HashSet<(String, String)>, SourceError> {
        let rows = self.fetcher.fetch_table(&self.sheet_url).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let first = normalize(row.get(FIRST_NAME_COLUMN)?);
                let last = normalize(row.get(LAST_NAME_COLUMN)?);
                (!first.is_empty() && !last.is_empty()).then_some((first, last))
            })
            .collect())
    }

    /// Refresh the snapshot when empty or older than the TTL. Never fails.
    pub async fn refresh_if_needed(&self) {
        self.entries.refresh_with(|| self.fetch()).await;
    }

    /// Exact pair match after trimming and lowercasing. An unreachable sheet
    /// reads as "not blacklisted".
    pub async fn is_blacklisted(&self, first_name: &str, last_name: &str) -> bool {
        self.refresh_if_needed().await;
        let key = (normalize(first_name), normalize(last_name));
        let listed = self.entries.contains(&key).await;
        tracing::debug!(first = %key.0, last = %key.1, listed, "Blacklist lookup");
        listed
    }
}
