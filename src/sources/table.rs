//! Tabular reference data (published spreadsheet CSV exports).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceError;

/// Request timeout for sheet exports.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const SOURCE_NAME: &str = "sheet";

/// One row of a fetched table, keyed by normalized header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    cells: HashMap<String, String>,
}

impl TableRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (normalize_header(k.as_ref()), v.into()))
                .collect(),
        }
    }

    /// Cell value for a column; header matching ignores case and surrounding whitespace.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(&normalize_header(column)).map(String::as_str)
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Tabular-data fetch capability.
#[async_trait]
pub trait TableFetcher: Send + Sync {
    async fn fetch_table(&self, url: &str) -> Result<Vec<TableRow>, SourceError>;
}

/// Parse CSV text with a header row.
pub fn parse_csv(text: &str) -> Result<Vec<TableRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(TableRow::from_pairs(
            headers.iter().zip(record.iter().map(str::to_string)),
        ));
    }
    Ok(rows)
}

/// Fetches CSV exports over HTTP.
pub struct HttpCsvFetcher {
    client: reqwest::Client,
}

impl HttpCsvFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TableFetcher for HttpCsvFetcher {
    async fn fetch_table(&self, url: &str) -> Result<Vec<TableRow>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: SOURCE_NAME.into(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| SourceError::Request {
            source_name: SOURCE_NAME.into(),
            reason: e.to_string(),
        })?;

        let rows = parse_csv(&text).map_err(|e| SourceError::Malformed {
            source_name: SOURCE_NAME.into(),
            reason: e.to_string(),
        })?;
        tracing::debug!(url, rows = rows.len(), "Fetched sheet");
        Ok(rows)
    }
}
