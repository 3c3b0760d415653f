//! HTTP client for the eligibility pool service
//!
//! `GET {base}/entries` returns the pool rows, either as a bare array or wrapped in
//! `{"entries": [...]}`; item ids may be JSON strings or numbers.
//! `POST {base}/reconcile` asks the service to re-check ownership.

use crate::error::{Result, RoundError};
use crate::traits::{EntryPoolReader, EntryPoolValidator};
use async_trait::async_trait;
use round_config::PoolSettings;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use types::EligibilityRow;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpEntryPool {
    client: reqwest::Client,
    entries_url: Url,
    reconcile_url: Url,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    wallet_address: String,
    item_id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntriesResponse {
    Bare(Vec<WireRow>),
    Wrapped { entries: Vec<WireRow> },
}

impl EntriesResponse {
    fn into_rows(self) -> Vec<EligibilityRow> {
        let rows = match self {
            EntriesResponse::Bare(rows) | EntriesResponse::Wrapped { entries: rows } => rows,
        };
        rows.into_iter()
            .map(|row| {
                let item_id = match row.item_id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                EligibilityRow::new(row.wallet_address, item_id)
            })
            .collect()
    }
}

impl HttpEntryPool {
    pub fn new(settings: &PoolSettings) -> Result<Self> {
        let base = settings.base_url.trim_end_matches('/');
        let parse = |path: &str| -> Result<Url> {
            Url::parse(&format!("{}/{}", base, path)).map_err(|e| RoundError::Configuration {
                message: format!("Invalid pool base URL '{}': {}", settings.base_url, e),
            })
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RoundError::pool(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            entries_url: parse("entries")?,
            reconcile_url: parse("reconcile")?,
        })
    }

    pub fn entries_url(&self) -> &Url {
        &self.entries_url
    }
}

#[async_trait]
impl EntryPoolReader for HttpEntryPool {
    async fn get_all_entries(&self) -> Result<Vec<EligibilityRow>> {
        let response = self
            .client
            .get(self.entries_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RoundError::pool(format!("GET {} failed: {}", self.entries_url, e)))?;

        let body: EntriesResponse = response
            .json()
            .await
            .map_err(|e| RoundError::pool(format!("Malformed entries response: {}", e)))?;

        let rows = body.into_rows();
        debug!("Fetched {} pool rows", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl EntryPoolValidator for HttpEntryPool {
    async fn reconcile(&self) -> Result<()> {
        self.client
            .post(self.reconcile_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                RoundError::pool(format!("POST {} failed: {}", self.reconcile_url, e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_joined_without_double_slash() {
        let pool = HttpEntryPool::new(&PoolSettings {
            base_url: "http://pool.local:3000/".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(pool.entries_url().as_str(), "http://pool.local:3000/entries");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpEntryPool::new(&PoolSettings {
            base_url: "not a url".to_string(),
            request_timeout_secs: 5,
        });
        assert!(matches!(result, Err(RoundError::Configuration { .. })));
    }

    #[test]
    fn test_both_response_shapes_decode() {
        let bare: EntriesResponse =
            serde_json::from_str(r#"[{"wallet_address":"0xA","item_id":"7"}]"#).unwrap();
        let wrapped: EntriesResponse =
            serde_json::from_str(r#"{"entries":[{"wallet_address":"0xA","item_id":7}]}"#).unwrap();

        assert_eq!(bare.into_rows(), vec![EligibilityRow::new("0xA", "7")]);
        assert_eq!(wrapped.into_rows(), vec![EligibilityRow::new("0xA", "7")]);
    }
}
