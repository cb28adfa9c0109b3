//! RCSB Protein Data Bank search and download.

use super::produce_atomically;
use crate::config::StructureServiceConfig;
use async_trait::async_trait;
use reel_error::{HttpError, JsonError, ReelError, ReelResult, StorageError, StorageErrorKind};
use reel_interface::StructureDatabase;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    result_set: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    identifier: String,
}

/// Full-text structure search and PDB file download.
pub struct RcsbStructures {
    client: reqwest::Client,
    config: StructureServiceConfig,
}

impl RcsbStructures {
    /// Client for the endpoints in `config`.
    pub fn new(client: reqwest::Client, config: &StructureServiceConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl StructureDatabase for RcsbStructures {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, name: &str) -> ReelResult<Vec<String>> {
        let query = json!({
            "query": {
                "type": "terminal",
                "service": "full_text",
                "parameters": {"value": name}
            },
            "return_type": "entry",
            "request_options": {"paginate": {"start": 0, "rows": 5}}
        });
        let response = self
            .client
            .post(self.config.search_endpoint())
            .json(&query)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Structure search failed: {}", e)))?;

        // The search API answers 204 when nothing matches.
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read search response: {}", e)))?;
        if !status.is_success() {
            return Err(HttpError::new(format!("HTTP {}: {}", status, text)).into());
        }
        let ids = identifiers(&text)?;
        tracing::debug!(hits = ids.len(), "Structure search finished");
        Ok(ids)
    }

    #[tracing::instrument(skip(self, destination))]
    async fn fetch(&self, id: &str, destination: &Path) -> ReelResult<PathBuf> {
        let url = format!(
            "{}/{}.pdb",
            self.config.download_endpoint().trim_end_matches('/'),
            id.to_uppercase()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Structure download failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(HttpError::new(format!("HTTP {} for {}", response.status(), url)).into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read structure: {}", e)))?;
        produce_atomically(destination, |staging| async move {
            tokio::fs::write(&staging, &bytes).await.map_err(|e| {
                ReelError::from(StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    staging.display(),
                    e
                ))))
            })
        })
        .await
    }
}

fn identifiers(text: &str) -> ReelResult<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let results: SearchResults = serde_json::from_str(text)
        .map_err(|e| JsonError::new(format!("Unexpected search response: {}", e)))?;
    Ok(results
        .result_set
        .into_iter()
        .map(|hit| hit.identifier)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_hit_order() {
        let text = r#"{"query_id": "q", "result_type": "entry", "total_count": 2,
            "result_set": [{"identifier": "4HHB", "score": 1.0}, {"identifier": "1A3N", "score": 0.9}]}"#;
        assert_eq!(identifiers(text).unwrap(), vec!["4HHB", "1A3N"]);
        assert!(identifiers("").unwrap().is_empty());
    }
}
