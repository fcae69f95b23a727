// crates/cpi-core/src/retrieve.rs

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::model::Row;

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Directory for saved copies of downloaded documents.
    pub saved_dir: PathBuf,
    /// Persist every successful download into `saved_dir`.
    pub save: bool,
    /// Serve from `saved_dir` instead of the network when a copy exists.
    pub use_saved: bool,
    pub timeout_secs: u64,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            saved_dir: PathBuf::from("saved_data"),
            save: false,
            use_saved: false,
            timeout_secs: 60,
        }
    }
}

/// Downloads JSON documents with an optional on-disk cache. Transport
/// problems come back as typed errors; the caller decides whether a failed
/// fetch aborts the run or just skips dataset generation.
pub struct Retriever {
    client: Client,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cpi-scraper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch one JSON document. A saved copy short-circuits the network
    /// entirely; a fresh download can be persisted for later runs.
    pub async fn download_json(&self, url: &str, filename: &str) -> Result<Value> {
        let saved_path = self.config.saved_dir.join(filename);
        if self.config.use_saved && saved_path.exists() {
            info!(path = %saved_path.display(), "using saved copy");
            let text = fs::read_to_string(&saved_path)?;
            return Ok(serde_json::from_str(&text)?);
        }

        debug!(url, "downloading");
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| PipelineError::Transport {
                    url: url.to_string(),
                    source,
                })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        let value: Value = response
            .json()
            .await
            .map_err(|source| PipelineError::Transport {
                url: url.to_string(),
                source,
            })?;

        if self.config.save {
            fs::create_dir_all(&self.config.saved_dir)?;
            fs::write(&saved_path, serde_json::to_vec_pretty(&value)?)?;
            debug!(path = %saved_path.display(), "saved download");
        }
        Ok(value)
    }

    /// Fetch the source endpoint and decode it as an array of rows.
    pub async fn download_rows(&self, url: &str, filename: &str) -> Result<Vec<Row>> {
        let value = self.download_json(url, filename).await?;
        Ok(serde_json::from_value(value)?)
    }
}
