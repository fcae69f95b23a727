// crates/cpi-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("download failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no rows with a usable year value")]
    EmptyDataset,

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
