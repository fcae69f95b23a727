//! Client for a CKAN-style data catalog: dataset upsert, resource upload,
//! showcase creation and association, all through the action API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog origin, e.g. `https://data.example.org`.
    pub base_url: String,
    /// API key sent in the `Authorization` header.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.example.org".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog rejected {action} with status {status}: {message}")]
    Api {
        action: String,
        status: StatusCode,
        message: String,
    },

    #[error("unexpected response from {action}: {body}")]
    InvalidResponse { action: String, body: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dataset record as the catalog expects it.
#[derive(Debug, Clone)]
pub struct DatasetPayload {
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub locations: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    /// Extra fields merged verbatim into the create body. Computed fields
    /// win on key collisions.
    pub extras: Map<String, Value>,
}

impl DatasetPayload {
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(self.name));
        body.insert("title".to_string(), json!(self.title));
        body.insert("tags".to_string(), name_list(&self.tags));
        body.insert("groups".to_string(), name_list(&self.locations));
        body.insert(
            "dataset_date".to_string(),
            json!(format!(
                "[{}-01-01 TO {}-12-31]",
                self.start_year, self.end_year
            )),
        );
        for (key, value) in &self.extras {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(body)
    }
}

/// One tabular file to attach to a dataset.
#[derive(Debug, Clone)]
pub struct ResourcePayload {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
}

/// Supplementary display record shown next to the dataset.
#[derive(Debug, Clone)]
pub struct ShowcasePayload {
    pub name: String,
    pub title: String,
    pub notes: String,
    pub url: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

impl ShowcasePayload {
    fn to_body(&self) -> Value {
        json!({
            "name": self.name,
            "title": self.title,
            "notes": self.notes,
            "url": self.url,
            "image_url": self.image_url,
            "tags": name_list(&self.tags),
        })
    }
}

fn name_list(names: &[String]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|name| json!({ "name": name }))
            .collect(),
    )
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Create the dataset, or update it in place when it already exists.
    async fn upsert_dataset(&self, dataset: &DatasetPayload) -> Result<(), CatalogError>;
    /// Attach one generated file to an existing dataset.
    async fn upload_resource(
        &self,
        dataset_name: &str,
        resource: &ResourcePayload,
    ) -> Result<(), CatalogError>;
    async fn create_showcase(&self, showcase: &ShowcasePayload) -> Result<(), CatalogError>;
    async fn associate_showcase(
        &self,
        showcase_name: &str,
        dataset_name: &str,
    ) -> Result<(), CatalogError>;
}

/// Envelope every action endpoint wraps its result in.
#[derive(Debug, Deserialize)]
struct ActionResponse {
    success: bool,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "__type", default)]
    kind: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CkanCatalog {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl CkanCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::Configuration(
                "catalog API key cannot be empty".into(),
            ));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| CatalogError::Configuration(format!("invalid base URL: {err}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cpi-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CatalogError::Http {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    fn action_url(&self, action: &str) -> Result<Url, CatalogError> {
        self.base_url
            .join(&format!("api/3/action/{action}"))
            .map_err(|err| CatalogError::Configuration(format!("invalid action URL: {err}")))
    }

    async fn post_action(&self, action: &str, body: &Value) -> Result<(), CatalogError> {
        let url = self.action_url(action)?;
        debug!(action, "calling catalog");
        let response = self
            .client
            .post(url.clone())
            .header("Authorization", self.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;
        Self::decode(action, url, response).await
    }

    async fn decode(
        action: &str,
        url: Url,
        response: reqwest::Response,
    ) -> Result<(), CatalogError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;
        let envelope: ActionResponse =
            serde_json::from_str(&text).map_err(|_| CatalogError::InvalidResponse {
                action: action.to_string(),
                body: snippet(&text),
            })?;
        if status.is_success() && envelope.success {
            return Ok(());
        }
        let message = envelope
            .error
            .and_then(|err| err.message.or(err.kind))
            .unwrap_or_else(|| snippet(&text));
        Err(CatalogError::Api {
            action: action.to_string(),
            status,
            message,
        })
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

#[async_trait]
impl Catalog for CkanCatalog {
    async fn upsert_dataset(&self, dataset: &DatasetPayload) -> Result<(), CatalogError> {
        let mut body = dataset.to_body();
        match self.post_action("package_create", &body).await {
            Err(CatalogError::Api { status, .. }) if status == StatusCode::CONFLICT => {
                info!(name = %dataset.name, "dataset already exists, updating");
                if let Value::Object(map) = &mut body {
                    map.insert("id".to_string(), json!(dataset.name));
                }
                self.post_action("package_update", &body).await
            }
            other => other,
        }
    }

    async fn upload_resource(
        &self,
        dataset_name: &str,
        resource: &ResourcePayload,
    ) -> Result<(), CatalogError> {
        let url = self.action_url("resource_create")?;
        let bytes = tokio::fs::read(&resource.path).await?;
        let part = Part::bytes(bytes)
            .file_name(resource.name.clone())
            .mime_str("text/csv")
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;
        let form = Form::new()
            .text("package_id", dataset_name.to_string())
            .text("name", resource.name.clone())
            .text("description", resource.description.clone())
            .text("format", "CSV")
            .part("upload", part);

        debug!(resource = %resource.name, "uploading resource");
        let response = self
            .client
            .post(url.clone())
            .header("Authorization", self.api_key.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;
        Self::decode("resource_create", url, response).await
    }

    async fn create_showcase(&self, showcase: &ShowcasePayload) -> Result<(), CatalogError> {
        self.post_action("ckanext_showcase_create", &showcase.to_body())
            .await
    }

    async fn associate_showcase(
        &self,
        showcase_name: &str,
        dataset_name: &str,
    ) -> Result<(), CatalogError> {
        let body = json!({
            "showcase_id": showcase_name,
            "package_id": dataset_name,
        });
        self.post_action("ckanext_showcase_package_association_create", &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_body_encodes_tags_locations_and_date_range() {
        let payload = DatasetPayload {
            name: "corruption-perceptions-index".to_string(),
            title: "Corruption Perceptions Index".to_string(),
            tags: vec!["corruption".to_string()],
            locations: vec!["world".to_string()],
            start_year: 2012,
            end_year: 2024,
            extras: Map::new(),
        };
        let body = payload.to_body();
        assert_eq!(body["name"], "corruption-perceptions-index");
        assert_eq!(body["tags"][0]["name"], "corruption");
        assert_eq!(body["groups"][0]["name"], "world");
        assert_eq!(body["dataset_date"], "[2012-01-01 TO 2024-12-31]");
    }

    #[test]
    fn extras_never_override_computed_fields() {
        let mut extras = Map::new();
        extras.insert("name".to_string(), json!("spoofed"));
        extras.insert("license_id".to_string(), json!("cc-by"));
        let payload = DatasetPayload {
            name: "cpi".to_string(),
            title: "CPI".to_string(),
            tags: vec![],
            locations: vec![],
            start_year: 2020,
            end_year: 2021,
            extras,
        };
        let body = payload.to_body();
        assert_eq!(body["name"], "cpi");
        assert_eq!(body["license_id"], "cc-by");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = CkanCatalog::new(CatalogConfig::default()).expect_err("should fail");
        assert!(matches!(err, CatalogError::Configuration(_)));
    }
}
