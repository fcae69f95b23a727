// crates/cpi-core/src/config.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Project configuration, loaded from YAML once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Source endpoint returning the full JSON array of rows.
    pub base_url: String,
    pub dataset: DatasetConfig,
    pub showcase: ShowcaseConfig,
    #[serde(default)]
    pub catalog: CatalogSection,
}

impl ScraperConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub title: String,
    /// Resource description template; the literal `[year]` is replaced per
    /// resource, or removed for the aggregate file.
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_location")]
    pub location: String,
    /// Generate one resource per distinct year in addition to the aggregate.
    #[serde(default = "default_per_year_resources")]
    pub per_year_resources: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowcaseConfig {
    /// Defaults to the dataset title when not set.
    #[serde(default)]
    pub title: Option<String>,
    pub notes: String,
    pub url: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    /// Environment variable holding the catalog API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_location() -> String {
    "world".to_string()
}

fn default_per_year_resources() -> bool {
    true
}

fn default_catalog_base_url() -> String {
    "https://data.example.org".to_string()
}

fn default_api_key_env() -> String {
    "CATALOG_API_KEY".to_string()
}

/// Static dataset metadata (license, maintainer, update frequency, ...) kept
/// in its own YAML file and merged verbatim into the catalog create payload.
pub fn load_dataset_defaults(path: impl AsRef<Path>) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
base_url: "https://example.org/cpi.json"
dataset:
  title: Corruption Perceptions Index
  description: "CPI scores [year]"
  tags:
    - corruption
    - governance
showcase:
  notes: Click to go to showcase
  url: "https://example.org/report.pdf"
  image_url: "https://example.org/map.jpg"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: ScraperConfig = serde_yaml::from_str(MINIMAL).expect("parse");
        assert_eq!(config.base_url, "https://example.org/cpi.json");
        assert_eq!(config.dataset.location, "world");
        assert!(config.dataset.per_year_resources);
        assert_eq!(config.catalog.api_key_env, "CATALOG_API_KEY");
        assert!(config.showcase.title.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let text = format!(
            "{MINIMAL}catalog:\n  base_url: \"https://stage.example.org\"\n  api_key_env: STAGE_KEY\n"
        );
        let config: ScraperConfig = serde_yaml::from_str(&text).expect("parse");
        assert_eq!(config.catalog.base_url, "https://stage.example.org");
        assert_eq!(config.catalog.api_key_env, "STAGE_KEY");
    }
}
