// crates/cpi-core/src/showcase.rs

use serde::Serialize;

use crate::config::ShowcaseConfig;
use crate::dataset::DatasetRecord;

/// Supplementary display record associated with the dataset in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ShowcaseRecord {
    pub name: String,
    pub title: String,
    pub notes: String,
    pub url: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

/// Pure assembly: name derives from the dataset slug, tags are copied from
/// the dataset, the title falls back to the dataset title.
pub fn build_showcase(config: &ShowcaseConfig, dataset: &DatasetRecord) -> ShowcaseRecord {
    ShowcaseRecord {
        name: format!("{}-showcase", dataset.name),
        title: config
            .title
            .clone()
            .unwrap_or_else(|| dataset.title.clone()),
        notes: config.notes.clone(),
        url: config.url.clone(),
        image_url: config.image_url.clone(),
        tags: dataset.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DateRangeFields;

    fn dataset() -> DatasetRecord {
        DatasetRecord {
            name: "corruption-perceptions-index".to_string(),
            title: "Corruption Perceptions Index".to_string(),
            tags: vec!["corruption".to_string(), "governance".to_string()],
            location: "world".to_string(),
            time_period: DateRangeFields {
                min_year: 2012,
                max_year: 2024,
            },
        }
    }

    fn showcase_config() -> ShowcaseConfig {
        serde_yaml::from_str(
            r#"
notes: Click to go to showcase
url: "https://example.org/report.pdf"
image_url: "https://example.org/map.jpg"
"#,
        )
        .expect("config fixture")
    }

    #[test]
    fn name_appends_showcase_suffix_and_copies_tags() {
        let showcase = build_showcase(&showcase_config(), &dataset());
        assert_eq!(showcase.name, "corruption-perceptions-index-showcase");
        assert_eq!(showcase.title, "Corruption Perceptions Index");
        assert_eq!(showcase.tags, dataset().tags);
    }

    #[test]
    fn configured_title_wins_over_dataset_title() {
        let mut config = showcase_config();
        config.title = Some("CPI 2024 report".to_string());
        let showcase = build_showcase(&config, &dataset());
        assert_eq!(showcase.title, "CPI 2024 report");
    }
}
