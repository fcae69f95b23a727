use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cpi_catalog::{
    Catalog, CatalogConfig, CatalogError, CkanCatalog, DatasetPayload, ResourcePayload,
    ShowcasePayload,
};
use cpi_core::config::{load_dataset_defaults, ScraperConfig};
use cpi_core::dataset::{DatasetBuilder, DatasetRecord, ResourceFile};
use cpi_core::retrieve::{Retriever, RetrieverConfig};
use cpi_core::showcase::{build_showcase, ShowcaseRecord};
use serde_json::{json, Map, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SOURCE_FILENAME: &str = "cpi.json";
const UPDATED_BY_SCRIPT: &str = "CPI catalog scraper";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetches the Corruption Perceptions Index and publishes it to a data catalog",
    long_about = None
)]
struct Cli {
    /// Project configuration file
    #[arg(long, default_value = "config/project.yaml")]
    config: PathBuf,

    /// Static dataset metadata merged into the catalog record
    #[arg(long, default_value = "config/dataset_static.yaml")]
    dataset_static: PathBuf,

    /// Directory for generated CSV files (a temp dir by default)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Persist downloaded data under the saved-data directory
    #[arg(long)]
    save: bool,

    /// Use previously saved data instead of downloading
    #[arg(long)]
    use_saved: bool,

    /// Generate files but skip all catalog calls
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = ScraperConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let dataset_defaults = if cli.dataset_static.exists() {
        load_dataset_defaults(&cli.dataset_static).with_context(|| {
            format!(
                "failed to load dataset metadata from {}",
                cli.dataset_static.display()
            )
        })?
    } else {
        Map::new()
    };

    let work_dir = cli
        .work_dir
        .unwrap_or_else(|| std::env::temp_dir().join("cpi-scraper"));
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("failed to create work directory {}", work_dir.display()))?;

    let retriever = Retriever::new(RetrieverConfig {
        save: cli.save,
        use_saved: cli.use_saved,
        ..RetrieverConfig::default()
    })?;
    let rows = match retriever
        .download_rows(&config.base_url, SOURCE_FILENAME)
        .await
    {
        Ok(rows) => rows,
        Err(err) => {
            error!("could not get data from {}: {err}", config.base_url);
            info!("no data available, skipping dataset generation");
            return Ok(());
        }
    };
    info!("downloaded {} rows", rows.len());

    let (record, resources) = DatasetBuilder::new(&config.dataset, &work_dir)
        .build(&rows)
        .context("dataset generation failed")?;
    let showcase = build_showcase(&config.showcase, &record);
    info!(dataset = %record.name, resources = resources.len(), "generated dataset files");

    if cli.dry_run {
        info!(work_dir = %work_dir.display(), "dry run, skipping catalog publication");
        return Ok(());
    }

    dotenvy::dotenv().ok();
    let api_key = std::env::var(&config.catalog.api_key_env).with_context(|| {
        format!(
            "{} must be set to publish to the catalog",
            config.catalog.api_key_env
        )
    })?;
    let catalog = CkanCatalog::new(CatalogConfig {
        base_url: config.catalog.base_url.clone(),
        api_key,
        ..CatalogConfig::default()
    })?;

    // A catalog rejection skips this dataset but never fails the batch run.
    match publish(&catalog, &record, &resources, &showcase, dataset_defaults).await {
        Ok(()) => info!(dataset = %record.name, "dataset published"),
        Err(err) => error!("catalog rejected dataset {}: {err}", record.name),
    }
    Ok(())
}

async fn publish(
    catalog: &dyn Catalog,
    record: &DatasetRecord,
    resources: &[ResourceFile],
    showcase: &ShowcaseRecord,
    mut extras: Map<String, Value>,
) -> std::result::Result<(), CatalogError> {
    extras.insert(
        "updated_by_script".to_string(),
        json!(format!(
            "{} ({})",
            UPDATED_BY_SCRIPT,
            Utc::now().format("%Y-%m-%d")
        )),
    );
    let payload = DatasetPayload {
        name: record.name.clone(),
        title: record.title.clone(),
        tags: record.tags.clone(),
        locations: vec![record.location.clone()],
        start_year: record.time_period.min_year,
        end_year: record.time_period.max_year,
        extras,
    };

    catalog.upsert_dataset(&payload).await?;
    for resource in resources {
        catalog
            .upload_resource(
                &record.name,
                &ResourcePayload {
                    name: resource.name.clone(),
                    description: resource.description.clone(),
                    path: resource.path.clone(),
                },
            )
            .await?;
    }
    catalog
        .create_showcase(&ShowcasePayload {
            name: showcase.name.clone(),
            title: showcase.title.clone(),
            notes: showcase.notes.clone(),
            url: showcase.url.clone(),
            image_url: showcase.image_url.clone(),
            tags: showcase.tags.clone(),
        })
        .await?;
    catalog
        .associate_showcase(&showcase.name, &record.name)
        .await?;
    Ok(())
}
