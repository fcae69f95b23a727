// crates/cpi-core/src/dataset.rs

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::DatasetConfig;
use crate::error::{PipelineError, Result};
use crate::model::{DateRange, Row};
use crate::slug::slugify;
use crate::transform;

/// The dataset as submitted to the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub location: String,
    pub time_period: DateRangeFields,
}

/// Serialized form of [`DateRange`] for catalog payloads.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DateRangeFields {
    pub min_year: i32,
    pub max_year: i32,
}

impl From<DateRange> for DateRangeFields {
    fn from(range: DateRange) -> Self {
        Self {
            min_year: range.min_year,
            max_year: range.max_year,
        }
    }
}

/// One generated CSV ready for upload.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    pub row_count: usize,
}

/// Substitute the literal `[year]` placeholder. The aggregate resource has
/// no year; the placeholder is removed, never left literal.
pub fn render_description(template: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => template.replace("[year]", &year.to_string()),
        None => template.replace("[year]", ""),
    }
}

/// Resource file names derive from the dataset slug plus an optional year.
pub fn resource_file_name(slug: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{slug}-{year}.csv"),
        None => format!("{slug}.csv"),
    }
}

/// Builds the dataset record and writes its resource CSVs into a work
/// directory: one aggregate file over all rows and, when configured, one
/// file per year, newest first.
pub struct DatasetBuilder<'a> {
    config: &'a DatasetConfig,
    work_dir: &'a Path,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(config: &'a DatasetConfig, work_dir: &'a Path) -> Self {
        Self { config, work_dir }
    }

    pub fn build(&self, rows: &[Row]) -> Result<(DatasetRecord, Vec<ResourceFile>)> {
        let time_period = transform::date_range(rows)?;
        let name = slugify(&self.config.title);
        let record = DatasetRecord {
            name: name.clone(),
            title: self.config.title.clone(),
            tags: self.config.tags.clone(),
            location: self.config.location.clone(),
            time_period: time_period.into(),
        };

        let mut resources = Vec::new();
        resources.push(self.write_resource(&name, None, rows)?);
        if self.config.per_year_resources {
            for group in transform::group_by_year(rows) {
                resources.push(self.write_resource(&name, Some(group.year), &group.rows)?);
            }
        }
        Ok((record, resources))
    }

    fn write_resource(&self, slug: &str, year: Option<i32>, rows: &[Row]) -> Result<ResourceFile> {
        let file_name = resource_file_name(slug, year);
        let path = self.work_dir.join(&file_name);
        write_rows_csv(&path, rows)?;
        Ok(ResourceFile {
            name: file_name,
            description: render_description(&self.config.description, year),
            path,
            row_count: rows.len(),
        })
    }
}

/// Write rows as CSV. Column order follows the key order of the first row;
/// later rows may omit columns (blank cells) but never add new ones.
pub fn write_rows_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let first = rows.first().ok_or(PipelineError::EmptyDataset)?;
    let columns = first.columns();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| row.cell(column)))?;
    }
    writer.flush()?;
    Ok(())
}
