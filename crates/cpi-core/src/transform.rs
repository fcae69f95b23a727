// crates/cpi-core/src/transform.rs

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::model::{DateRange, Row, YearGroup};

/// Partition rows by year, newest year first. Rows keep their source order
/// within each group. Rows without a usable year are dropped with a warning
/// rather than aborting the batch.
pub fn group_by_year(rows: &[Row]) -> Vec<YearGroup> {
    let mut by_year: BTreeMap<i32, Vec<Row>> = BTreeMap::new();
    for row in rows {
        match row.year() {
            Some(year) => by_year.entry(year).or_default().push(row.clone()),
            None => warn!("dropping row without a usable year value"),
        }
    }
    by_year
        .into_iter()
        .rev()
        .map(|(year, rows)| YearGroup { year, rows })
        .collect()
}

/// Min and max year over all rows that carry one. Never calls an extremum
/// on an empty sequence: a row set with no usable years is a typed error.
pub fn date_range(rows: &[Row]) -> Result<DateRange> {
    let mut years = rows.iter().filter_map(Row::year);
    let first = years.next().ok_or(PipelineError::EmptyDataset)?;
    let (min_year, max_year) = years.fold((first, first), |(lo, hi), year| {
        (lo.min(year), hi.max(year))
    });
    Ok(DateRange { min_year, max_year })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).expect("rows fixture")
    }

    #[test]
    fn groups_by_year_descending() {
        let rows = rows(json!([
            {"year": 2023, "score": 50},
            {"year": 2024, "score": 60},
            {"year": 2023, "score": 40},
        ]));
        let groups = group_by_year(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].year, 2024);
        assert_eq!(groups[0].rows.len(), 1);
        assert_eq!(groups[1].year, 2023);
        assert_eq!(groups[1].rows.len(), 2);
        // source order within the 2023 group
        assert_eq!(groups[1].rows[0].cell("score"), "50");
        assert_eq!(groups[1].rows[1].cell("score"), "40");
    }

    #[test]
    fn grouping_is_a_partition() {
        let rows = rows(json!([
            {"year": 2021, "country": "a"},
            {"year": 2022, "country": "b"},
            {"year": 2021, "country": "c"},
            {"year": 2020, "country": "d"},
        ]));
        let groups = group_by_year(&rows);
        let total: usize = groups.iter().map(|g| g.rows.len()).sum();
        assert_eq!(total, rows.len());
        for group in &groups {
            for row in &group.rows {
                assert_eq!(row.year(), Some(group.year));
            }
        }
    }

    #[test]
    fn rows_without_year_are_dropped() {
        let rows = rows(json!([
            {"year": 2022, "country": "a"},
            {"country": "no-year"},
        ]));
        let groups = group_by_year(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows.len(), 1);
    }

    #[test]
    fn date_range_bounds_every_year() {
        let rows = rows(json!([
            {"year": 2023, "score": 50},
            {"year": 2024, "score": 60},
            {"year": 2023, "score": 40},
        ]));
        let range = date_range(&rows).expect("range");
        assert_eq!(range.min_year, 2023);
        assert_eq!(range.max_year, 2024);
        for row in &rows {
            let year = row.year().expect("year");
            assert!(range.min_year <= year && year <= range.max_year);
        }
    }

    #[test]
    fn date_range_skips_rows_missing_year() {
        let rows = rows(json!([
            {"country": "no-year"},
            {"year": 2019},
        ]));
        let range = date_range(&rows).expect("range");
        assert_eq!(range.min_year, 2019);
        assert_eq!(range.max_year, 2019);
    }

    #[test]
    fn empty_input_is_a_typed_error() {
        assert!(matches!(
            date_range(&[]),
            Err(PipelineError::EmptyDataset)
        ));
        let yearless = rows(json!([{"country": "a"}, {"country": "b"}]));
        assert!(matches!(
            date_range(&yearless),
            Err(PipelineError::EmptyDataset)
        ));
    }
}
