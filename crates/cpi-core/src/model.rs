// crates/cpi-core/src/model.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One source record: a country's score for one year, plus whatever other
/// columns the endpoint returns. Keys keep their source order so generated
/// CSVs match the upstream column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Map<String, Value>);

impl Row {
    /// The row's year, if it carries one. Numeric strings are tolerated
    /// because the endpoint has shipped both representations.
    pub fn year(&self) -> Option<i32> {
        match self.0.get("year") {
            Some(Value::Number(n)) => n.as_i64().map(|y| y as i32),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Column names in source order.
    pub fn columns(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Render one cell for CSV output. Strings are written as-is, other
    /// scalars via their JSON form, missing/null values as empty cells.
    pub fn cell(&self, column: &str) -> String {
        match self.0.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// All rows sharing one year, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct YearGroup {
    pub year: i32,
    pub rows: Vec<Row>,
}

/// Inclusive year span covered by a row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub min_year: i32,
    pub max_year: i32,
}
