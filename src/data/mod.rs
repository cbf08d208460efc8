//! Row, dataset and page types shared by the service, the client and the
//! transform, plus the source and sink capabilities used at the edges.

mod csv_source;
mod range;
mod sink;
mod staged;

pub use csv_source::CsvDirectory;
pub use range::{parse_date, DateRange, DATE_FORMAT};
pub use sink::{FileSink, MemorySink, OutputSink};
pub use staged::{staged_path, StagedJsonDirectory};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single record: column name to scalar value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Datasets the service knows how to serve.
pub const KNOWN_DATASETS: &[&str] = &[
    "ratings",
    "movies",
    "tags",
    "links",
    "genome-tags",
    "genome-scores",
];

pub const RATINGS: &str = "ratings";
pub const MOVIES: &str = "movies";

/// Column names of the MovieLens tables.
pub mod columns {
    pub const MOVIE_ID: &str = "movieId";
    pub const USER_ID: &str = "userId";
    pub const RATING: &str = "rating";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TITLE: &str = "title";
    pub const GENRES: &str = "genres";
}

pub fn is_known_dataset(name: &str) -> bool {
    KNOWN_DATASETS.contains(&name)
}

/// A named, ordered collection of rows with its authoritative row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub rows: Vec<Row>,
    pub total: usize,
}

impl Dataset {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let total = rows.len();
        Self {
            name: name.into(),
            rows,
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One page of a dataset as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub result: Vec<Row>,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

/// Read access to rows of a named tabular source.
pub trait DatasetSource: Send + Sync {
    fn read_rows(&self, name: &str) -> Result<Vec<Row>>;

    fn read_dataset(&self, name: &str) -> Result<Dataset> {
        Ok(Dataset::new(name, self.read_rows(name)?))
    }
}

/// Integer view of a cell. Floats with no fractional part count as integers.
pub fn cell_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

pub fn cell_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Fetch a required integer column from a row.
pub fn require_i64(row: &Row, column: &str) -> Result<i64> {
    row.get(column)
        .and_then(cell_as_i64)
        .ok_or_else(|| Error::Schema(format!("column '{column}' missing or not an integer")))
}

pub fn require_f64(row: &Row, column: &str) -> Result<f64> {
    row.get(column)
        .and_then(cell_as_f64)
        .ok_or_else(|| Error::Schema(format!("column '{column}' missing or not numeric")))
}

pub fn require_str<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get(column)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Schema(format!("column '{column}' missing or not a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_as_i64_accepts_integral_floats() {
        assert_eq!(cell_as_i64(&json!(7)), Some(7));
        assert_eq!(cell_as_i64(&json!(7.0)), Some(7));
        assert_eq!(cell_as_i64(&json!(7.5)), None);
        assert_eq!(cell_as_i64(&json!("7")), None);
    }

    #[test]
    fn test_require_reports_column_name() {
        let row: Row = json!({"movieId": 1}).as_object().cloned().unwrap();
        let err = require_str(&row, "title").unwrap_err();
        assert!(err.to_string().contains("title"));
        assert_eq!(require_i64(&row, "movieId").unwrap(), 1);
    }

    #[test]
    fn test_known_datasets() {
        assert!(is_known_dataset("genome-scores"));
        assert!(!is_known_dataset("users"));
    }
}
