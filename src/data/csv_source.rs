//! CSV-backed dataset source with per-column type inference

use super::{DatasetSource, Row};
use crate::error::Result;
use serde_json::{Number, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::debug;

/// Reads `{dir}/{name}.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl DatasetSource for CsvDirectory {
    fn read_rows(&self, name: &str) -> Result<Vec<Row>> {
        let path = self.path_for(name);
        debug!("Reading {} from {}", name, path.display());
        let file = File::open(&path)?;
        parse_csv(BufReader::new(file))
    }
}

/// Column type decided from every non-empty cell of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Integer;
        for cell in cells.filter(|c| !c.is_empty()) {
            match kind {
                ColumnKind::Integer if cell.parse::<i64>().is_ok() => {}
                ColumnKind::Integer | ColumnKind::Float if cell.parse::<f64>().is_ok() => {
                    kind = ColumnKind::Float;
                }
                _ => return ColumnKind::Text,
            }
        }
        kind
    }

    fn convert(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnKind::Integer => cell.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            ColumnKind::Float => cell
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ColumnKind::Text => Value::String(cell.to_string()),
        }
    }
}

/// Parse CSV with a header line into rows, inferring one type per column.
pub(crate) fn parse_csv<R: Read>(input: R) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<csv::StringRecord>, csv::Error>>()?;

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|i| ColumnKind::infer(records.iter().map(|r| r.get(i).unwrap_or(""))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(&kinds)
                .enumerate()
                .map(|(i, (header, kind))| {
                    (header.to_string(), kind.convert(record.get(i).unwrap_or("")))
                })
                .collect::<Row>()
        })
        .collect();

    Ok(rows)
}
