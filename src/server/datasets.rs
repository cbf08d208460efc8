//! Immutable in-memory tables served by the data service

use crate::data::{
    columns, require_i64, DatasetSource, DateRange, Page, Row, KNOWN_DATASETS, RATINGS,
};
use crate::error::Result;
use std::collections::HashMap;
use tracing::{info, warn};

/// Offset/limit window plus the optional ratings date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub offset: usize,
    pub limit: usize,
    pub range: DateRange,
}

#[derive(Debug)]
enum Table {
    Plain(Vec<Row>),
    /// Rows sorted by (timestamp, userId, movieId); `timestamps[i]` belongs to `rows[i]`.
    Ratings { rows: Vec<Row>, timestamps: Vec<i64> },
}

impl Table {
    fn ratings(rows: Vec<Row>) -> Result<Self> {
        let mut keyed = rows
            .into_iter()
            .map(|row| -> Result<((i64, i64, i64), Row)> {
                let key = (
                    require_i64(&row, columns::TIMESTAMP)?,
                    require_i64(&row, columns::USER_ID)?,
                    require_i64(&row, columns::MOVIE_ID)?,
                );
                Ok((key, row))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by_key(|(key, _)| *key);

        let timestamps = keyed.iter().map(|((ts, _, _), _)| *ts).collect();
        let rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(Table::Ratings { rows, timestamps })
    }

    fn len(&self) -> usize {
        match self {
            Table::Plain(rows) | Table::Ratings { rows, .. } => rows.len(),
        }
    }

    /// Rows visible under `range`. Only ratings honour the date filter.
    fn filtered(&self, range: &DateRange) -> &[Row] {
        match self {
            Table::Plain(rows) => rows,
            Table::Ratings { rows, timestamps } => {
                let lo = range
                    .start_epoch()
                    .map(|start| timestamps.partition_point(|&t| t < start))
                    .unwrap_or(0);
                let hi = range
                    .end_epoch()
                    .map(|end| timestamps.partition_point(|&t| t < end))
                    .unwrap_or(rows.len());
                &rows[lo..hi.max(lo)]
            }
        }
    }
}

/// The set of datasets that loaded successfully at startup.
#[derive(Debug, Default)]
pub struct DatasetStore {
    tables: HashMap<String, Table>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every known dataset from `source`. Failures are logged and leave
    /// that dataset unavailable.
    pub fn load<S: DatasetSource + ?Sized>(source: &S) -> Self {
        let mut store = Self::new();
        for name in KNOWN_DATASETS {
            match source
                .read_rows(name)
                .and_then(|rows| store.insert(name, rows))
            {
                Ok(()) => info!("Loaded dataset {} ({} rows)", name, store.total(name)),
                Err(e) => warn!("Dataset {} unavailable: {}", name, e),
            }
        }
        store
    }

    /// Register rows under `name`. Ratings are validated and sorted here.
    pub fn insert(&mut self, name: &str, rows: Vec<Row>) -> Result<()> {
        let table = if name == RATINGS {
            Table::ratings(rows)?
        } else {
            Table::Plain(rows)
        };
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn available(&self) -> Vec<&str> {
        KNOWN_DATASETS
            .iter()
            .copied()
            .filter(|name| self.is_available(name))
            .collect()
    }

    fn total(&self, name: &str) -> usize {
        self.tables.get(name).map(Table::len).unwrap_or(0)
    }

    /// Serve one page, or `None` when the dataset is not available.
    pub fn page(&self, name: &str, query: &PageQuery) -> Option<Page> {
        let rows = self.tables.get(name)?.filtered(&query.range);
        let result = rows
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Some(Page {
            result,
            offset: query.offset,
            limit: query.limit,
            total: rows.len(),
        })
    }
}
