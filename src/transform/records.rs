//! Typed views over ratings and movies rows

use crate::data::{columns, require_f64, require_i64, require_str, Row};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRow {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: f64,
}

impl RatingRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            user_id: require_i64(row, columns::USER_ID)?,
            movie_id: require_i64(row, columns::MOVIE_ID)?,
            rating: require_f64(row, columns::RATING)?,
        })
    }
}

/// A movie with its remaining columns kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRow {
    pub movie_id: i64,
    pub title: String,
    pub extra: Row,
}

impl MovieRow {
    /// Columns not carried into `extra`.
    const CONSUMED: &'static [&'static str] = &[columns::MOVIE_ID, columns::TITLE];

    pub fn from_row(row: &Row) -> Result<Self> {
        let extra = row
            .iter()
            .filter(|(name, _)| !Self::CONSUMED.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            movie_id: require_i64(row, columns::MOVIE_ID)?,
            title: require_str(row, columns::TITLE)?.to_string(),
            extra,
        })
    }
}

/// Parse every row, naming the dataset and row index on the first failure.
pub fn parse_all<T>(dataset: &str, rows: &[Row], parse: impl Fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            parse(row).map_err(|e| Error::Schema(format!("{dataset} row {i}: {e}")))
        })
        .collect()
}
