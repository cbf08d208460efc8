//! Calendar date range used to filter ratings by timestamp

use crate::error::{Error, Result};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `[start, end)` over calendar dates; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parse optional `YYYY-MM-DD` bounds.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: start.map(parse_date).transpose()?,
            end: end.map(parse_date).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive lower bound in epoch seconds.
    pub fn start_epoch(&self) -> Option<i64> {
        self.start.map(midnight_epoch)
    }

    /// Exclusive upper bound in epoch seconds.
    pub fn end_epoch(&self) -> Option<i64> {
        self.end.map(midnight_epoch)
    }

    /// Whether an epoch-second timestamp falls inside the range
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start_epoch().map_or(true, |start| timestamp >= start)
            && self.end_epoch().map_or(true, |end| timestamp < end)
    }

    /// Query parameters for the bounds that are set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start_date", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end_date", end.format(DATE_FORMAT).to_string()));
        }
        pairs
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::ClientInput(format!("invalid date '{value}', expected YYYY-MM-DD: {e}")))
}

fn midnight_epoch(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}
