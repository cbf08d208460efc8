//! Multi-key ordering for aggregated movies
//!
//! Keys are compared in sequence; the first non-equal comparison decides.

use super::AggregatedMovie;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ReleaseYear,
    AvgRating,
    MovieId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortField {
    pub const fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }
}

/// Sorting configuration
#[derive(Debug, Clone)]
pub struct Sorter {
    pub fields: Vec<SortField>,
}

impl Sorter {
    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    /// Newest release first, best rated first within a year, then movie id.
    pub fn ranking() -> Self {
        Self::new(vec![
            SortField::new(SortKey::ReleaseYear, SortOrder::Descending),
            SortField::new(SortKey::AvgRating, SortOrder::Descending),
            SortField::new(SortKey::MovieId, SortOrder::Ascending),
        ])
    }

    /// Stable sort in place
    pub fn sort(&self, items: &mut [AggregatedMovie]) {
        items.sort_by(|a, b| self.compare_items(a, b));
    }

    fn compare_items(&self, a: &AggregatedMovie, b: &AggregatedMovie) -> Ordering {
        for field in &self.fields {
            let ordering = match field.key {
                SortKey::ReleaseYear => a.release_year.cmp(&b.release_year),
                SortKey::AvgRating => a.avg_rating.total_cmp(&b.avg_rating),
                SortKey::MovieId => a.movie_id.cmp(&b.movie_id),
            };
            let ordering = match field.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;

    fn movie(movie_id: i64, release_year: u32, avg_rating: f64) -> AggregatedMovie {
        AggregatedMovie {
            movie_id,
            title: format!("Movie {movie_id}"),
            extra: Row::new(),
            avg_rating,
            num_of_ratings: 1,
            release_year,
        }
    }

    fn ids(items: &[AggregatedMovie]) -> Vec<i64> {
        items.iter().map(|m| m.movie_id).collect()
    }

    #[test]
    fn test_newer_year_first() {
        let mut items = vec![movie(1, 2019, 5.0), movie(2, 2020, 1.0)];
        Sorter::ranking().sort(&mut items);
        assert_eq!(ids(&items), vec![2, 1]);
    }

    #[test]
    fn test_higher_rating_first_within_year() {
        let mut items = vec![movie(1, 2020, 3.0), movie(2, 2020, 4.5)];
        Sorter::ranking().sort(&mut items);
        assert_eq!(ids(&items), vec![2, 1]);
    }

    #[test]
    fn test_movie_id_breaks_remaining_ties() {
        let mut items = vec![movie(9, 2020, 4.0), movie(3, 2020, 4.0), movie(5, 2020, 4.0)];
        Sorter::ranking().sort(&mut items);
        assert_eq!(ids(&items), vec![3, 5, 9]);
    }

    #[test]
    fn test_single_ascending_field() {
        let mut items = vec![movie(1, 2001, 2.0), movie(2, 1999, 2.0)];
        Sorter::new(vec![SortField::new(SortKey::ReleaseYear, SortOrder::Ascending)]).sort(&mut items);
        assert_eq!(ids(&items), vec![2, 1]);
    }
}
