//! Aggregation of ratings onto movies.
//!
//! The transform runs as a sequence of independent steps:
//!
//! 1. group ratings per movie (mean rating, distinct raters)
//! 2. inner join the statistics onto movies
//! 3. pull the release year out of the title and strip it from the title
//! 4. drop the `genres` column
//! 5. keep rows with a plausible release year
//! 6. order by release year, then rating, both descending
//!
//! Everything here is pure; I/O lives in [`crate::pipeline`].

mod records;
mod sorter;
mod title;

pub use records::{parse_all, MovieRow, RatingRow};
pub use sorter::{SortField, SortKey, SortOrder, Sorter};
pub use title::{extract_parenthesized, plausible_year, strip_annotation};

use crate::data::{columns, Dataset, Row};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// One ranked movie as written to the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMovie {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    /// Remaining movie columns, `genres` excluded.
    #[serde(flatten)]
    pub extra: Row,
    pub avg_rating: f64,
    pub num_of_ratings: usize,
    pub release_year: u32,
}

/// Columns the transform writes itself; same-named input columns are dropped.
const DERIVED_COLUMNS: &[&str] = &["avg_rating", "num_of_ratings", "release_year"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Minimum number of distinct raters for a movie to be kept.
    pub min_ratings: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { min_ratings: 1 }
    }
}

/// Per-movie rating statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovieStats {
    pub avg_rating: f64,
    pub num_of_ratings: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    users: HashSet<i64>,
}

/// Group ratings by movie id, ascending.
pub fn group_ratings(ratings: &[RatingRow]) -> BTreeMap<i64, MovieStats> {
    let mut groups: HashMap<i64, Accumulator> = HashMap::new();
    for rating in ratings {
        let acc = groups.entry(rating.movie_id).or_default();
        acc.sum += rating.rating;
        acc.count += 1;
        acc.users.insert(rating.user_id);
    }

    groups
        .into_iter()
        .map(|(movie_id, acc)| {
            let stats = MovieStats {
                avg_rating: acc.sum / acc.count as f64,
                num_of_ratings: acc.users.len(),
            };
            (movie_id, stats)
        })
        .collect()
}

/// Inner join: movies without statistics are dropped, movie order is kept.
pub fn join_movies(
    movies: Vec<MovieRow>,
    stats: &BTreeMap<i64, MovieStats>,
) -> Vec<(MovieRow, MovieStats)> {
    movies
        .into_iter()
        .filter_map(|movie| stats.get(&movie.movie_id).map(|s| (movie, *s)))
        .collect()
}

/// Derive the output record, or `None` when the title carries no plausible year.
pub fn clean_joined(movie: MovieRow, stats: MovieStats) -> Option<AggregatedMovie> {
    let release_year = extract_parenthesized(&movie.title).and_then(plausible_year)?;
    let title = strip_annotation(&movie.title).to_string();

    let extra = movie
        .extra
        .into_iter()
        .filter(|(name, _)| name != columns::GENRES && !DERIVED_COLUMNS.contains(&name.as_str()))
        .collect();

    Some(AggregatedMovie {
        movie_id: movie.movie_id,
        title,
        extra,
        avg_rating: stats.avg_rating,
        num_of_ratings: stats.num_of_ratings,
        release_year,
    })
}

/// Rank movies by release year and average rating.
pub fn aggregate(
    ratings: &Dataset,
    movies: &Dataset,
    options: &AggregateOptions,
) -> Result<Vec<AggregatedMovie>> {
    let ratings = parse_all(&ratings.name, &ratings.rows, RatingRow::from_row)?;
    let movies = parse_all(&movies.name, &movies.rows, MovieRow::from_row)?;

    let mut stats = group_ratings(&ratings);
    let grouped = stats.len();
    stats.retain(|_, s| s.num_of_ratings >= options.min_ratings);
    debug!(
        "Grouped {} ratings into {} movies ({} below min_ratings)",
        ratings.len(),
        grouped,
        grouped - stats.len()
    );

    let movie_count = movies.len();
    let joined = join_movies(movies, &stats);
    let joined_count = joined.len();
    debug!("Joined {} of {} movies", joined_count, movie_count);

    let mut ranked: Vec<AggregatedMovie> = joined
        .into_iter()
        .filter_map(|(movie, stats)| clean_joined(movie, stats))
        .collect();
    debug!(
        "Dropped {} movies without a plausible release year",
        joined_count - ranked.len()
    );

    Sorter::ranking().sort(&mut ranked);
    Ok(ranked)
}
