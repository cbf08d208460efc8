//! Fetch and rank stages: drain datasets into a sink, then aggregate them

use crate::client::{drain_range, PageSource};
use crate::config::PipelineSettings;
use crate::data::{staged_path, Dataset, DatasetSource, DateRange, OutputSink, MOVIES, RATINGS};
use crate::error::{Error, Result};
use crate::transform::{aggregate, AggregateOptions, AggregatedMovie};
use tracing::info;

/// Sink path of the ranked artifact.
pub const RANKED_PATH: &str = "movies/movieswithavgratings.json";

/// Number of ranked rows echoed to the log after ranking.
const PREVIEW_ROWS: usize = 25;

pub struct Pipeline<S, K> {
    source: S,
    sink: K,
    page_size: usize,
    datasets: Vec<String>,
    options: AggregateOptions,
    range: DateRange,
}

impl<S, K> Pipeline<S, K>
where
    S: PageSource,
    K: OutputSink,
{
    pub fn new(source: S, sink: K, settings: &PipelineSettings, page_size: usize) -> Self {
        Self {
            source,
            sink,
            page_size,
            datasets: settings.datasets.clone(),
            options: AggregateOptions {
                min_ratings: settings.min_ratings,
            },
            range: DateRange::default(),
        }
    }

    /// Restrict drained ratings to `range`.
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Drain every configured dataset and stage it as `{name}/{name}.json`.
    pub async fn fetch(&self) -> Result<Vec<Dataset>> {
        let mut fetched = Vec::with_capacity(self.datasets.len());
        for name in &self.datasets {
            info!("Fetching {}...", name);
            let range = if name == RATINGS {
                self.range
            } else {
                DateRange::default()
            };
            let dataset = drain_range(&self.source, name, self.page_size, range).await?;
            info!("Fetched {} {}", dataset.len(), name);

            let path = staged_path(name);
            info!("Writing {} to {}", name, path);
            self.sink
                .write(&path, &serde_json::to_vec(&dataset.rows)?)
                .await?;
            fetched.push(dataset);
        }
        Ok(fetched)
    }

    /// Fetch, then rank the drained ratings and movies.
    pub async fn run(&self) -> Result<Vec<AggregatedMovie>> {
        let fetched = self.fetch().await?;
        let find = |name: &str| {
            fetched
                .iter()
                .find(|d| d.name == name)
                .ok_or_else(|| Error::Config(format!("pipeline.datasets must include {name}")))
        };
        let ratings = find(RATINGS)?;
        let movies = find(MOVIES)?;
        rank(ratings, movies, &self.sink, &self.options).await
    }
}

/// Aggregate, log a preview and write the ranked artifact to the sink.
pub async fn rank<K>(
    ratings: &Dataset,
    movies: &Dataset,
    sink: &K,
    options: &AggregateOptions,
) -> Result<Vec<AggregatedMovie>>
where
    K: OutputSink + ?Sized,
{
    info!(
        "Calculating average ratings and number of raters over {} ratings and {} movies",
        ratings.len(),
        movies.len()
    );
    let ranked = aggregate(ratings, movies, options)?;

    info!("Latest releases with highest ratings:");
    for movie in ranked.iter().take(PREVIEW_ROWS) {
        info!(
            "  {} | {} | {} | avg {:.3} | {} raters",
            movie.movie_id, movie.title, movie.release_year, movie.avg_rating, movie.num_of_ratings
        );
    }

    sink.write(RANKED_PATH, &serde_json::to_vec_pretty(&ranked)?)
        .await?;
    info!("Ranked {} movies into {}", ranked.len(), RANKED_PATH);
    Ok(ranked)
}

/// Rank from previously staged datasets.
pub async fn rank_staged<D, K>(
    source: &D,
    sink: &K,
    options: &AggregateOptions,
) -> Result<Vec<AggregatedMovie>>
where
    D: DatasetSource + ?Sized,
    K: OutputSink + ?Sized,
{
    let movies = source.read_dataset(MOVIES)?;
    info!("Read {} movies", movies.len());
    let ratings = source.read_dataset(RATINGS)?;
    info!("Read {} ratings", ratings.len());
    rank(&ratings, &movies, sink, options).await
}
