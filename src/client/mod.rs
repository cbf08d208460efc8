//! Pagination client: drains a dataset through repeated page requests

mod http;

pub use http::MovieRecClient;

use crate::data::{Dataset, DateRange, Page, Row};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub dataset: String,
    pub offset: usize,
    pub limit: usize,
    pub range: DateRange,
}

/// Anything that can answer page requests
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;
}

/// Fetch every row of `dataset`, `page_size` rows per request.
pub async fn drain<S>(source: &S, dataset: &str, page_size: usize) -> Result<Dataset>
where
    S: PageSource + ?Sized,
{
    drain_range(source, dataset, page_size, DateRange::default()).await
}

/// Like [`drain`], forwarding `range` with every request.
///
/// Stops once the offset reaches the total reported by the most recent page.
/// The first failing request aborts the drain and the rows gathered so far are
/// dropped.
pub async fn drain_range<S>(
    source: &S,
    dataset: &str,
    page_size: usize,
    range: DateRange,
) -> Result<Dataset>
where
    S: PageSource + ?Sized,
{
    if page_size == 0 {
        return Err(Error::ClientInput(
            "page size must be greater than 0".to_string(),
        ));
    }

    info!("Draining {} with page size {}", dataset, page_size);

    let mut rows: Vec<Row> = Vec::new();
    let mut offset = 0;
    let mut total: Option<usize> = None;
    let mut requests = 0usize;

    while total.map_or(true, |total| offset < total) {
        let request = PageRequest {
            dataset: dataset.to_string(),
            offset,
            limit: page_size,
            range,
        };
        let page = source.fetch_page(&request).await?;
        requests += 1;

        debug!(
            "Fetched {} rows of {} at offset {} (total {})",
            page.result.len(),
            dataset,
            offset,
            page.total
        );

        rows.extend(page.result);
        offset += page_size;
        total = Some(page.total);
    }

    let total = total.unwrap_or(0);
    info!(
        "Drained {} rows of {} in {} requests",
        rows.len(),
        dataset,
        requests
    );

    Ok(Dataset {
        name: dataset.to_string(),
        rows,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed list of rows and counts requests
    struct StaticPages {
        rows: Vec<Row>,
        requests: AtomicUsize,
        fail_at_offset: Option<usize>,
    }

    impl StaticPages {
        fn with_rows(n: usize) -> Self {
            Self {
                rows: (0..n)
                    .map(|i| json!({"id": i}).as_object().cloned().unwrap())
                    .collect(),
                requests: AtomicUsize::new(0),
                fail_at_offset: None,
            }
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_at_offset == Some(request.offset) {
                return Err(Error::Network("connection reset".to_string()));
            }
            Ok(Page {
                result: self
                    .rows
                    .iter()
                    .skip(request.offset)
                    .take(request.limit)
                    .cloned()
                    .collect(),
                offset: request.offset,
                limit: request.limit,
                total: self.rows.len(),
            })
        }
    }

    #[tokio::test]
    async fn test_drain_reconstructs_dataset_in_order() {
        for (n, page_size) in [(1, 1), (10, 3), (10, 5), (7, 100), (100, 7)] {
            let source = StaticPages::with_rows(n);
            let dataset = drain(&source, "links", page_size).await.unwrap();

            assert_eq!(dataset.rows, source.rows, "n={n} page_size={page_size}");
            assert_eq!(dataset.total, n);
            assert_eq!(source.requests(), n.div_ceil(page_size));
        }
    }

    #[tokio::test]
    async fn test_empty_dataset_takes_one_request() {
        let source = StaticPages::with_rows(0);
        let dataset = drain(&source, "tags", 10).await.unwrap();

        assert!(dataset.is_empty());
        assert_eq!(dataset.total, 0);
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn test_failure_aborts_drain() {
        let mut source = StaticPages::with_rows(10);
        source.fail_at_offset = Some(4);

        let err = drain(&source, "movies", 2).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(source.requests(), 3);
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected_without_request() {
        let source = StaticPages::with_rows(3);
        let err = drain(&source, "movies", 0).await.unwrap_err();
        assert!(err.is_client_input());
        assert_eq!(source.requests(), 0);
    }

    #[tokio::test]
    async fn test_range_forwarded_on_every_request() {
        struct RecordingSource(std::sync::Mutex<Vec<PageRequest>>);

        #[async_trait]
        impl PageSource for RecordingSource {
            async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
                self.0.lock().unwrap().push(request.clone());
                Ok(Page {
                    result: Vec::new(),
                    offset: request.offset,
                    limit: request.limit,
                    total: 3,
                })
            }
        }

        let source = RecordingSource(std::sync::Mutex::new(Vec::new()));
        let range = DateRange::parse(Some("2019-01-01"), None).unwrap();
        drain_range(&source, "ratings", 2, range).await.unwrap();

        let requests = source.0.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].offset, 2);
        assert!(requests.iter().all(|r| r.range == range));
    }
}
