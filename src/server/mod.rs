//! HTTP data service exposing the MovieLens tables page by page

mod auth;
mod datasets;

pub use auth::{parse_basic_auth, CredentialStore};
pub use datasets::{DatasetStore, PageQuery};

use crate::config::ServiceSettings;
use crate::data::{CsvDirectory, DateRange, KNOWN_DATASETS, RATINGS};
use crate::error::{Error, Result};
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Data service serving preloaded datasets behind basic auth
pub struct DataService {
    state: Arc<ServiceState>,
    host: String,
    port: u16,
}

impl DataService {
    pub fn new(store: DatasetStore, credentials: CredentialStore, settings: &ServiceSettings) -> Self {
        Self {
            state: Arc::new(ServiceState {
                store,
                credentials,
                default_limit: settings.default_page_size,
            }),
            host: settings.host.clone(),
            port: settings.port,
        }
    }

    /// Build the service from settings, loading tables from `data_dir`.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        let (username, password) = settings.credentials()?;
        let credentials = CredentialStore::single(username, password);
        let store = DatasetStore::load(&CsvDirectory::new(&settings.data_dir));
        Ok(Self::new(store, credentials, settings))
    }

    /// Same as [`DataService::from_settings`], with the CSV loading moved
    /// onto the blocking thread pool.
    pub async fn load(settings: ServiceSettings) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::from_settings(&settings))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the service
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = self.router();

        info!(
            "Starting movierec data service on {} (datasets: {:?})",
            addr,
            self.state.store.available()
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Shared, read-only service state
struct ServiceState {
    store: DatasetStore,
    credentials: CredentialStore,
    default_limit: usize,
}

fn build_router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{dataset}", get(get_dataset))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejections produced by the handlers
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"movierec\"")],
            )
                .into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ClientInput(message) => ApiError::BadRequest(message),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

async fn require_basic_auth(
    State(state): State<Arc<ServiceState>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic_auth)
        .map(|(username, password)| state.credentials.verify(&username, &password))
        .unwrap_or(false);

    if !authorized {
        warn!("Rejected request to {} with missing or invalid credentials", request.uri().path());
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Raw query parameters. Parsed by hand so malformed values map to `400`.
#[derive(Debug, Default, Deserialize)]
struct DatasetParams {
    offset: Option<String>,
    limit: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl DatasetParams {
    fn to_page_query(&self, dataset: &str, default_limit: usize) -> Result<PageQuery> {
        let offset = parse_count("offset", self.offset.as_deref())?.unwrap_or(0);
        let limit = parse_count("limit", self.limit.as_deref())?.unwrap_or(default_limit);
        if limit == 0 {
            return Err(Error::ClientInput("limit must be greater than 0".to_string()));
        }

        let range = if dataset == RATINGS {
            DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())?
        } else {
            DateRange::default()
        };

        Ok(PageQuery {
            offset,
            limit,
            range,
        })
    }
}

fn parse_count(name: &str, value: Option<&str>) -> Result<Option<usize>> {
    value
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                Error::ClientInput(format!("{name} must be a non-negative integer, got '{raw}'"))
            })
        })
        .transpose()
}

/// Informational payload listing the datasets this service knows about.
pub fn help_text() -> String {
    let mut text = String::from("Welcome to MovieRec API\npages available are:\n");
    for (i, name) in KNOWN_DATASETS.iter().enumerate() {
        text.push_str(&format!("{}.{}\n", i + 1, name));
    }
    text
}

async fn index() -> String {
    help_text()
}

async fn get_dataset(
    State(state): State<Arc<ServiceState>>,
    Path(dataset): Path<String>,
    Query(params): Query<DatasetParams>,
) -> std::result::Result<Response, ApiError> {
    let query = params.to_page_query(&dataset, state.default_limit)?;

    match state.store.page(&dataset, &query) {
        Some(page) => {
            debug!(
                "Serving {} offset={} limit={} returned={} total={}",
                dataset,
                page.offset,
                page.limit,
                page.result.len(),
                page.total
            );
            Ok(Json(page).into_response())
        }
        None => {
            debug!("Dataset {} not available, returning help payload", dataset);
            Ok(help_text().into_response())
        }
    }
}
