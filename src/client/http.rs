use super::{PageRequest, PageSource};
use crate::config::ClientSettings;
use crate::data::Page;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use tracing::debug;

/// HTTP client for the movierec data service
pub struct MovieRecClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl MovieRecClient {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let (username, password) = settings.credentials()?;
        Self::new(settings.base_url(), username, password)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a dataset, with the name encoded as a single path segment.
    fn dataset_url(&self, dataset: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid service URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Service URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(dataset);
        Ok(url)
    }
}

#[async_trait]
impl PageSource for MovieRecClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let url = self.dataset_url(&request.dataset)?;
        let mut params = vec![
            ("offset", request.offset.to_string()),
            ("limit", request.limit.to_string()),
        ];
        params.extend(request.range.query_pairs());

        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch {}: {e}", request.dataset)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(format!(
                "service rejected credentials for user {}",
                self.username
            )));
        }
        if status == StatusCode::BAD_REQUEST {
            let reason = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("bad request for {} (unreadable body: {e})", request.dataset),
            };
            return Err(Error::ClientInput(reason));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus(format!(
                "fetching {} failed with status: {status}",
                request.dataset
            )));
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        if !is_json {
            return Err(Error::DatasetUnavailable(request.dataset.clone()));
        }

        response
            .json::<Page>()
            .await
            .map_err(|e| Error::Deserialization(format!("Failed to parse page of {}: {e}", request.dataset)))
    }
}
