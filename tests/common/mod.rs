//! Common test utilities: CSV fixtures and an in-process data service

#![allow(dead_code)]

use anyhow::Result;
use movierec::client::MovieRecClient;
use movierec::config::ServiceSettings;
use movierec::server::DataService;
use std::net::SocketAddr;
use tempfile::TempDir;

pub const USER: &str = "airflow";
pub const PASSWORD: &str = "correct horse";

/// Ratings in deliberately unsorted order. Two rows sit exactly on the
/// 2019-01-01 and 2020-01-01 boundaries.
pub const RATINGS_CSV: &str = "\
userId,movieId,rating,timestamp
1,1,4.0,1577836800
1,1,2.0,1546300800
2,1,5.0,1546300799
1,2,3.0,1560000000
3,4,4.5,1570000000
2,5,5.0,1500000000
3,6,5.0,1600000000
4,2,4.0,1546300801
";

pub const MOVIES_CSV: &str = "\
movieId,title,genres
1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy
2,Jumanji (1995),Adventure|Children|Fantasy
3,Grumpier Old Men (1995),Comedy|Romance
4,Newer Film (2020),Drama
5,Untitled,Drama
6,Early Film (1850),Drama
";

pub const TAGS_CSV: &str = "\
userId,movieId,tag,timestamp
1,1,pixar,1546300900
3,4,slow,1570000100
";

/// A data service listening on an ephemeral local port
pub struct TestService {
    pub addr: SocketAddr,
    _data_dir: TempDir,
}

impl TestService {
    /// Start a service over the ratings, movies and tags fixtures.
    pub async fn start() -> Result<Self> {
        Self::start_with(&[
            ("ratings", RATINGS_CSV),
            ("movies", MOVIES_CSV),
            ("tags", TAGS_CSV),
        ])
        .await
    }

    /// Start a service over the given `(dataset, csv)` files.
    pub async fn start_with(files: &[(&str, &str)]) -> Result<Self> {
        let data_dir = TempDir::new()?;
        for (name, contents) in files {
            std::fs::write(data_dir.path().join(format!("{name}.csv")), contents)?;
        }

        let settings = ServiceSettings {
            data_dir: data_dir.path().to_path_buf(),
            username: Some(USER.to_string()),
            password: Some(PASSWORD.to_string()),
            ..Default::default()
        };
        let router = DataService::load(settings).await?.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });

        Ok(Self {
            addr,
            _data_dir: data_dir,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn client(&self) -> Result<MovieRecClient> {
        Ok(MovieRecClient::new(self.base_url(), USER, PASSWORD)?)
    }

    pub fn client_with_password(&self, password: &str) -> Result<MovieRecClient> {
        Ok(MovieRecClient::new(self.base_url(), USER, password)?)
    }
}

/// Serve an arbitrary router on an ephemeral local port and return its base URL.
pub async fn serve_stub(router: axum::Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, router).await });
    Ok(format!("http://{addr}"))
}
