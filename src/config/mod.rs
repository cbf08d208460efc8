//! Configuration for the data service, the draining client and the pipeline.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command line flags are applied on top by the binary.
//! The environment is read through a lookup function so tests never touch the
//! process environment.

use crate::data::is_known_dataset;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_API_USER: &str = "API_USER";
pub const ENV_API_PASSWORD: &str = "API_PASSWORD";
pub const ENV_DATA_DIR: &str = "MOVIEREC_DATA_DIR";
pub const ENV_BIND_PORT: &str = "MOVIEREC_BIND_PORT";
pub const ENV_SCHEMA: &str = "MOVIEREC_SCHEMA";
pub const ENV_HOST: &str = "MOVIEREC_HOST";
pub const ENV_PORT: &str = "MOVIEREC_PORT";
pub const ENV_USER: &str = "MOVIEREC_USER";
pub const ENV_PASSWORD: &str = "MOVIEREC_PASSWORD";
pub const ENV_OUTPUT_DIR: &str = "MOVIEREC_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MovieRecConfig {
    pub service: ServiceSettings,
    pub client: ClientSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding `{dataset}.csv` files.
    pub data_dir: PathBuf,
    pub default_page_size: usize,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            data_dir: PathBuf::from("/"),
            default_page_size: 100,
            username: None,
            password: None,
        }
    }
}

impl ServiceSettings {
    pub fn credentials(&self) -> Result<(&str, &str)> {
        require_credentials(&self.username, &self.password, ENV_API_USER, ENV_API_PASSWORD)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    pub schema: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub page_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            schema: "http".to_string(),
            host: "movierec".to_string(),
            port: 5000,
            username: None,
            password: None,
            page_size: 1000,
        }
    }
}

impl ClientSettings {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.schema, self.host, self.port)
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        require_credentials(&self.username, &self.password, ENV_USER, ENV_PASSWORD)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    /// Datasets drained by the fetch stage.
    pub datasets: Vec<String>,
    /// Movies rated by fewer distinct users are left out of the ranking.
    pub min_ratings: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/data/python"),
            datasets: vec![
                "ratings".to_string(),
                "movies".to_string(),
                "tags".to_string(),
            ],
            min_ratings: 1,
        }
    }
}

fn require_credentials<'a>(
    username: &'a Option<String>,
    password: &'a Option<String>,
    user_key: &str,
    password_key: &str,
) -> Result<(&'a str, &'a str)> {
    match (username.as_deref(), password.as_deref()) {
        (Some(user), Some(password)) => Ok((user, password)),
        _ => Err(Error::Config(format!(
            "credentials not configured; set {user_key} and {password_key}"
        ))),
    }
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("default_page_size", &self.default_page_size)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url())
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl MovieRecConfig {
    /// Load from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.merge_env_vars_with(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn merge_env_vars_with<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(user) = env(ENV_API_USER) {
            self.service.username = Some(user);
        }
        if let Some(password) = env(ENV_API_PASSWORD) {
            self.service.password = Some(password);
        }
        if let Some(dir) = env(ENV_DATA_DIR) {
            self.service.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = parse_env(env, ENV_BIND_PORT)? {
            self.service.port = port;
        }

        if let Some(schema) = env(ENV_SCHEMA) {
            self.client.schema = schema;
        }
        if let Some(host) = env(ENV_HOST) {
            self.client.host = host;
        }
        if let Some(port) = parse_env(env, ENV_PORT)? {
            self.client.port = port;
        }
        if let Some(user) = env(ENV_USER) {
            self.client.username = Some(user);
        }
        if let Some(password) = env(ENV_PASSWORD) {
            self.client.password = Some(password);
        }

        if let Some(dir) = env(ENV_OUTPUT_DIR) {
            self.pipeline.output_dir = PathBuf::from(dir);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.default_page_size == 0 {
            return Err(Error::Config(
                "service.default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.client.page_size == 0 {
            return Err(Error::Config(
                "client.page_size must be greater than 0".to_string(),
            ));
        }
        if let Some(unknown) = self
            .pipeline
            .datasets
            .iter()
            .find(|name| !is_known_dataset(name))
        {
            return Err(Error::Config(format!(
                "pipeline.datasets contains unknown dataset '{unknown}'"
            )));
        }
        Ok(())
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    env(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| Error::Config(format!("{key} has invalid value '{raw}'")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MovieRecConfig::load_with(None, env_from(&[])).unwrap();
        assert_eq!(config.service.port, 5000);
        assert_eq!(config.service.default_page_size, 100);
        assert_eq!(config.client.base_url(), "http://movierec:5000");
        assert_eq!(config.client.page_size, 1000);
        assert_eq!(config.pipeline.datasets, vec!["ratings", "movies", "tags"]);
        assert!(config.service.credentials().is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("movierec.toml");
        std::fs::write(
            &path,
            r#"
[client]
host = "from-file"
page_size = 250

[pipeline]
min_ratings = 5
"#,
        )
        .unwrap();

        let env = env_from(&[
            (ENV_HOST, "from-env"),
            (ENV_PORT, "8080"),
            (ENV_USER, "airflow"),
            (ENV_PASSWORD, "s3cret"),
        ]);
        let config = MovieRecConfig::load_with(Some(&path), env).unwrap();

        assert_eq!(config.client.base_url(), "http://from-env:8080");
        assert_eq!(config.client.page_size, 250);
        assert_eq!(config.pipeline.min_ratings, 5);
        assert_eq!(config.client.credentials().unwrap(), ("airflow", "s3cret"));
    }

    #[test]
    fn test_invalid_numeric_env_is_config_error() {
        let err = MovieRecConfig::load_with(None, env_from(&[(ENV_PORT, "http")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation_rejects_zero_page_size_and_unknown_dataset() {
        let mut config = MovieRecConfig::default();
        config.client.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = MovieRecConfig::default();
        config.pipeline.datasets.push("users".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let env = env_from(&[(ENV_API_PASSWORD, "hunter2"), (ENV_PASSWORD, "hunter3")]);
        let config = MovieRecConfig::load_with(None, env).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("hunter3"));
        assert!(rendered.contains("<redacted>"));
    }
}
