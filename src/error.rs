use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Malformed pagination or date parameters. Never worth retrying.
    #[error("Invalid request: {0}")]
    ClientInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status error: {0}")]
    HttpStatus(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl Error {
    /// Whether the error came from the input the caller supplied rather than
    /// from the environment.
    pub fn is_client_input(&self) -> bool {
        matches!(self, Error::ClientInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
