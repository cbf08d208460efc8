//! Output sinks for drained datasets and the ranked artifact

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

/// Destination for pipeline artifacts, addressed by relative path.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Write `bytes` to `path`, replacing any previous content
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;
}

fn validate_relative(path: &str) -> Result<&Path> {
    let candidate = Path::new(path);
    let escapes = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(Error::ClientInput(format!(
            "sink path must be relative and stay inside the sink root: {path}"
        )));
    }
    Ok(candidate)
}

/// Writes artifacts below a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.root.join(validate_relative(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        info!("Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }
}

/// In-memory sink for tests
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        validate_relative(path)?;
        self.files
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
