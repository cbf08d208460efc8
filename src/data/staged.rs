//! Reads datasets back from the JSON files written by the fetch stage

use super::{DatasetSource, Row};
use crate::error::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Sink-relative location of a drained dataset: `{name}/{name}.json`.
pub fn staged_path(name: &str) -> String {
    format!("{name}/{name}.json")
}

#[derive(Debug, Clone)]
pub struct StagedJsonDirectory {
    dir: PathBuf,
}

impl StagedJsonDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DatasetSource for StagedJsonDirectory {
    fn read_rows(&self, name: &str) -> Result<Vec<Row>> {
        let file = File::open(self.dir.join(staged_path(name)))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_reads_array_of_records() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("tags")).unwrap();
        std::fs::write(
            temp_dir.path().join("tags/tags.json"),
            r#"[{"userId": 3, "movieId": 1, "tag": "pixar"}]"#,
        )
        .unwrap();

        let rows = StagedJsonDirectory::new(temp_dir.path())
            .read_rows("tags")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["tag"], json!("pixar"));
    }

    #[test]
    fn test_non_array_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("tags")).unwrap();
        std::fs::write(temp_dir.path().join("tags/tags.json"), "{}").unwrap();

        let err = StagedJsonDirectory::new(temp_dir.path())
            .read_rows("tags")
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Serialization(_)));
    }
}
