//! Target list file

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::remote::types::Target;

#[derive(Debug, Error)]
pub enum TargetSourceError {
    #[error("{path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One target per line; blank lines and `#` comments are ignored
pub fn parse_targets(contents: &str) -> Vec<Target> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse the target file, preserving order and duplicates
pub async fn load_targets(path: &Path) -> Result<Vec<Target>, TargetSourceError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TargetSourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_targets(&contents))
}
