use std::path::{Path, PathBuf};

use crate::types::PartitionConfig;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn parse_config(json: &str) -> Result<PartitionConfig, ParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a partition configuration file.
pub fn load_config(path: &Path) -> Result<PartitionConfig, ParseError> {
    let json = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&json)
}
