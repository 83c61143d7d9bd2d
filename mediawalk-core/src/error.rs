use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path too long: {len} bytes (limit {max})")]
    PathTooLong { len: usize, max: usize },

    #[error("Allow-list unreadable at {}: {source}", path.display())]
    AllowList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Entry rejected by collector: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
