use std::path::PathBuf;

use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// Failures while pulling workspace files off disk.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a local file uri")]
    NotAFile(Url),

    #[error("{} is {size} bytes, above the {limit} byte indexing limit", .path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },
}

impl WorkspaceError {
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
