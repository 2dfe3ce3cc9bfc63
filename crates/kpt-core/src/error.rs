use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to serialize {path:?}: {message}")]
    Serialize { path: PathBuf, message: String },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Load-time errors abort the whole batch before any state is kept;
    /// everything else belongs to the apply path.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::Read { .. } | Error::Parse { .. })
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            Error::Read { path, .. }
            | Error::Parse { path, .. }
            | Error::Serialize { path, .. }
            | Error::Write { path, .. } => path,
        }
    }
}
