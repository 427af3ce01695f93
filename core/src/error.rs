//! Probe failure taxonomy. Probe errors are always per-item: callers log
//! them with the item identifier and continue with the rest of the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The file could not be read for hashing (missing, permission denied,
    /// or not a regular file).
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The connect attempt failed for a reason other than timeout or
    /// connection-refused (those two mean `Closed`, not an error).
    #[error("connect probe failed on port {port}: {source}")]
    Connect {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The host socket table could not be enumerated.
    #[error("socket table unavailable: {0}")]
    SocketTable(String),
}

impl ProbeError {
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProbeError::FileRead { path: path.into(), source }
    }
}
