use std::path::PathBuf;

use thiserror::Error;

/// Why a fetch produced no usable snapshot. The whole cycle is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote page could not be loaded (timeouts included).
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to run {program}: {source}")]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status:?}: {stderr}")]
    Command {
        program: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error("could not decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("detail fetch for {url} failed: {source}")]
    Detail {
        url: String,
        #[source]
        source: Box<FetchError>,
    },

    #[error("detail task join failure: {0}")]
    Join(String),
}
