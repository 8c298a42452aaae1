//! Error type shared by both framework builders.
//!
//! Only conditions that make the build impossible are errors. Missing flag
//! files, missing linker templates and generator failures are logged and
//! skipped by the callers instead.

use std::path::PathBuf;

use thiserror_no_std::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading a framework file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Board manifest is not valid JSON.
    #[error("invalid board manifest {}: {source}", .path.display())]
    BoardParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A board key the builder cannot do without.
    #[error("board manifest has no `{0}`")]
    MissingBoardKey(String),

    /// A Makefile without any `OBJS` assignment; the framework would build
    /// with zero sources.
    #[error("no OBJS assignment found in {}", .0.display())]
    MissingObjs(PathBuf),

    /// genlink succeeded but did not report the memory-region offsets.
    #[error("device symbols for `{device}` lack _ROM_OFF/_RAM_OFF: {symbols:?}")]
    MissingDeviceSymbols { device: String, symbols: String },

    /// An external tool could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A recorded build command exited non-zero.
    #[error("`{description}` failed with status {status}: {stderr}")]
    CommandFailed {
        description: String,
        status: i32,
        stderr: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
