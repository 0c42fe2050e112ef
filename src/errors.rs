use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the SynthSeg BIDS runner.
///
/// Only the fatal class of failures is represented here: problems that stop
/// the run before any segmentation is attempted. Failures of individual tool
/// invocations are recorded as [`crate::outcome::InvocationStatus`] values and
/// never travel through this type.
#[derive(Error, Debug)]
pub enum SynthSegError {
    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch `{program}`")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve tool version with `{program}`: {reason}")]
    VersionResolution { program: String, reason: String },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

impl SynthSegError {
    pub(crate) fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthSegError>;

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should build
/// `SynthSegError::FileSystem` directly; this is the fallback.
impl From<std::io::Error> for SynthSegError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Directory traversal errors carry the offending path when walkdir knows it.
impl From<walkdir::Error> for SynthSegError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("unknown"));
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        Self::FileSystem {
            path,
            operation: "directory listing".to_string(),
            source,
        }
    }
}
