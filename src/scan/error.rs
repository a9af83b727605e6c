//! Configuration errors raised by the scanning engine.

use thiserror::Error;

/// Errors that abort a scan.
///
/// A missing match is never an error, and stale allowlist entries are
/// reported as data, so everything here is a configuration problem.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rule {rule:?} has no patterns")]
    NoPatterns { rule: String },
    #[error("compiling pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid glob {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
}

impl ScanError {
    /// Wrap an I/O error for `path`, mapping `NotFound` to [`ScanError::FileNotFound`].
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ScanError::FileNotFound {
                path: path.to_string(),
            }
        } else {
            ScanError::Read {
                path: path.to_string(),
                source: err,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScanError::FileNotFound { .. })
    }
}
