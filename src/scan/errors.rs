use thiserror::Error;

use crate::pki::PkiError;

/// Errors that abort a scan before or while it runs
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Pki(#[from] PkiError),

    #[error("Classification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Type alias for Results using ScanError
pub type ScanResult<T> = Result<T, ScanError>;
