use thiserror::Error;

/// Errors raised while decoding certificates or building the trusted root set
#[derive(Error, Debug)]
pub enum PkiError {
    #[error("Certificate parsing error: {0}")]
    CertificateParsingError(String),

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("Failed to read trusted root bundle {path}: {source}")]
    RootBundleRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Results using PkiError
pub type PkiResult<T> = Result<T, PkiError>;
