pub mod bundle;
pub mod certificate;
pub mod errors;
pub mod roots;

// Re-export commonly used types
pub use bundle::{Bundle, parse_certificates, split_bundle};
pub use certificate::Certificate;
pub use errors::{PkiError, PkiResult};
pub use roots::{TrustedRoots, VerificationOutcome};
