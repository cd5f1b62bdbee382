pub mod errors;
pub mod format;
pub mod inputs;
pub mod pipeline;
pub mod policy;
pub mod unit;

pub use errors::{ScanError, ScanResult};
pub use format::{Days, Finding, render};
pub use inputs::expand_patterns;
pub use pipeline::{Pipeline, Scan, ScanSummary};
pub use policy::{Evaluation, ExpiryRules, Policy, UnitStats, Verdict};
pub use unit::Unit;
