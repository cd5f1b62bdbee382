use std::fmt;

/// Why a certificate was flagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Past `notAfter`; `days` is the number of days overdue
    Expired { days: i64 },
    /// Below the error threshold
    Error { days: i64 },
    /// Below the warning threshold
    Warning { days: i64 },
    /// Chain verification failed; the qualifier is an issuer name or a date
    Chain { detail: String, qualifier: String },
}

/// Render a finding for `subject` from `bundle` as a single output line
pub fn render(subject: &str, finding: &Finding, bundle: &str) -> String {
    match finding {
        Finding::Expired { days } => {
            format!("ERROR: {subject} expired {} ago ({bundle})", Days(*days))
        }
        Finding::Warning { days } => {
            format!("WARNING: {subject} will expire in {} ({bundle})", Days(*days))
        }
        Finding::Error { days } => {
            format!("ERROR: {subject} will expire in {} ({bundle})", Days(*days))
        }
        Finding::Chain { detail, qualifier } => {
            format!("ERROR: {subject}: {detail}: {qualifier} ({bundle})")
        }
    }
}

/// A day count rendered as `1 day` or `N days`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Days(pub i64);

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1 {
            write!(f, "1 day")
        } else {
            write!(f, "{} days", self.0)
        }
    }
}
