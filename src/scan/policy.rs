use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Config;
use crate::pki::{Certificate, TrustedRoots, VerificationOutcome, split_bundle};

use super::errors::ScanResult;
use super::format::{Finding, render};
use super::inputs::expand_patterns;
use super::unit::Unit;

/// Day thresholds and the clock they are measured against.
///
/// A threshold of zero disables that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryRules {
    pub error_days: i64,
    pub warn_days: i64,
    pub now: DateTime<Utc>,
}

impl ExpiryRules {
    pub fn new(error_days: i64, warn_days: i64, now: DateTime<Utc>) -> Self {
        Self {
            error_days,
            warn_days,
            now,
        }
    }

    /// Classify a remaining-days count. Checks run in order: expired, error,
    /// warning. Thresholds compare with strict less-than.
    pub fn classify_days(&self, days: i64) -> Option<Finding> {
        if days < 0 {
            Some(Finding::Expired { days: -days })
        } else if self.error_days != 0 && days < self.error_days {
            Some(Finding::Error { days })
        } else if self.warn_days != 0 && days < self.warn_days {
            Some(Finding::Warning { days })
        } else {
            None
        }
    }

    pub fn classify(&self, cert: &Certificate) -> Option<Finding> {
        self.classify_days(cert.days_remaining(self.now))
    }
}

/// How a single leaf certificate came out of a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clear,
    Flagged(Finding),
    /// Verification failed for a reason that is not reported
    Absorbed(String),
}

/// Counters gathered while evaluating one unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitStats {
    pub certificates: usize,
    pub skipped_blocks: usize,
    pub flagged: usize,
    pub absorbed_failures: usize,
}

/// Messages produced for one unit, in leaf order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub messages: Vec<String>,
    pub stats: UnitStats,
}

/// Classification policy applied to every unit of a scan
#[derive(Debug, Clone)]
pub enum Policy {
    /// Expiry check only
    DayThreshold(ExpiryRules),
    /// Chain verification, then the expiry check for chains that verify
    ChainVerification {
        roots: TrustedRoots,
        rules: ExpiryRules,
    },
}

impl Policy {
    /// Build the policy selected by `config`.
    ///
    /// With verification enabled the trusted roots are loaded from the `ca`
    /// patterns here, once, before any unit is classified.
    pub async fn from_config(config: &Config, now: DateTime<Utc>) -> ScanResult<Self> {
        let rules = config.expiry_rules(now);
        if !config.verify.enabled {
            return Ok(Policy::DayThreshold(rules));
        }

        let ca_files = expand_patterns(&config.verify.ca)?;
        let roots = TrustedRoots::load(&ca_files, now).await?;
        Ok(Policy::ChainVerification { roots, rules })
    }

    pub fn rules(&self) -> &ExpiryRules {
        match self {
            Policy::DayThreshold(rules) => rules,
            Policy::ChainVerification { rules, .. } => rules,
        }
    }

    /// Classify one leaf, using `issuers` as the chain pool when verifying
    pub fn classify(&self, leaf: &Certificate, issuers: &[Certificate]) -> Verdict {
        let finding = match self {
            Policy::DayThreshold(rules) => rules.classify(leaf),
            Policy::ChainVerification { roots, rules } => match roots.verify(leaf, issuers) {
                Ok(VerificationOutcome::Success) => rules.classify(leaf),
                Ok(VerificationOutcome::UnknownAuthority { detail, issuer }) => {
                    Some(Finding::Chain {
                        detail,
                        qualifier: issuer,
                    })
                }
                Ok(VerificationOutcome::Expired {
                    detail,
                    expiry_date,
                }) => Some(Finding::Chain {
                    detail,
                    qualifier: expiry_date,
                }),
                Ok(VerificationOutcome::OtherFailure { detail }) => {
                    return Verdict::Absorbed(detail);
                }
                Err(e) => return Verdict::Absorbed(e.to_string()),
            },
        };

        finding.map_or(Verdict::Clear, Verdict::Flagged)
    }

    /// Split the unit's bundle and classify every leaf certificate.
    ///
    /// Issuer certificates are never classified on their own.
    pub fn evaluate(&self, unit: &Unit) -> Evaluation {
        let bundle = split_bundle(unit.data());
        let mut evaluation = Evaluation {
            messages: Vec::with_capacity(bundle.leaves.len()),
            stats: UnitStats {
                certificates: bundle.leaves.len(),
                skipped_blocks: bundle.skipped,
                ..UnitStats::default()
            },
        };

        for leaf in &bundle.leaves {
            match self.classify(leaf, &bundle.issuers) {
                Verdict::Clear => {}
                Verdict::Flagged(finding) => evaluation
                    .messages
                    .push(render(&leaf.common_name, &finding, unit.name())),
                Verdict::Absorbed(reason) => {
                    debug!(
                        "Verification of {} in {} failed: {reason}",
                        leaf.common_name,
                        unit.name()
                    );
                    evaluation.stats.absorbed_failures += 1;
                }
            }
        }

        evaluation.stats.flagged = evaluation.messages.len();
        evaluation
    }
}
