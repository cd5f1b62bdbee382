use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::verify::{X509VerifyFlags, X509VerifyParam};
use openssl::x509::{X509, X509StoreContext};
use tracing::{debug, info};

use super::bundle::parse_certificates;
use super::certificate::Certificate;
use super::errors::{PkiError, PkiResult};

// OpenSSL verify result codes, see x509_vfy.h
const X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT: i32 = 2;
const X509_V_ERR_CERT_NOT_YET_VALID: i32 = 9;
const X509_V_ERR_CERT_HAS_EXPIRED: i32 = 10;
const X509_V_ERR_DEPTH_ZERO_SELF_SIGNED_CERT: i32 = 18;
const X509_V_ERR_SELF_SIGNED_CERT_IN_CHAIN: i32 = 19;
const X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT_LOCALLY: i32 = 20;
const X509_V_ERR_UNABLE_TO_VERIFY_LEAF_SIGNATURE: i32 = 21;

/// Result of verifying one leaf certificate against the trusted roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success,
    /// No path to a trusted root; carries the leaf's issuer common name
    UnknownAuthority { detail: String, issuer: String },
    /// A certificate in the chain is outside its validity window; carries
    /// the leaf's expiry date
    Expired { detail: String, expiry_date: String },
    OtherFailure { detail: String },
}

/// Read-only set of trust anchors shared by every classification task.
///
/// The store is pinned to a reference time so chain validity agrees with
/// the day arithmetic done on the same scan. Any anchor ends a chain, so an
/// intermediate given as a root is trusted on its own.
#[derive(Clone)]
pub struct TrustedRoots {
    store: Arc<X509Store>,
    len: usize,
    now: DateTime<Utc>,
}

impl std::fmt::Debug for TrustedRoots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedRoots").field("len", &self.len).finish()
    }
}

impl TrustedRoots {
    /// Build a root set from already decoded certificates
    pub fn new<'a, I>(anchors: I, now: DateTime<Utc>) -> PkiResult<Self>
    where
        I: IntoIterator<Item = &'a Certificate>,
    {
        let mut builder = X509StoreBuilder::new()?;
        let mut param = X509VerifyParam::new()?;
        param.set_time(now.timestamp() as _);
        param.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
        builder.set_param(&param)?;

        let mut seen = HashSet::new();
        for anchor in anchors {
            if !seen.insert(anchor.der.as_slice()) {
                debug!("Skipping duplicate trust anchor {}", anchor.common_name);
                continue;
            }
            builder.add_cert(X509::from_der(&anchor.der)?)?;
        }

        Ok(Self {
            store: Arc::new(builder.build()),
            len: seen.len(),
            now,
        })
    }

    /// Load every certificate found in the given files as a trust anchor.
    ///
    /// An unreadable file is an error; undecodable blocks inside a readable
    /// file are skipped.
    pub async fn load<P: AsRef<Path>>(paths: &[P], now: DateTime<Utc>) -> PkiResult<Self> {
        let mut anchors = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let data = tokio::fs::read(path)
                .await
                .map_err(|source| PkiError::RootBundleRead {
                    path: path.display().to_string(),
                    source,
                })?;
            let (certs, skipped) = parse_certificates(&data);
            debug!(
                "Read {} trust anchors from {} ({skipped} skipped)",
                certs.len(),
                path.display()
            );
            anchors.extend(certs);
        }

        let roots = Self::new(&anchors, now)?;
        info!("Loaded {} trusted root certificates", roots.len());
        Ok(roots)
    }

    /// Number of anchors in the store
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Verify `leaf` using `intermediates` as the untrusted chain pool
    pub fn verify(
        &self,
        leaf: &Certificate,
        intermediates: &[Certificate],
    ) -> PkiResult<VerificationOutcome> {
        // The leaf's own validity window is judged before any path building
        if !leaf.is_valid_at(self.now) {
            return Ok(VerificationOutcome::Expired {
                detail: format!(
                    "certificate has expired or is not yet valid (current time {} is outside {} to {})",
                    self.now.to_rfc3339(),
                    leaf.not_before.to_rfc3339(),
                    leaf.not_after.to_rfc3339()
                ),
                expiry_date: leaf.expiry_date(),
            });
        }

        let target = X509::from_der(&leaf.der)?;
        let mut chain = Stack::new()?;
        for issuer in intermediates {
            chain.push(X509::from_der(&issuer.der)?)?;
        }

        let mut context = X509StoreContext::new()?;
        let failure = context.init(&self.store, &target, &chain, |ctx| {
            if ctx.verify_cert()? {
                Ok(None)
            } else {
                let error = ctx.error();
                Ok(Some((error.as_raw(), error.error_string().to_string())))
            }
        })?;

        Ok(match failure {
            None => VerificationOutcome::Success,
            Some((code, reason)) => classify_failure(code, reason, leaf),
        })
    }
}

fn classify_failure(code: i32, reason: String, leaf: &Certificate) -> VerificationOutcome {
    match code {
        X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT
        | X509_V_ERR_DEPTH_ZERO_SELF_SIGNED_CERT
        | X509_V_ERR_SELF_SIGNED_CERT_IN_CHAIN
        | X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT_LOCALLY
        | X509_V_ERR_UNABLE_TO_VERIFY_LEAF_SIGNATURE => VerificationOutcome::UnknownAuthority {
            detail: format!("certificate signed by unknown authority ({reason})"),
            issuer: leaf.issuer_common_name.clone(),
        },
        X509_V_ERR_CERT_HAS_EXPIRED | X509_V_ERR_CERT_NOT_YET_VALID => {
            VerificationOutcome::Expired {
                detail: format!("certificate has expired or is not yet valid ({reason})"),
                expiry_date: leaf.expiry_date(),
            }
        }
        _ => VerificationOutcome::OtherFailure { detail: reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bundle, ca_cert, intermediate_cert, leaf_cert, reference_time, ymd};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn decode(issued: &crate::testing::Issued) -> Certificate {
        Certificate::from_der(issued.cert.der()).unwrap()
    }

    #[test]
    fn test_verify_valid_chain() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let leaf = leaf_cert("test.example.com", &root, ymd(2031, 1, 1));

        let roots = TrustedRoots::new([&decode(&root)], reference_time()).unwrap();
        assert_eq!(roots.len(), 1);

        let outcome = roots.verify(&decode(&leaf), &[]).unwrap();
        assert_eq!(outcome, VerificationOutcome::Success);
    }

    #[test]
    fn test_verify_through_intermediate() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let inter = intermediate_cert("Test Intermediate", &root, ymd(2039, 1, 1));
        let leaf = leaf_cert("test.example.com", &inter, ymd(2031, 1, 1));

        let roots = TrustedRoots::new([&decode(&root)], reference_time()).unwrap();

        let outcome = roots.verify(&decode(&leaf), &[decode(&inter)]).unwrap();
        assert_eq!(outcome, VerificationOutcome::Success);

        // Without the intermediate there is no path to the root
        let outcome = roots.verify(&decode(&leaf), &[]).unwrap();
        assert!(matches!(outcome, VerificationOutcome::UnknownAuthority { .. }));
    }

    #[test]
    fn test_verify_missing_root() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let leaf = leaf_cert("test.example.com", &root, ymd(2031, 1, 1));

        let roots = TrustedRoots::new(&[], reference_time()).unwrap();
        assert!(roots.is_empty());

        match roots.verify(&decode(&leaf), &[]).unwrap() {
            VerificationOutcome::UnknownAuthority { detail, issuer } => {
                assert!(detail.contains("unknown authority"));
                assert_eq!(issuer, "Test CA Root");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_verify_expired_leaf() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let leaf = leaf_cert("old.example.com", &root, ymd(2030, 1, 1));

        let roots = TrustedRoots::new([&decode(&root)], reference_time()).unwrap();

        match roots.verify(&decode(&leaf), &[]).unwrap() {
            VerificationOutcome::Expired {
                detail,
                expiry_date,
            } => {
                assert!(detail.contains("expired"));
                assert_eq!(expiry_date, "2030-01-01");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_expired_leaf_wins_over_unknown_root() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let leaf = leaf_cert("old.example.com", &root, ymd(2030, 1, 1));

        let roots = TrustedRoots::new(&[], reference_time()).unwrap();

        match roots.verify(&decode(&leaf), &[]).unwrap() {
            VerificationOutcome::Expired { expiry_date, .. } => {
                assert_eq!(expiry_date, "2030-01-01");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_intermediate_anchor_is_trusted() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let inter = intermediate_cert("Test Intermediate", &root, ymd(2039, 1, 1));
        let leaf = leaf_cert("test.example.com", &inter, ymd(2031, 1, 1));

        let roots = TrustedRoots::new([&decode(&inter)], reference_time()).unwrap();

        let outcome = roots.verify(&decode(&leaf), &[]).unwrap();
        assert_eq!(outcome, VerificationOutcome::Success);
    }

    #[test]
    fn test_duplicate_anchor_is_tolerated() {
        let root = decode(&ca_cert("Test CA Root", ymd(2040, 1, 1)));
        let roots = TrustedRoots::new([&root, &root], reference_time()).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_files() {
        let root = ca_cert("Test CA Root", ymd(2040, 1, 1));
        let other = ca_cert("Other Root", ymd(2040, 1, 1));
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bundle(&[&root, &other])).unwrap();

        let roots = TrustedRoots::load(&[file.path()], reference_time())
            .await
            .unwrap();
        assert_eq!(roots.len(), 2);
    }

    #[tokio::test]
    async fn test_load_unreadable_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pem");

        let result = TrustedRoots::load(&[missing], reference_time()).await;
        assert!(matches!(result, Err(PkiError::RootBundleRead { .. })));
    }
}
