use chrono::{DateTime, Utc};
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

use super::errors::{PkiError, PkiResult};

/// A decoded X.509 certificate with the fields the checker reads.
///
/// The DER bytes are kept so the certificate can be handed to OpenSSL for
/// chain verification without going back to the PEM source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub der: Vec<u8>,
    pub common_name: String,
    pub issuer_common_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
}

impl Certificate {
    /// Create a certificate from DER-encoded bytes
    pub fn from_der(der: impl AsRef<[u8]>) -> PkiResult<Self> {
        let der_bytes = der.as_ref();
        let (remaining, cert) = X509Certificate::from_der(der_bytes).map_err(|e| {
            PkiError::CertificateParsingError(format!("DER parsing failed: {e}"))
        })?;

        if !remaining.is_empty() {
            return Err(PkiError::CertificateParsingError(
                "Certificate contains unparsed data after DER".to_string(),
            ));
        }

        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .ok_or_else(|| {
                PkiError::CertificateParsingError("notBefore is out of range".to_string())
            })?;
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| {
                PkiError::CertificateParsingError("notAfter is out of range".to_string())
            })?;

        Ok(Self {
            der: der_bytes.to_vec(),
            common_name: common_name(cert.subject()),
            issuer_common_name: common_name(cert.issuer()),
            not_before,
            not_after,
            is_ca: cert.is_ca(),
        })
    }

    /// Whole days left until `not_after`, truncated toward zero.
    ///
    /// The hour difference is truncated first and then divided by 24, so a
    /// certificate that expired eleven hours ago still reports zero days.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_hours() / 24
    }

    /// Whether `now` falls inside the validity window
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Expiry date as `YYYY-MM-DD`
    pub fn expiry_date(&self) -> String {
        self.not_after.format("%Y-%m-%d").to_string()
    }
}

// First CN attribute, or an empty string when the name has none
fn common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string()
}
