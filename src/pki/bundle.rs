use tracing::debug;
use x509_parser::pem::Pem;

use super::certificate::Certificate;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Certificates found in one PEM bundle, split by role
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    /// End-entity certificates, in the order they appear in the file
    pub leaves: Vec<Certificate>,
    /// CA certificates, only used to build chains
    pub issuers: Vec<Certificate>,
    /// Certificate blocks that could not be decoded
    pub skipped: usize,
}

/// Split raw PEM bytes into leaf and issuer certificates.
///
/// Certificates whose basic constraints mark them as a CA become issuers.
/// Undecodable blocks are skipped, and a broken PEM frame ends the walk
/// while keeping what was decoded before it.
pub fn split_bundle(data: &[u8]) -> Bundle {
    let (certs, skipped) = decode_all(data);
    let (issuers, leaves): (Vec<_>, Vec<_>) = certs.into_iter().partition(|cert| cert.is_ca);

    Bundle {
        leaves,
        issuers,
        skipped,
    }
}

/// Decode every certificate in a PEM buffer regardless of its role.
///
/// Returns the certificates and the number of blocks that were skipped.
pub fn parse_certificates(data: &[u8]) -> (Vec<Certificate>, usize) {
    decode_all(data)
}

fn decode_all(data: &[u8]) -> (Vec<Certificate>, usize) {
    let mut certs = Vec::new();
    let mut skipped = 0;

    for pem in Pem::iter_from_buffer(data) {
        let pem = match pem {
            Ok(pem) => pem,
            Err(e) => {
                debug!("Stopping at malformed PEM frame: {e}");
                break;
            }
        };

        if pem.label != CERTIFICATE_LABEL {
            debug!("Ignoring PEM block labelled {}", pem.label);
            continue;
        }

        match Certificate::from_der(&pem.contents) {
            Ok(cert) => certs.push(cert),
            Err(e) => {
                debug!("Skipping undecodable certificate block: {e}");
                skipped += 1;
            }
        }
    }

    (certs, skipped)
}
