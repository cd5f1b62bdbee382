//! Certificate fixtures shared by the unit tests.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
};

/// A generated certificate together with its signing key
pub struct Issued {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issued {
    pub fn pem(&self) -> String {
        self.cert.pem()
    }
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Fixed clock used across tests: 2030-01-06T00:00:00Z
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 6, 0, 0, 0).unwrap()
}

fn params(common_name: &str, not_after: NaiveDate) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "Test Organization");
    params.distinguished_name = dn;
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(
        not_after.year(),
        not_after.month() as u8,
        not_after.day() as u8,
    );
    params
}

pub fn ca_cert(common_name: &str, not_after: NaiveDate) -> Issued {
    let mut params = params(common_name, not_after);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    Issued { cert, key }
}

pub fn intermediate_cert(common_name: &str, issuer: &Issued, not_after: NaiveDate) -> Issued {
    let mut params = params(common_name, not_after);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let key = KeyPair::generate().unwrap();
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    Issued { cert, key }
}

pub fn leaf_cert(common_name: &str, issuer: &Issued, not_after: NaiveDate) -> Issued {
    let mut params = params(common_name, not_after);
    params.is_ca = IsCa::NoCa;
    let key = KeyPair::generate().unwrap();
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    Issued { cert, key }
}

/// Concatenate the PEM encodings into a single bundle
pub fn bundle(certs: &[&Issued]) -> Vec<u8> {
    certs
        .iter()
        .map(|c| c.pem())
        .collect::<String>()
        .into_bytes()
}
