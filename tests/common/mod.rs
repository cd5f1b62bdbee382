#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
};

pub struct Issued {
    pub cert: Certificate,
    pub key: KeyPair,
}

/// Midnight UTC of the date `days` away from today
pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

fn params(common_name: &str, not_after: NaiveDate) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(
        not_after.year(),
        not_after.month() as u8,
        not_after.day() as u8,
    );
    params
}

pub fn ca_cert(common_name: &str) -> Issued {
    let mut params = params(common_name, days_from_today(3650));
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    Issued { cert, key }
}

pub fn leaf_cert(common_name: &str, issuer: &Issued, not_after: NaiveDate) -> Issued {
    let mut params = params(common_name, not_after);
    params.is_ca = IsCa::NoCa;
    let key = KeyPair::generate().unwrap();
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    Issued { cert, key }
}

/// Write the certificates as one PEM bundle and return its path
pub fn write_bundle(dir: &Path, name: &str, certs: &[&Issued]) -> PathBuf {
    let pem: String = certs.iter().map(|c| c.cert.pem()).collect();
    let path = dir.join(name);
    std::fs::write(&path, pem).unwrap();
    path
}
