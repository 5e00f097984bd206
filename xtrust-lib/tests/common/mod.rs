//! Lightweight certificate and CRL stand-ins for exercising the trust list
//! without ASN.1.
//!
//! A `MockCert` "signature" verifies when the issuer's key equals the key
//! the certificate claims to be signed with. The DER encoding is a digest of
//! every field, so two mocks are the same certificate iff all fields match.

#![allow(dead_code)]

use std::net::IpAddr;
use xtrust_lib::{
    BasicConstraints, Certificate, KeyUsage, RevocationList, TrustList, TrustListOptions,
    Validity,
};

/// Verification time used by every test.
pub const NOW: i64 = 1_800_000_000;

pub const NOT_BEFORE: i64 = 1_600_000_000;
pub const NOT_AFTER: i64 = 1_900_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCert {
    pub subject: String,
    pub issuer: String,
    pub serial: Vec<u8>,
    pub key: String,
    pub signed_with: String,
    pub validity: Validity,
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub common_name: Option<String>,
    pub key_purposes: Option<Vec<String>>,
    pub algorithm: String,
    der: Vec<u8>,
}

impl MockCert {
    /// A self-signed CA.
    pub fn root(name: &str) -> Self {
        MockCert {
            subject: name.to_string(),
            issuer: name.to_string(),
            serial: vec![0x01],
            key: format!("{}-key", name),
            signed_with: format!("{}-key", name),
            validity: Validity {
                not_before: NOT_BEFORE,
                not_after: NOT_AFTER,
            },
            basic_constraints: Some(BasicConstraints {
                ca: true,
                path_len: None,
            }),
            key_usage: Some(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN),
            subject_key_id: None,
            authority_key_id: None,
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            common_name: Some(name.to_string()),
            key_purposes: None,
            algorithm: "1.2.840.10045.4.3.2".to_string(),
            der: Vec::new(),
        }
        .finish()
    }

    /// An intermediate CA issued by `issuer`.
    pub fn ca(name: &str, issuer: &MockCert) -> Self {
        let mut cert = Self::root(name);
        cert.issuer = issuer.subject.clone();
        cert.signed_with = issuer.key.clone();
        cert.serial = vec![0x10];
        cert.finish()
    }

    /// An end-entity certificate issued by `issuer`.
    pub fn leaf(name: &str, issuer: &MockCert) -> Self {
        let mut cert = Self::ca(name, issuer);
        cert.serial = vec![0x20, 0x01];
        cert.basic_constraints = Some(BasicConstraints {
            ca: false,
            path_len: None,
        });
        cert.key_usage = Some(KeyUsage::DIGITAL_SIGNATURE);
        cert.dns_names = vec![name.to_string()];
        cert.finish()
    }

    pub fn with_serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self.finish()
    }

    pub fn with_key(mut self, key: &str) -> Self {
        if self.signed_with == self.key {
            self.signed_with = key.to_string();
        }
        self.key = key.to_string();
        self.finish()
    }

    pub fn signed_with(mut self, key: &str) -> Self {
        self.signed_with = key.to_string();
        self.finish()
    }

    pub fn with_validity(mut self, not_before: i64, not_after: i64) -> Self {
        self.validity = Validity {
            not_before,
            not_after,
        };
        self.finish()
    }

    pub fn with_basic_constraints(mut self, bc: Option<BasicConstraints>) -> Self {
        self.basic_constraints = bc;
        self.finish()
    }

    pub fn with_path_len(mut self, path_len: u32) -> Self {
        self.basic_constraints = Some(BasicConstraints {
            ca: true,
            path_len: Some(path_len),
        });
        self.finish()
    }

    pub fn with_key_usage(mut self, ku: Option<KeyUsage>) -> Self {
        self.key_usage = ku;
        self.finish()
    }

    pub fn with_dns(mut self, names: &[&str]) -> Self {
        self.dns_names = names.iter().map(|n| n.to_string()).collect();
        self.finish()
    }

    pub fn with_ips(mut self, ips: &[IpAddr]) -> Self {
        self.ip_addresses = ips.to_vec();
        self.finish()
    }

    pub fn with_purposes(mut self, purposes: Option<&[&str]>) -> Self {
        self.key_purposes = purposes.map(|p| p.iter().map(|s| s.to_string()).collect());
        self.finish()
    }

    pub fn with_algorithm(mut self, oid: &str) -> Self {
        self.algorithm = oid.to_string();
        self.finish()
    }

    pub fn with_key_ids(mut self, ski: Option<&[u8]>, aki: Option<&[u8]>) -> Self {
        self.subject_key_id = ski.map(<[u8]>::to_vec);
        self.authority_key_id = aki.map(<[u8]>::to_vec);
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.der = format!(
            "{}|{}|{:?}|{}|{}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{}",
            self.subject,
            self.issuer,
            self.serial,
            self.key,
            self.signed_with,
            self.validity,
            self.basic_constraints,
            self.key_usage,
            self.subject_key_id,
            self.authority_key_id,
            self.dns_names,
            self.ip_addresses,
            self.common_name,
            self.key_purposes,
            self.algorithm,
        )
        .into_bytes();
        self
    }
}

impl Certificate for MockCert {
    type Crl = MockCrl;

    fn der(&self) -> &[u8] {
        &self.der
    }

    fn subject_dn(&self) -> &[u8] {
        self.subject.as_bytes()
    }

    fn issuer_dn(&self) -> &[u8] {
        self.issuer.as_bytes()
    }

    fn serial(&self) -> &[u8] {
        &self.serial
    }

    fn public_key(&self) -> &[u8] {
        self.key.as_bytes()
    }

    fn validity(&self) -> Validity {
        self.validity
    }

    fn key_usage(&self) -> Option<KeyUsage> {
        self.key_usage
    }

    fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.basic_constraints
    }

    fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    fn dns_names(&self) -> Vec<String> {
        self.dns_names.clone()
    }

    fn ip_addresses(&self) -> Vec<IpAddr> {
        self.ip_addresses.clone()
    }

    fn common_name(&self) -> Option<String> {
        self.common_name.clone()
    }

    fn key_purposes(&self) -> Option<Vec<String>> {
        self.key_purposes.clone()
    }

    fn signature_algorithm(&self) -> &str {
        &self.algorithm
    }

    fn verify_signature(&self, issuer: &Self) -> bool {
        self.signed_with == issuer.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCrl {
    pub issuer: String,
    pub signed_with: String,
    pub this_update: i64,
    pub next_update: Option<i64>,
    pub revoked: Vec<Vec<u8>>,
}

impl MockCrl {
    /// A current CRL signed by `issuer` listing `revoked`.
    pub fn new(issuer: &MockCert, revoked: &[&MockCert]) -> Self {
        MockCrl {
            issuer: issuer.subject.clone(),
            signed_with: issuer.key.clone(),
            this_update: NOW - 3600,
            next_update: Some(NOW + 86_400),
            revoked: revoked.iter().map(|c| c.serial.clone()).collect(),
        }
    }

    pub fn with_dates(mut self, this_update: i64, next_update: Option<i64>) -> Self {
        self.this_update = this_update;
        self.next_update = next_update;
        self
    }

    pub fn signed_with(mut self, key: &str) -> Self {
        self.signed_with = key.to_string();
        self
    }
}

impl RevocationList<MockCert> for MockCrl {
    fn der(&self) -> &[u8] {
        self.issuer.as_bytes()
    }

    fn issuer_dn(&self) -> &[u8] {
        self.issuer.as_bytes()
    }

    fn this_update(&self) -> i64 {
        self.this_update
    }

    fn next_update(&self) -> Option<i64> {
        self.next_update
    }

    fn is_revoked(&self, serial: &[u8]) -> bool {
        self.revoked.iter().any(|s| s == serial)
    }

    fn verify_signature(&self, issuer: &MockCert) -> bool {
        self.signed_with == issuer.key
    }
}

/// An empty list verifying at [`NOW`].
pub fn trust_list() -> TrustList<MockCert> {
    TrustList::with_options(TrustListOptions {
        verification_time: Some(NOW),
        ..TrustListOptions::default()
    })
    .unwrap()
}

/// Root, intermediate and leaf ("example.com") forming a valid chain.
pub struct Pki {
    pub root: MockCert,
    pub intermediate: MockCert,
    pub leaf: MockCert,
}

impl Pki {
    pub fn new() -> Self {
        let root = MockCert::root("Root");
        let intermediate = MockCert::ca("Intermediate", &root);
        let leaf = MockCert::leaf("example.com", &intermediate);
        Pki {
            root,
            intermediate,
            leaf,
        }
    }

    pub fn chain(&self) -> Vec<MockCert> {
        vec![
            self.leaf.clone(),
            self.intermediate.clone(),
            self.root.clone(),
        ]
    }

    /// A list trusting only the root.
    pub fn trust_root(&self) -> TrustList<MockCert> {
        let mut list = trust_list();
        list.add_cas(vec![self.root.clone()], Default::default());
        list
    }
}
