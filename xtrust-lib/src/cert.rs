//! Certificate and CRL handles consumed by the trust list.
//!
//! The verification core never decodes ASN.1 itself. It works against the
//! [`Certificate`] and [`RevocationList`] traits, which expose the already
//! parsed fields it needs. [`crate::X509Cert`] is the x509-parser backed
//! implementation; tests plug in lightweight mocks.
//!
//! Distinguished names are compared as raw DER byte strings everywhere: two
//! names are equal iff their encodings are identical.

use bitflags::bitflags;
use std::net::IpAddr;

/// Certificate validity window as Unix timestamps (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub not_before: i64,
    pub not_after: i64,
}

impl Validity {
    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: i64) -> bool {
        now >= self.not_before && now <= self.not_after
    }
}

/// The basicConstraints extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

bitflags! {
    /// The keyUsage extension (RFC 5280 Section 4.2.1.3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyUsage: u16 {
        const DIGITAL_SIGNATURE = 1 << 7;
        const NON_REPUDIATION = 1 << 6;
        const KEY_ENCIPHERMENT = 1 << 5;
        const DATA_ENCIPHERMENT = 1 << 4;
        const KEY_AGREEMENT = 1 << 3;
        const KEY_CERT_SIGN = 1 << 2;
        const CRL_SIGN = 1 << 1;
        const ENCIPHER_ONLY = 1 << 0;
        const DECIPHER_ONLY = 1 << 15;
    }
}

/// A parsed X.509 certificate as seen by the verification core.
///
/// Identity is the raw DER encoding: two handles denote the same
/// certificate iff [`Certificate::der`] is byte-identical.
pub trait Certificate: Clone {
    /// CRL type whose entries refer to certificates of this type.
    type Crl: RevocationList<Self>;

    fn der(&self) -> &[u8];

    /// DER encoding of the subject RDN sequence.
    fn subject_dn(&self) -> &[u8];

    /// DER encoding of the issuer RDN sequence.
    fn issuer_dn(&self) -> &[u8];

    /// Serial number as the raw big-endian INTEGER content bytes.
    fn serial(&self) -> &[u8];

    /// DER encoding of the SubjectPublicKeyInfo.
    fn public_key(&self) -> &[u8];

    fn validity(&self) -> Validity;

    /// `None` when the certificate carries no keyUsage extension.
    fn key_usage(&self) -> Option<KeyUsage>;

    /// `None` when the certificate carries no basicConstraints extension.
    fn basic_constraints(&self) -> Option<BasicConstraints>;

    fn subject_key_id(&self) -> Option<&[u8]>;

    fn authority_key_id(&self) -> Option<&[u8]>;

    /// dNSName entries of the subjectAltName extension.
    fn dns_names(&self) -> Vec<String>;

    /// iPAddress entries of the subjectAltName extension.
    fn ip_addresses(&self) -> Vec<IpAddr>;

    /// The first commonName attribute of the subject, if any.
    fn common_name(&self) -> Option<String>;

    /// Extended key usage OIDs in dotted-decimal form, or `None` when the
    /// extension is absent (the key is unrestricted).
    fn key_purposes(&self) -> Option<Vec<String>>;

    /// OID of the algorithm this certificate was signed with.
    fn signature_algorithm(&self) -> &str;

    /// Verify this certificate's signature with `issuer`'s public key.
    fn verify_signature(&self, issuer: &Self) -> bool;

    /// Whether `candidate` could have issued this certificate.
    ///
    /// Names must match exactly. When both key identifiers are present they
    /// must match as well, which separates re-keyed CAs sharing a name.
    fn check_issuer(&self, candidate: &Self) -> bool {
        if self.issuer_dn() != candidate.subject_dn() {
            return false;
        }
        match (self.authority_key_id(), candidate.subject_key_id()) {
            (Some(aki), Some(ski)) => aki == ski,
            _ => true,
        }
    }

    fn is_self_issued(&self) -> bool {
        self.subject_dn() == self.issuer_dn()
    }
}

/// A parsed certificate revocation list.
pub trait RevocationList<C> {
    fn der(&self) -> &[u8];

    /// DER encoding of the CRL issuer name.
    fn issuer_dn(&self) -> &[u8];

    fn this_update(&self) -> i64;

    fn next_update(&self) -> Option<i64>;

    /// Whether a certificate with this raw serial is listed as revoked.
    fn is_revoked(&self, serial: &[u8]) -> bool;

    /// Verify the CRL signature with `issuer`'s public key.
    fn verify_signature(&self, issuer: &C) -> bool;
}

/// Same DER encoding.
pub(crate) fn same_cert<C: Certificate>(a: &C, b: &C) -> bool {
    a.der() == b.der()
}

/// Same subject name and public key, regardless of the rest of the encoding.
pub(crate) fn same_key<C: Certificate>(a: &C, b: &C) -> bool {
    a.subject_dn() == b.subject_dn() && a.public_key() == b.public_key()
}
