//! x509-parser backed certificate and CRL handles.
//!
//! [`X509Cert`] and [`X509Crl`] parse DER once and keep owned copies of the
//! fields the verifier needs, so they can be stored in a trust list and
//! shared across threads. Signature checks re-parse the stored DER.

use crate::cert::{BasicConstraints, Certificate, KeyUsage, RevocationList, Validity};
use crate::oid;
use crate::verify::check_if_sorted;
use crate::XtrustError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

/// PEM labels accepted as certificates.
pub(crate) const CERT_LABELS: &[&str] = &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

/// PEM label of a CRL.
pub(crate) const CRL_LABEL: &str = "X509 CRL";

/// A parsed X.509 certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct X509Cert {
    der: Vec<u8>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    serial: Vec<u8>,
    spki: Vec<u8>,
    validity: Validity,
    key_usage: Option<KeyUsage>,
    basic_constraints: Option<BasicConstraints>,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
    common_name: Option<String>,
    key_purposes: Option<Vec<String>>,
    signature_algorithm: String,
    subject_string: String,
    issuer_string: String,
}

impl std::fmt::Debug for X509Cert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509Cert")
            .field("subject", &self.subject_string)
            .field("issuer", &self.issuer_string)
            .field("serial", &self.serial_hex())
            .finish()
    }
}

impl X509Cert {
    /// Parse a DER-encoded certificate. Trailing bytes are ignored so the
    /// stored encoding (and every identity comparison) covers the
    /// certificate alone.
    pub fn from_der(input: &[u8]) -> Result<Self, XtrustError> {
        let (remaining, x509) =
            X509Certificate::from_der(input).map_err(|e| XtrustError::DerError(format!("{}", e)))?;
        let cert_len = input.len() - remaining.len();
        let der = input.get(..cert_len).unwrap_or(input).to_vec();
        Ok(Self::build(&x509, der))
    }

    /// Parse a single PEM-encoded certificate.
    pub fn from_pem(input: &[u8]) -> Result<Self, XtrustError> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(input)
            .map_err(|e| XtrustError::PemError(format!("{}", e)))?;
        if !CERT_LABELS.contains(&pem.label.as_str()) {
            return Err(XtrustError::PemError(format!(
                "expected CERTIFICATE, got {}",
                pem.label
            )));
        }
        Self::from_der(&pem.contents)
    }

    fn build(x509: &X509Certificate, der: Vec<u8>) -> Self {
        let mut subject_key_id = None;
        let mut authority_key_id = None;
        for ext in x509.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(kid) => {
                    subject_key_id = Some(kid.0.to_vec());
                }
                ParsedExtension::AuthorityKeyIdentifier(aki) => {
                    authority_key_id = aki.key_identifier.as_ref().map(|kid| kid.0.to_vec());
                }
                _ => {}
            }
        }

        X509Cert {
            subject: x509.subject().as_raw().to_vec(),
            issuer: x509.issuer().as_raw().to_vec(),
            serial: x509.raw_serial().to_vec(),
            spki: x509.public_key().raw.to_vec(),
            validity: Validity {
                not_before: x509.validity().not_before.timestamp(),
                not_after: x509.validity().not_after.timestamp(),
            },
            key_usage: extract_key_usage(x509),
            basic_constraints: x509
                .basic_constraints()
                .ok()
                .flatten()
                .map(|bc| BasicConstraints {
                    ca: bc.value.ca,
                    path_len: bc.value.path_len_constraint,
                }),
            subject_key_id,
            authority_key_id,
            dns_names: extract_san_dns_names(x509),
            ip_addresses: extract_san_ips(x509),
            common_name: extract_cn(x509),
            key_purposes: extract_key_purposes(x509),
            signature_algorithm: x509.signature_algorithm.algorithm.to_id_string(),
            subject_string: x509.subject().to_string(),
            issuer_string: x509.issuer().to_string(),
            der,
        }
    }

    /// Subject DN in RFC 4514 string form.
    pub fn subject_string(&self) -> &str {
        &self.subject_string
    }

    /// Issuer DN in RFC 4514 string form.
    pub fn issuer_string(&self) -> &str {
        &self.issuer_string
    }

    /// Serial number as colon-separated hex.
    pub fn serial_hex(&self) -> String {
        crate::util::hex_colon_upper(&self.serial)
    }
}

/// Map the keyUsage extension onto [`KeyUsage`] bits.
fn extract_key_usage(x509: &X509Certificate) -> Option<KeyUsage> {
    let ku = x509.key_usage().ok().flatten()?.value;
    let mut usage = KeyUsage::empty();
    usage.set(KeyUsage::DIGITAL_SIGNATURE, ku.digital_signature());
    usage.set(KeyUsage::NON_REPUDIATION, ku.non_repudiation());
    usage.set(KeyUsage::KEY_ENCIPHERMENT, ku.key_encipherment());
    usage.set(KeyUsage::DATA_ENCIPHERMENT, ku.data_encipherment());
    usage.set(KeyUsage::KEY_AGREEMENT, ku.key_agreement());
    usage.set(KeyUsage::KEY_CERT_SIGN, ku.key_cert_sign());
    usage.set(KeyUsage::CRL_SIGN, ku.crl_sign());
    usage.set(KeyUsage::ENCIPHER_ONLY, ku.encipher_only());
    usage.set(KeyUsage::DECIPHER_ONLY, ku.decipher_only());
    Some(usage)
}

/// Extract DNS names from the Subject Alternative Name extension.
fn extract_san_dns_names(x509: &X509Certificate) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(Some(san)) = x509.subject_alternative_name() {
        for gn in &san.value.general_names {
            if let GeneralName::DNSName(name) = gn {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Extract IP addresses from the Subject Alternative Name extension.
/// Entries that are neither 4 nor 16 bytes long are skipped.
fn extract_san_ips(x509: &X509Certificate) -> Vec<IpAddr> {
    let mut ips = Vec::new();
    if let Ok(Some(san)) = x509.subject_alternative_name() {
        for gn in &san.value.general_names {
            if let GeneralName::IPAddress(bytes) = gn {
                if let Ok(octets) = <[u8; 4]>::try_from(*bytes) {
                    ips.push(IpAddr::V4(Ipv4Addr::from(octets)));
                } else if let Ok(octets) = <[u8; 16]>::try_from(*bytes) {
                    ips.push(IpAddr::V6(Ipv6Addr::from(octets)));
                }
            }
        }
    }
    ips
}

/// Extract the Common Name from the certificate subject.
fn extract_cn(x509: &X509Certificate) -> Option<String> {
    for rdn in x509.subject().iter() {
        for attr in rdn.iter() {
            if attr.attr_type().to_id_string() == oid::COMMON_NAME {
                return attr.as_str().ok().map(|s| s.to_string());
            }
        }
    }
    None
}

/// Extract extended key usage OIDs, `None` when the extension is absent.
fn extract_key_purposes(x509: &X509Certificate) -> Option<Vec<String>> {
    let eku = x509.extended_key_usage().ok().flatten()?.value;
    let mut purposes = Vec::new();
    let known = [
        (eku.any, oid::EKU_ANY),
        (eku.server_auth, oid::EKU_SERVER_AUTH),
        (eku.client_auth, oid::EKU_CLIENT_AUTH),
        (eku.code_signing, oid::EKU_CODE_SIGNING),
        (eku.email_protection, oid::EKU_EMAIL_PROTECTION),
        (eku.time_stamping, oid::EKU_TIME_STAMPING),
        (eku.ocsp_signing, oid::EKU_OCSP_SIGNING),
    ];
    for (present, purpose) in known {
        if present {
            purposes.push(purpose.to_string());
        }
    }
    purposes.extend(eku.other.iter().map(|o| o.to_id_string()));
    Some(purposes)
}

impl Certificate for X509Cert {
    type Crl = X509Crl;

    fn der(&self) -> &[u8] {
        &self.der
    }

    fn subject_dn(&self) -> &[u8] {
        &self.subject
    }

    fn issuer_dn(&self) -> &[u8] {
        &self.issuer
    }

    fn serial(&self) -> &[u8] {
        &self.serial
    }

    fn public_key(&self) -> &[u8] {
        &self.spki
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
        &self.signature_algorithm
    }

    fn verify_signature(&self, issuer: &Self) -> bool {
        let (Ok((_, cert)), Ok((_, issuer_cert))) = (
            X509Certificate::from_der(&self.der),
            X509Certificate::from_der(&issuer.der),
        ) else {
            return false;
        };
        cert.verify_signature(Some(issuer_cert.public_key())).is_ok()
    }
}

/// A parsed certificate revocation list.
#[derive(Clone, PartialEq, Eq)]
pub struct X509Crl {
    der: Vec<u8>,
    issuer: Vec<u8>,
    issuer_string: String,
    this_update: i64,
    next_update: Option<i64>,
    revoked: Vec<Vec<u8>>,
}

impl std::fmt::Debug for X509Crl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509Crl")
            .field("issuer", &self.issuer_string)
            .field("this_update", &self.this_update)
            .field("revoked", &self.revoked.len())
            .finish()
    }
}

impl X509Crl {
    /// Parse a DER-encoded CRL.
    pub fn from_der(input: &[u8]) -> Result<Self, XtrustError> {
        let (remaining, crl) = CertificateRevocationList::from_der(input)
            .map_err(|e| XtrustError::DerError(format!("{}", e)))?;
        let crl_len = input.len() - remaining.len();
        Ok(X509Crl {
            der: input.get(..crl_len).unwrap_or(input).to_vec(),
            issuer: crl.issuer().as_raw().to_vec(),
            issuer_string: crl.issuer().to_string(),
            this_update: crl.last_update().timestamp(),
            next_update: crl.next_update().map(|t| t.timestamp()),
            revoked: crl
                .iter_revoked_certificates()
                .map(|r| r.raw_serial().to_vec())
                .collect(),
        })
    }

    /// Issuer DN in RFC 4514 string form.
    pub fn issuer_string(&self) -> &str {
        &self.issuer_string
    }

    /// Number of revoked entries.
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

impl RevocationList<X509Cert> for X509Crl {
    fn der(&self) -> &[u8] {
        &self.der
    }

    fn issuer_dn(&self) -> &[u8] {
        &self.issuer
    }

    fn this_update(&self) -> i64 {
        self.this_update
    }

    fn next_update(&self) -> Option<i64> {
        self.next_update
    }

    fn is_revoked(&self, serial: &[u8]) -> bool {
        self.revoked.iter().any(|s| s.as_slice() == serial)
    }

    fn verify_signature(&self, issuer: &X509Cert) -> bool {
        let (Ok((_, crl)), Ok((_, issuer_cert))) = (
            CertificateRevocationList::from_der(&self.der),
            X509Certificate::from_der(&issuer.der),
        ) else {
            return false;
        };
        crl.verify_signature(issuer_cert.public_key()).is_ok()
    }
}

/// Collect the contents of PEM blocks carrying one of `labels`.
///
/// Stops at the first malformed block once something was collected, so
/// trailing garbage after a bundle is tolerated.
pub(crate) fn pem_blocks(input: &[u8], labels: &[&str]) -> Result<Vec<Vec<u8>>, XtrustError> {
    let mut blocks = Vec::new();
    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if labels.contains(&pem.label.as_str()) {
                    blocks.push(pem.contents);
                }
            }
            Err(e) => {
                if !blocks.is_empty() {
                    break;
                }
                return Err(XtrustError::PemError(format!("failed to parse PEM: {}", e)));
            }
        }
    }
    Ok(blocks)
}

/// Parse a PEM bundle containing one or more certificates.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<X509Cert>, XtrustError> {
    let blocks = pem_blocks(input, CERT_LABELS)?;
    if blocks.is_empty() {
        return Err(XtrustError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }
    blocks.iter().map(|der| X509Cert::from_der(der)).collect()
}

/// Parse a PEM certificate list and require it to be sorted from subject
/// to issuer.
pub fn parse_pem_chain_sorted(input: &[u8]) -> Result<Vec<X509Cert>, XtrustError> {
    let chain = parse_pem_chain(input)?;
    check_if_sorted(&chain)?;
    Ok(chain)
}

/// Parse a PEM bundle containing one or more CRLs.
pub fn parse_pem_crl(input: &[u8]) -> Result<Vec<X509Crl>, XtrustError> {
    let blocks = pem_blocks(input, &[CRL_LABEL])?;
    if blocks.is_empty() {
        return Err(XtrustError::PemError("no CRLs found in PEM input".into()));
    }
    blocks.iter().map(|der| X509Crl::from_der(der)).collect()
}
