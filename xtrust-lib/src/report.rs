//! Human and machine readable verification reports.

use crate::cert::Certificate;
use crate::fingerprint::compute_fingerprint;
use crate::status::CertStatus;
use crate::x509::X509Cert;
use crate::XtrustError;
use serde::Serialize;

/// Result of verifying one chain, ready for display or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Whether the chain is trusted (empty status).
    pub is_valid: bool,
    /// Raw status bits.
    pub status: u32,
    /// One explanation per status flag (empty if `is_valid` is true).
    pub reasons: Vec<String>,
    /// The certificates as supplied, leaf first.
    pub chain: Vec<ChainCertInfo>,
}

/// Information about a certificate in the verified chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainCertInfo {
    /// Position in chain (0 = leaf).
    pub depth: usize,
    pub subject: String,
    pub issuer: String,
    /// Common name, or the full subject when there is none.
    pub short_name: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// SHA-256 fingerprint of the DER encoding.
    pub fingerprint: String,
    /// Subject key identifier in lowercase hex, if present.
    pub subject_key_id: Option<String>,
}

impl ChainCertInfo {
    pub fn new(depth: usize, cert: &X509Cert) -> Self {
        ChainCertInfo {
            depth,
            subject: cert.subject_string().to_string(),
            issuer: cert.issuer_string().to_string(),
            short_name: cert
                .common_name()
                .unwrap_or_else(|| cert.subject_string().to_string()),
            serial: cert.serial_hex(),
            fingerprint: compute_fingerprint(cert.der()),
            subject_key_id: cert.subject_key_id().map(hex::encode),
        }
    }
}

impl VerificationReport {
    pub fn new(chain: &[X509Cert], status: CertStatus) -> Self {
        VerificationReport {
            is_valid: status.is_trusted(),
            status: status.bits(),
            reasons: status.reasons().into_iter().map(String::from).collect(),
            chain: chain
                .iter()
                .enumerate()
                .map(|(depth, cert)| ChainCertInfo::new(depth, cert))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, XtrustError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [serial], [OK/FAIL], [optional reasons]
        if let Some(leaf) = self.chain.first() {
            write!(f, "{}, {}, ", leaf.short_name, leaf.serial)?;
        }
        if self.is_valid {
            write!(f, "OK")?;
        } else {
            write!(f, "FAIL")?;
            if !self.reasons.is_empty() {
                write!(f, ", {}", self.reasons.join("; "))?;
            }
        }
        Ok(())
    }
}
