//! Small helper functions for certificate verification.
//!
//! Time windows, signer capability, algorithm policy and the leaf checks
//! driven by verification hints.

use crate::cert::{Certificate, KeyUsage};
use crate::oid;
use crate::status::{CertStatus, VerifyFlags};
use crate::util;

/// `NOT_ACTIVATED` or `EXPIRED` (with `INVALID`) when `now` is outside the
/// certificate's validity window.
pub(crate) fn check_time<C: Certificate>(cert: &C, now: i64) -> CertStatus {
    let validity = cert.validity();
    if validity.contains(now) {
        CertStatus::empty()
    } else if now < validity.not_before {
        CertStatus::NOT_ACTIVATED | CertStatus::INVALID
    } else {
        CertStatus::EXPIRED | CertStatus::INVALID
    }
}

/// Whether `issuer` may sign certificates.
///
/// basicConstraints must say CA; a trust anchor without the extension is
/// accepted as a version 1 root. When keyUsage is present it must include
/// `keyCertSign`.
pub(crate) fn is_ca_signer<C: Certificate>(issuer: &C, trusted_anchor: bool) -> bool {
    let is_ca = match issuer.basic_constraints() {
        Some(bc) => bc.ca,
        None => trusted_anchor,
    };
    is_ca
        && issuer
            .key_usage()
            .map_or(true, |ku| ku.contains(KeyUsage::KEY_CERT_SIGN))
}

/// MD2 and MD5 signatures are rejected unless explicitly allowed.
pub(crate) fn is_insecure_algorithm(algorithm: &str, flags: VerifyFlags) -> bool {
    match algorithm {
        oid::MD2_WITH_RSA => !flags.contains(VerifyFlags::ALLOW_SIGN_RSA_MD2),
        oid::MD5_WITH_RSA => !flags.contains(VerifyFlags::ALLOW_SIGN_RSA_MD5),
        _ => false,
    }
}

/// Non-self-issued intermediates strictly between the leaf and the
/// certificate at `issuer_index` (RFC 5280 Section 6.1.4(l)).
pub(crate) fn intermediates_below<C: Certificate>(chain: &[&C], issuer_index: usize) -> usize {
    chain
        .iter()
        .take(issuer_index)
        .skip(1)
        .filter(|cert| !cert.is_self_issued())
        .count()
}

/// The leaf may be used for `purpose`: it has no extended key usage at all,
/// or lists the purpose or anyExtendedKeyUsage.
pub(crate) fn check_key_purpose<C: Certificate>(leaf: &C, purpose: &str) -> bool {
    match leaf.key_purposes() {
        None => true,
        Some(purposes) => purposes.iter().any(|p| p == purpose || p == oid::EKU_ANY),
    }
}

/// The leaf is valid for `hostname` (a DNS name or IP literal).
pub(crate) fn check_hostname<C: Certificate>(leaf: &C, hostname: &str) -> bool {
    let cn = leaf.common_name();
    util::verify_hostname_match(
        &leaf.dns_names(),
        &leaf.ip_addresses(),
        cn.as_deref(),
        hostname,
    )
}
