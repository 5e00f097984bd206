//! OID string constants used by the verifier.
//!
//! Grouped here to avoid magic strings across the purpose, algorithm and
//! name checks.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";

// ── Signature algorithms ─────────────────────────────────────────────────

pub const MD2_WITH_RSA: &str = "1.2.840.113549.1.1.2";
pub const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";

// ── Extended Key Usage values (RFC 5280 Section 4.2.1.12) ────────────────

pub const EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const EKU_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const EKU_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
pub const EKU_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
pub const EKU_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
pub const EKU_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";
pub const EKU_ANY: &str = "2.5.29.37.0";

/// Resolve a named purpose string to its EKU OID.
///
/// Unknown names are returned as `None` so callers can treat the input as
/// a literal dotted-decimal OID.
pub fn resolve_purpose(name: &str) -> Option<&'static str> {
    match name {
        "sslserver" | "tls-server" => Some(EKU_SERVER_AUTH),
        "sslclient" | "tls-client" => Some(EKU_CLIENT_AUTH),
        "smimesign" | "smimeencrypt" => Some(EKU_EMAIL_PROTECTION),
        "codesign" => Some(EKU_CODE_SIGNING),
        "timestampsign" => Some(EKU_TIME_STAMPING),
        "ocsphelper" => Some(EKU_OCSP_SIGNING),
        "any" => Some(EKU_ANY),
        _ => None,
    }
}
