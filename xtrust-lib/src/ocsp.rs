//! OCSP status overlay.
//!
//! Decoding and signature verification of OCSP responses belong to an
//! [`OcspDecoder`]; this module only turns a decoded response into status
//! bits. A stapled response that cannot be used is logged and ignored:
//! presenting one must never make verification fail where omitting it
//! would have succeeded.

use crate::cert::Certificate;
use crate::status::CertStatus;
use crate::XtrustError;
use serde::Serialize;

/// Responses without a nextUpdate are considered stale after three days.
pub const MAX_OCSP_VALIDITY_SECS: i64 = 3 * 24 * 60 * 60;

/// Certificate status carried by a single OCSP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OcspCertStatus {
    Good,
    Revoked,
    Unknown,
}

/// What a decoder learned from an OCSP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspVerdict {
    /// The response is about the certificate it was checked against.
    pub subject_matches: bool,
    /// The response signature verified against the issuer.
    pub verified: bool,
    pub status: OcspCertStatus,
    pub this_update: i64,
    pub next_update: Option<i64>,
}

/// Decodes and verifies raw OCSP responses.
pub trait OcspDecoder<C: Certificate>: Send + Sync {
    fn decode(&self, raw: &[u8], subject: &C, issuer: &C) -> Result<OcspVerdict, XtrustError>;
}

/// Status bits contributed by a decoded OCSP response at time `now`.
///
/// Only a matching, verified and fresh response can contribute, and only
/// `REVOKED`. Everything else yields an empty status.
pub fn check_ocsp_response(verdict: &OcspVerdict, now: i64) -> CertStatus {
    if !verdict.subject_matches {
        log::warn!("got OCSP response on an unrelated certificate");
        return CertStatus::empty();
    }
    if !verdict.verified {
        log::warn!("OCSP response could not be verified, ignoring it");
        return CertStatus::empty();
    }

    match verdict.next_update {
        None => {
            if now - verdict.this_update > MAX_OCSP_VALIDITY_SECS {
                log::warn!("the OCSP response is old");
                return CertStatus::empty();
            }
        }
        Some(next_update) => {
            if next_update < now {
                log::warn!("there is a newer OCSP response but it was not provided");
                return CertStatus::empty();
            }
        }
    }

    if verdict.status == OcspCertStatus::Revoked {
        log::warn!("the certificate was revoked via OCSP");
        return CertStatus::REVOKED;
    }
    CertStatus::empty()
}
