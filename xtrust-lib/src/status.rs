//! Verification status and flag bitmasks.
//!
//! [`CertStatus`] is the verdict of a verification call. It is a bitmask,
//! not an enum: several independent failures may be reported at once, and
//! an empty status means the chain is trusted. Bit positions are fixed and
//! part of the public interface, so raw statuses can be stored and
//! exchanged with C callers.

use bitflags::bitflags;

bitflags! {
    /// Outcome of a certificate verification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CertStatus: u32 {
        /// Aggregate "do not trust" flag, set alongside every hard failure.
        const INVALID = 1 << 1;
        const REVOKED = 1 << 5;
        const SIGNER_NOT_FOUND = 1 << 6;
        const SIGNER_NOT_CA = 1 << 7;
        const INSECURE_ALGORITHM = 1 << 8;
        const NOT_ACTIVATED = 1 << 9;
        const EXPIRED = 1 << 10;
        const SIGNATURE_FAILURE = 1 << 11;
        const REVOCATION_DATA_SUPERSEDED = 1 << 12;
        const UNEXPECTED_OWNER = 1 << 14;
        const REVOCATION_DATA_ISSUED_IN_FUTURE = 1 << 15;
        const SIGNER_CONSTRAINTS_FAILURE = 1 << 16;
        const MISMATCH = 1 << 17;
    }
}

/// Human-readable explanation for each status flag, in reporting order.
const REASONS: &[(CertStatus, &str)] = &[
    (CertStatus::REVOKED, "the certificate chain is revoked"),
    (
        CertStatus::MISMATCH,
        "the certificate does not match the expected one",
    ),
    (
        CertStatus::SIGNER_NOT_FOUND,
        "the certificate issuer is unknown",
    ),
    (CertStatus::SIGNER_NOT_CA, "the certificate issuer is not a CA"),
    (
        CertStatus::SIGNER_CONSTRAINTS_FAILURE,
        "the certificate chain violates the signer's constraints",
    ),
    (
        CertStatus::INSECURE_ALGORITHM,
        "the certificate chain uses an insecure algorithm",
    ),
    (
        CertStatus::NOT_ACTIVATED,
        "the certificate chain uses a not yet valid certificate",
    ),
    (
        CertStatus::EXPIRED,
        "the certificate chain uses an expired certificate",
    ),
    (
        CertStatus::SIGNATURE_FAILURE,
        "the signature in the certificate is invalid",
    ),
    (
        CertStatus::UNEXPECTED_OWNER,
        "the name in the certificate does not match the expected",
    ),
    (
        CertStatus::REVOCATION_DATA_SUPERSEDED,
        "the revocation data are old and have been superseded",
    ),
    (
        CertStatus::REVOCATION_DATA_ISSUED_IN_FUTURE,
        "the revocation data have a future issue date",
    ),
];

impl CertStatus {
    /// Whether the verdict is "trusted, no issues found".
    pub fn is_trusted(self) -> bool {
        self.is_empty()
    }

    /// One explanation per set flag. `INVALID` alone contributes a generic
    /// "not trusted" line so that no non-empty status yields an empty list.
    pub fn reasons(self) -> Vec<&'static str> {
        let mut reasons: Vec<&'static str> = REASONS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, text)| *text)
            .collect();
        if reasons.is_empty() && !self.is_empty() {
            reasons.push("the certificate is not trusted");
        }
        reasons
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_trusted() {
            return write!(f, "the certificate is trusted");
        }
        write!(f, "the certificate is NOT trusted")?;
        for reason in self.reasons() {
            write!(f, "; {}", reason)?;
        }
        Ok(())
    }
}

bitflags! {
    /// Flags controlling chain verification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VerifyFlags: u32 {
        /// Do not require issuers to be CAs with `keyCertSign`.
        const DISABLE_CA_SIGN = 1 << 0;
        /// Never cut the leaf itself out of the chain because it is trusted.
        const DO_NOT_ALLOW_SAME = 1 << 2;
        const ALLOW_SIGN_RSA_MD2 = 1 << 4;
        const ALLOW_SIGN_RSA_MD5 = 1 << 5;
        const DISABLE_TIME_CHECKS = 1 << 6;
        const DISABLE_TRUSTED_TIME_CHECKS = 1 << 7;
        /// Skip the CRL and OCSP revocation overlays.
        const DISABLE_CRL_CHECKS = 1 << 9;
        /// Verify the chain in the order supplied instead of sorting it.
        const DO_NOT_ALLOW_UNSORTED_CHAIN = 1 << 11;
    }
}

impl VerifyFlags {
    pub(crate) fn time_checks(self) -> bool {
        !self.contains(VerifyFlags::DISABLE_TIME_CHECKS)
    }

    pub(crate) fn trusted_time_checks(self) -> bool {
        self.time_checks() && !self.contains(VerifyFlags::DISABLE_TRUSTED_TIME_CHECKS)
    }
}

bitflags! {
    /// Flags for adding CAs and CRLs to a trust list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TrustListFlags: u32 {
        /// Advertise added CA names to TLS peers through the RDN sequence.
        const USE_IN_TLS = 1 << 0;
        /// Verify each CRL against the CAs already in its bucket.
        const VERIFY_CRL = 1 << 1;
        /// Replace an identical certificate instead of appending a second copy.
        const NO_DUPLICATES = 1 << 2;
        /// Like `NO_DUPLICATES`, matching on subject and public key.
        const NO_DUPLICATE_KEY = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_status_is_trusted() {
        assert!(CertStatus::empty().is_trusted());
        assert!(CertStatus::empty().reasons().is_empty());
        assert_eq!(
            CertStatus::empty().to_string(),
            "the certificate is trusted"
        );
    }

    #[test]
    fn bit_positions_are_stable() {
        assert_eq!(CertStatus::INVALID.bits(), 2);
        assert_eq!(CertStatus::REVOKED.bits(), 32);
        assert_eq!(CertStatus::SIGNER_NOT_FOUND.bits(), 64);
        assert_eq!(CertStatus::UNEXPECTED_OWNER.bits(), 16384);
        assert_eq!(CertStatus::MISMATCH.bits(), 131072);
    }

    #[test]
    fn reasons_follow_set_flags() {
        let status = CertStatus::REVOKED | CertStatus::INVALID;
        assert_eq!(status.reasons(), vec!["the certificate chain is revoked"]);
        let text = status.to_string();
        assert!(text.starts_with("the certificate is NOT trusted"));
        assert!(text.contains("revoked"));
    }

    #[test]
    fn invalid_alone_still_explains() {
        assert_eq!(
            CertStatus::INVALID.reasons(),
            vec!["the certificate is not trusted"]
        );
    }

    #[test]
    fn time_check_helpers() {
        assert!(VerifyFlags::empty().trusted_time_checks());
        assert!(!VerifyFlags::DISABLE_TIME_CHECKS.trusted_time_checks());
        assert!(VerifyFlags::DISABLE_TRUSTED_TIME_CHECKS.time_checks());
        assert!(!VerifyFlags::DISABLE_TRUSTED_TIME_CHECKS.trusted_time_checks());
    }
}
