//! Verification of a sorted chain against a set of trusted CAs.
//!
//! [`ChainValidator`] is the primitive the trust list calls once it has
//! picked the bucket to verify against. [`BasicPathValidator`] is the
//! default implementation: per-link issuer, CA, path length, signature,
//! algorithm and validity checks.

use super::helpers::{
    check_time, intermediates_below, is_ca_signer, is_insecure_algorithm,
};
use super::VerifyOutput;
use crate::cert::{same_cert, same_key, Certificate};
use crate::status::{CertStatus, VerifyFlags};

/// Verifies a chain, ordered from subject to issuer, against `trusted`.
///
/// Returns an empty status only when every link verifies, the last
/// certificate chains to one of `trusted`, and every validity window and
/// structural constraint holds.
pub trait ChainValidator<C: Certificate>: Send + Sync {
    fn verify_chain(
        &self,
        chain: &[&C],
        trusted: &[C],
        flags: VerifyFlags,
        now: i64,
        output: &mut VerifyOutput<'_, C>,
    ) -> CertStatus;
}

/// The default [`ChainValidator`].
///
/// The first failing link ends verification; its status is returned with
/// `INVALID` set. Every examined link is reported to the output callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPathValidator;

impl<C: Certificate> ChainValidator<C> for BasicPathValidator {
    #[allow(clippy::indexing_slicing)] // i + 1 < chain.len() inside the link loop
    fn verify_chain(
        &self,
        chain: &[&C],
        trusted: &[C],
        flags: VerifyFlags,
        now: i64,
        output: &mut VerifyOutput<'_, C>,
    ) -> CertStatus {
        let mut chain = chain.to_vec();
        if chain.len() > 1 && chain.last().is_some_and(|last| last.check_issuer(last)) {
            chain.pop();
        }

        // Cut at the first certificate that is itself trusted. The leaf
        // must match byte for byte, CAs by subject and key.
        let first = if flags.contains(VerifyFlags::DO_NOT_ALLOW_SAME) {
            1
        } else {
            0
        };
        let mut cut = None;
        for (i, cert) in chain.iter().enumerate().skip(first) {
            let anchor = trusted.iter().find(|ca| {
                if i == 0 {
                    same_cert(*cert, *ca)
                } else {
                    same_key(*cert, *ca)
                }
            });
            if let Some(ca) = anchor {
                let status = if flags.trusted_time_checks() {
                    check_time(ca, now)
                } else {
                    CertStatus::empty()
                };
                output.emit(cert, Some(ca), None, status);
                if !status.is_empty() {
                    return status;
                }
                cut = Some(i);
                break;
            }
        }
        if let Some(len) = cut {
            chain.truncate(len);
        }

        let Some(&last) = chain.last() else {
            return CertStatus::empty();
        };

        let anchor = trusted.iter().find(|ca| last.check_issuer(ca));
        let status = match anchor {
            Some(ca) => verify_link(&chain, chain.len() - 1, ca, true, flags, now),
            None => CertStatus::SIGNER_NOT_FOUND | CertStatus::INVALID,
        };
        output.emit(last, anchor, None, status);
        if !status.is_empty() {
            return status;
        }

        for i in (0..chain.len() - 1).rev() {
            let (cert, issuer) = (chain[i], chain[i + 1]);
            let status = if cert.check_issuer(issuer) {
                verify_link(&chain, i, issuer, false, flags, now)
            } else {
                CertStatus::SIGNER_NOT_FOUND | CertStatus::INVALID
            };
            output.emit(cert, Some(issuer), None, status);
            if !status.is_empty() {
                return status;
            }
        }

        CertStatus::empty()
    }
}

/// Verify `chain[index]` against `issuer`, which is either the next
/// certificate in the chain or a trusted anchor.
fn verify_link<C: Certificate>(
    chain: &[&C],
    index: usize,
    issuer: &C,
    trusted_anchor: bool,
    flags: VerifyFlags,
    now: i64,
) -> CertStatus {
    let Some(&cert) = chain.get(index) else {
        return CertStatus::SIGNER_NOT_FOUND | CertStatus::INVALID;
    };

    if !flags.contains(VerifyFlags::DISABLE_CA_SIGN) && !is_ca_signer(issuer, trusted_anchor) {
        return CertStatus::SIGNER_NOT_CA | CertStatus::INVALID;
    }

    if let Some(path_len) = issuer.basic_constraints().and_then(|bc| bc.path_len) {
        let below = intermediates_below(chain, index + 1);
        if below > path_len as usize {
            log::debug!(
                "path length constraint {} violated by {} intermediates",
                path_len,
                below
            );
            return CertStatus::SIGNER_CONSTRAINTS_FAILURE | CertStatus::INVALID;
        }
    }

    if !cert.verify_signature(issuer) {
        return CertStatus::SIGNATURE_FAILURE | CertStatus::INVALID;
    }

    if is_insecure_algorithm(cert.signature_algorithm(), flags) {
        return CertStatus::INSECURE_ALGORITHM | CertStatus::INVALID;
    }

    if flags.time_checks() {
        if trusted_anchor && flags.trusted_time_checks() {
            let status = check_time(issuer, now);
            if !status.is_empty() {
                return status;
            }
        }
        return check_time(cert, now);
    }

    CertStatus::empty()
}
