//! Verification entry points of [`TrustList`].

use super::chain::{shorten_chain, sort_chain};
use super::crl::{check_cert_revocation, check_chain_revocation};
use super::helpers::{check_hostname, check_key_purpose};
use super::{TrustList, VerifyHint, VerifyOutput};
use crate::cert::{same_cert, Certificate};
use crate::status::{CertStatus, VerifyFlags};
use crate::XtrustError;

impl<C: Certificate> TrustList<C> {
    /// Verify `chain` (leaf first, any order unless
    /// `DO_NOT_ALLOW_UNSORTED_CHAIN` is set).
    pub fn verify_crt(
        &self,
        chain: &[C],
        flags: VerifyFlags,
        output: VerifyOutput<'_, C>,
    ) -> Result<CertStatus, XtrustError> {
        self.verify_crt2(chain, &[], flags, output)
    }

    /// Verify `chain` with hostname and key purpose hints.
    ///
    /// `Ok` carries the verdict, which is empty only for a trusted chain.
    /// An empty chain is an invalid request; a chain longer than the
    /// configured maximum depth is a constraint error.
    pub fn verify_crt2(
        &self,
        chain: &[C],
        hints: &[VerifyHint],
        flags: VerifyFlags,
        mut output: VerifyOutput<'_, C>,
    ) -> Result<CertStatus, XtrustError> {
        if chain.is_empty() {
            return Err(XtrustError::InvalidRequest(
                "empty certificate chain".into(),
            ));
        }
        if let Some(max) = self.options.max_verify_depth.filter(|&max| max > 0) {
            if chain.len() > max {
                return Err(XtrustError::Constraint {
                    len: chain.len(),
                    max,
                });
            }
        }

        let mut hostname = None;
        let mut purpose = None;
        for hint in hints {
            match hint {
                VerifyHint::DnsHostname(name) => hostname = Some(name.as_str()),
                VerifyHint::KeyPurposeOid(oid) => purpose = Some(oid.as_str()),
            }
        }

        let supplied: Vec<&C> = chain.iter().collect();
        if self.is_blacklisted(&supplied) {
            log::debug!("chain contains a distrusted certificate");
            return Ok(CertStatus::REVOKED | CertStatus::INVALID);
        }

        let mut chain = if flags.contains(VerifyFlags::DO_NOT_ALLOW_UNSORTED_CHAIN) {
            supplied
        } else {
            sort_chain(&supplied)
        };
        shorten_chain(self, &mut chain);

        let (Some(&leaf), Some(&last)) = (chain.first(), chain.last()) else {
            return Err(XtrustError::InvalidRequest(
                "empty certificate chain".into(),
            ));
        };
        let now = self.now();

        // Bucket of the last certificate's issuer first; when the signer is
        // not there and the last certificate is not self-issued, it may be
        // a trusted CA itself, so retry with the bucket of its subject.
        let mut status = CertStatus::empty();
        for (attempt, dn) in [last.issuer_dn(), last.subject_dn()].into_iter().enumerate() {
            if attempt > 0 {
                if !status.contains(CertStatus::SIGNER_NOT_FOUND) || last.is_self_issued() {
                    break;
                }
                log::debug!("signer not found, retrying with the subject bucket");
            }
            status = self.validator.verify_chain(
                &chain,
                &self.bucket(dn).trusted_cas,
                flags,
                now,
                &mut output,
            );
        }

        if status.contains(CertStatus::SIGNER_NOT_FOUND) {
            if let Some(token) = &self.token {
                log::debug!("signer not found, delegating to the external token");
                status = token.verify_chain(&chain, flags, now, &mut output);
            }
        }

        if let Some(purpose) = purpose {
            if !check_key_purpose(leaf, purpose) {
                status |= CertStatus::SIGNER_CONSTRAINTS_FAILURE | CertStatus::INVALID;
            }
        }
        if let Some(hostname) = hostname {
            if !check_hostname(leaf, hostname) {
                status |= CertStatus::UNEXPECTED_OWNER | CertStatus::INVALID;
            }
        }

        if !status.is_empty() || flags.contains(VerifyFlags::DISABLE_CRL_CHECKS) {
            return Ok(status);
        }
        Ok(check_chain_revocation(self, &chain, now, &mut output))
    }

    /// Verify `cert` against the certificates pinned to `name` with
    /// [`TrustList::add_named_cert`]. No chain is built.
    pub fn verify_named_crt(
        &self,
        cert: &C,
        name: &[u8],
        flags: VerifyFlags,
        mut output: VerifyOutput<'_, C>,
    ) -> Result<CertStatus, XtrustError> {
        if self.is_blacklisted(&[cert]) {
            return Ok(CertStatus::REVOKED | CertStatus::INVALID);
        }

        let bucket = self.bucket(cert.issuer_dn());
        let pinned = bucket
            .named_certs
            .iter()
            .any(|named| same_cert(&named.cert, cert) && named.name == name);
        if !pinned {
            return Ok(CertStatus::INVALID | CertStatus::SIGNER_NOT_FOUND);
        }

        if flags.contains(VerifyFlags::DISABLE_CRL_CHECKS) {
            return Ok(CertStatus::empty());
        }
        Ok(check_cert_revocation(
            cert,
            &bucket.crls,
            self.now(),
            &mut output,
        ))
    }

    fn is_blacklisted(&self, chain: &[&C]) -> bool {
        chain
            .iter()
            .any(|cert| self.blacklist.iter().any(|b| same_cert(b, *cert)))
    }
}
