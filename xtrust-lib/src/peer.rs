//! Verification of a peer's certificate chain as presented in a handshake.

use crate::cert::Certificate;
use crate::ocsp::{check_ocsp_response, OcspDecoder};
use crate::oid::resolve_purpose;
use crate::status::{CertStatus, VerifyFlags};
use crate::verify::{TrustList, VerifyHint, VerifyOutput};
use crate::XtrustError;

/// Verifies peer chains against a trust list, with hostname and purpose
/// checks and an optional stapled OCSP response.
pub struct PeerVerifier<'a, C: Certificate> {
    list: &'a TrustList<C>,
    flags: VerifyFlags,
    ocsp: Option<&'a dyn OcspDecoder<C>>,
}

impl<'a, C: Certificate> PeerVerifier<'a, C> {
    pub fn new(list: &'a TrustList<C>, flags: VerifyFlags) -> Self {
        PeerVerifier {
            list,
            flags,
            ocsp: None,
        }
    }

    /// Decode stapled OCSP responses with `decoder`. Without a decoder a
    /// stapled response is ignored.
    pub fn with_ocsp_decoder(mut self, decoder: &'a dyn OcspDecoder<C>) -> Self {
        self.ocsp = Some(decoder);
        self
    }

    /// Verify `chain` (leaf first) as received from a peer.
    ///
    /// `purpose` is a dotted OID or a name such as `tls-server`. The OCSP
    /// response, if any, is consulted unless CRL checks are disabled, and
    /// can only add `REVOKED`.
    pub fn verify_peers(
        &self,
        chain: &[C],
        hostname: Option<&str>,
        purpose: Option<&str>,
        ocsp_response: Option<&[u8]>,
        output: VerifyOutput<'_, C>,
    ) -> Result<CertStatus, XtrustError> {
        let mut hints = Vec::new();
        if let Some(hostname) = hostname {
            hints.push(VerifyHint::DnsHostname(hostname.to_string()));
        }
        if let Some(purpose) = purpose {
            let oid = resolve_purpose(purpose).unwrap_or(purpose);
            hints.push(VerifyHint::KeyPurposeOid(oid.to_string()));
        }

        let mut status = self.list.verify_crt2(chain, &hints, self.flags, output)?;

        if let Some(raw) = ocsp_response {
            if !self.flags.contains(VerifyFlags::DISABLE_CRL_CHECKS) {
                status |= self.check_ocsp(chain, raw);
            }
        }
        Ok(status)
    }

    fn check_ocsp(&self, chain: &[C], raw: &[u8]) -> CertStatus {
        let Some(decoder) = self.ocsp else {
            log::warn!("OCSP response presented but no decoder is configured");
            return CertStatus::empty();
        };
        let Some(leaf) = chain.first() else {
            return CertStatus::empty();
        };

        let resolved;
        let issuer = match chain.get(1) {
            Some(issuer) => issuer,
            None => match self.list.get_issuer_owned(leaf) {
                Ok(issuer) => {
                    resolved = issuer;
                    &resolved
                }
                Err(e) => {
                    log::warn!("no issuer to check the OCSP response against: {}", e);
                    return CertStatus::empty();
                }
            },
        };

        match decoder.decode(raw, leaf, issuer) {
            Ok(verdict) => check_ocsp_response(&verdict, self.list.now()),
            Err(e) => {
                log::warn!("ignoring undecodable OCSP response: {}", e);
                CertStatus::empty()
            }
        }
    }
}
