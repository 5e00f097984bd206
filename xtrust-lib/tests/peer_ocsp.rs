#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Peer verification with stapled OCSP responses.

mod common;

use common::{trust_list, MockCert, Pki, NOW};
use std::sync::Mutex;
use xtrust_lib::*;

/// Returns a fixed verdict and records which certificates it was asked
/// about.
struct StaticDecoder {
    verdict: std::result::Result<OcspVerdict, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticDecoder {
    fn new(status: OcspCertStatus) -> Self {
        Self::with_verdict(OcspVerdict {
            subject_matches: true,
            verified: true,
            status,
            this_update: NOW - 600,
            next_update: Some(NOW + 3600),
        })
    }

    fn with_verdict(verdict: OcspVerdict) -> Self {
        StaticDecoder {
            verdict: Ok(verdict),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        StaticDecoder {
            verdict: Err("truncated response".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl OcspDecoder<MockCert> for StaticDecoder {
    fn decode(
        &self,
        _raw: &[u8],
        subject: &MockCert,
        issuer: &MockCert,
    ) -> std::result::Result<OcspVerdict, XtrustError> {
        self.calls
            .lock()
            .unwrap()
            .push((subject.subject.clone(), issuer.subject.clone()));
        self.verdict.clone().map_err(XtrustError::Ocsp)
    }
}

const RESPONSE: &[u8] = b"stapled";

fn verify_peers(
    list: &TrustList<MockCert>,
    decoder: &StaticDecoder,
    chain: &[MockCert],
    flags: VerifyFlags,
) -> CertStatus {
    PeerVerifier::new(list, flags)
        .with_ocsp_decoder(decoder)
        .verify_peers(chain, None, None, Some(RESPONSE), VerifyOutput::none())
        .unwrap()
}

// ---------------------------------------------------------------------------
// OCSP overlay
// ---------------------------------------------------------------------------

#[test]
fn good_response_keeps_chain_trusted() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let decoder = StaticDecoder::new(OcspCertStatus::Good);
    let status = verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty());
    assert!(status.is_trusted());
    assert_eq!(
        decoder.calls(),
        vec![("example.com".to_string(), "Intermediate".to_string())]
    );
}

#[test]
fn revoked_response_adds_revoked() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let decoder = StaticDecoder::new(OcspCertStatus::Revoked);
    assert_eq!(
        verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty()),
        CertStatus::REVOKED
    );
}

#[test]
fn revoked_response_adds_to_other_failures() {
    let pki = Pki::new();
    let list = trust_list();
    let decoder = StaticDecoder::new(OcspCertStatus::Revoked);
    let status = verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty());
    assert!(status.contains(CertStatus::SIGNER_NOT_FOUND | CertStatus::INVALID));
    assert!(status.contains(CertStatus::REVOKED));
}

#[test]
fn unknown_response_is_neutral() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let decoder = StaticDecoder::new(OcspCertStatus::Unknown);
    assert!(verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty()).is_trusted());
}

#[test]
fn unusable_responses_are_ignored() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let revoked = OcspVerdict {
        subject_matches: true,
        verified: true,
        status: OcspCertStatus::Revoked,
        this_update: NOW - 600,
        next_update: Some(NOW + 3600),
    };

    let unrelated = OcspVerdict {
        subject_matches: false,
        ..revoked.clone()
    };
    let unverified = OcspVerdict {
        verified: false,
        ..revoked.clone()
    };
    let superseded = OcspVerdict {
        next_update: Some(NOW - 1),
        ..revoked.clone()
    };
    let old = OcspVerdict {
        this_update: NOW - 4 * 24 * 3600,
        next_update: None,
        ..revoked.clone()
    };

    for verdict in [unrelated, unverified, superseded, old] {
        let decoder = StaticDecoder::with_verdict(verdict.clone());
        let status = verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty());
        assert!(status.is_trusted(), "{:?} changed the status", verdict);
    }

    let decoder = StaticDecoder::failing();
    assert!(verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::empty()).is_trusted());
    assert_eq!(decoder.calls().len(), 1);
}

#[test]
fn response_without_decoder_is_ignored() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let status = PeerVerifier::new(&list, VerifyFlags::empty())
        .verify_peers(&pki.chain(), None, None, Some(RESPONSE), VerifyOutput::none())
        .unwrap();
    assert!(status.is_trusted());
}

#[test]
fn disabled_crl_checks_skip_ocsp() {
    let pki = Pki::new();
    let list = pki.trust_root();
    let decoder = StaticDecoder::new(OcspCertStatus::Revoked);
    let status = verify_peers(&list, &decoder, &pki.chain(), VerifyFlags::DISABLE_CRL_CHECKS);
    assert!(status.is_trusted());
    assert!(decoder.calls().is_empty());
}

#[test]
fn lone_leaf_issuer_comes_from_trust_list() {
    let root = MockCert::root("Root");
    let leaf = MockCert::leaf("example.com", &root);
    let mut list = trust_list();
    list.add_cas(vec![root], TrustListFlags::empty());

    let decoder = StaticDecoder::new(OcspCertStatus::Revoked);
    let status = verify_peers(&list, &decoder, &[leaf], VerifyFlags::empty());
    assert_eq!(status, CertStatus::REVOKED);
    assert_eq!(
        decoder.calls(),
        vec![("example.com".to_string(), "Root".to_string())]
    );
}

#[test]
fn lone_leaf_without_known_issuer_skips_ocsp() {
    let leaf = MockCert::leaf("example.com", &MockCert::root("Nobody"));
    let list = trust_list();
    let decoder = StaticDecoder::new(OcspCertStatus::Revoked);
    let status = verify_peers(&list, &decoder, &[leaf], VerifyFlags::empty());
    assert!(!status.contains(CertStatus::REVOKED));
    assert!(decoder.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Hostname and purpose
// ---------------------------------------------------------------------------

#[test]
fn hostname_and_named_purpose() {
    let root = MockCert::root("Root");
    let server = MockCert::leaf("www.example.com", &root)
        .with_dns(&["*.example.com"])
        .with_purposes(Some(&[EKU_SERVER_AUTH][..]));
    let mut list = trust_list();
    list.add_cas(vec![root], TrustListFlags::empty());
    let verifier = PeerVerifier::new(&list, VerifyFlags::empty());

    let status = verifier
        .verify_peers(
            &[server.clone()],
            Some("mail.example.com"),
            Some("tls-server"),
            None,
            VerifyOutput::none(),
        )
        .unwrap();
    assert!(status.is_trusted());

    let status = verifier
        .verify_peers(
            &[server.clone()],
            Some("example.com"),
            None,
            None,
            VerifyOutput::none(),
        )
        .unwrap();
    assert_eq!(status, CertStatus::UNEXPECTED_OWNER | CertStatus::INVALID);

    let status = verifier
        .verify_peers(
            &[server.clone()],
            None,
            Some("tls-client"),
            None,
            VerifyOutput::none(),
        )
        .unwrap();
    assert_eq!(
        status,
        CertStatus::SIGNER_CONSTRAINTS_FAILURE | CertStatus::INVALID
    );

    let status = verifier
        .verify_peers(
            &[server],
            None,
            Some(EKU_SERVER_AUTH),
            None,
            VerifyOutput::none(),
        )
        .unwrap();
    assert!(status.is_trusted());
}

#[test]
fn empty_peer_chain_is_an_error() {
    let list = trust_list();
    let result = PeerVerifier::new(&list, VerifyFlags::empty()).verify_peers(
        &[],
        None,
        None,
        None,
        VerifyOutput::none(),
    );
    assert!(matches!(result, Err(XtrustError::InvalidRequest(_))));
}
