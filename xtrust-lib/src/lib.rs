//! xtrust-lib: X.509 trust lists and certificate chain verification.
//!
//! The centre of the crate is [`TrustList`], a hashed index of trusted CA
//! certificates, CRLs, name-pinned certificates and a blacklist. Verifying a
//! chain against it sorts the supplied certificates, shortens the chain at
//! the first already-trusted certificate, resolves the trust anchor through
//! the bucket index and produces a [`CertStatus`] bitmask. Revocation data
//! (CRLs in the trust list, an optional OCSP response through
//! [`PeerVerifier`]) is overlaid on that status.
//!
//! Certificates are consumed through the [`Certificate`] trait. [`X509Cert`]
//! and [`X509Crl`] implement it on top of `x509-parser`.

mod cert;
mod fingerprint;
pub mod ocsp;
mod oid;
mod peer;
mod report;
mod status;
mod util;
pub mod verify;
mod x509;

pub use cert::{BasicConstraints, Certificate, KeyUsage, RevocationList, Validity};
pub use fingerprint::compute_fingerprint;
pub use ocsp::{check_ocsp_response, OcspCertStatus, OcspDecoder, OcspVerdict};
pub use oid::{resolve_purpose, EKU_ANY, EKU_CLIENT_AUTH, EKU_SERVER_AUTH};
pub use peer::PeerVerifier;
pub use report::{ChainCertInfo, VerificationReport};
pub use status::{CertStatus, TrustListFlags, VerifyFlags};
pub use util::{hex_colon_upper, hostname_matches, is_pem};
pub use verify::{
    check_if_sorted, find_system_ca_bundle, sort_chain, BasicPathValidator, ChainValidator,
    ExternalToken, MemoryToken, ReleasedTrust, TrustList, TrustListOptions, VerifyHint,
    VerifyOutput, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_VERIFY_DEPTH, MAX_NAME_SIZE, MAX_SORT_DEPTH,
};
pub use x509::{parse_pem_chain, parse_pem_chain_sorted, parse_pem_crl, X509Cert, X509Crl};

/// Errors returned by xtrust-lib.
///
/// Verification verdicts are never errors: a call that performed the
/// verification returns `Ok` with a possibly non-empty [`CertStatus`].
#[derive(Debug, thiserror::Error)]
pub enum XtrustError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Memory allocation failed: {0}")]
    Memory(#[from] std::collections::TryReserveError),

    #[error("Certificate chain of length {len} exceeds the maximum verification depth of {max}")]
    Constraint { len: usize, max: usize },

    #[error("Requested data not available")]
    DataNotAvailable,

    #[error("Certificate list is not sorted from subject to issuer")]
    UnsortedChain,

    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("OCSP error: {0}")]
    Ocsp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout xtrust-lib.
pub type Result<T> = std::result::Result<T, XtrustError>;
