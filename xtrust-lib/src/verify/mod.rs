//! Certificate chain verification against a [`TrustList`].
//!
//! A verification call runs as a single pass:
//!
//! 1. precondition checks (empty chain, maximum verification depth)
//! 2. chain sorting, unless `DO_NOT_ALLOW_UNSORTED_CHAIN` is given
//! 3. chain shortening at the first certificate already in the trust list
//! 4. the blacklist check, which overrides every other verdict
//! 5. the chain validator against the bucket of the last certificate's
//!    issuer, retried with the bucket of its subject when the signer was not
//!    found, and finally delegated to an external token
//! 6. key purpose and hostname checks on the leaf
//! 7. the CRL overlay
//!
//! Every verdict is carried in the returned [`crate::CertStatus`]; only
//! misuse (empty chain, depth exceeded) and allocation failures are errors.

mod chain;
mod checks;
mod crl;
mod engine;
mod helpers;
mod system;
mod token;
mod trust_list;

use crate::cert::Certificate;
use crate::status::CertStatus;

pub use chain::{check_if_sorted, sort_chain, MAX_SORT_DEPTH};
pub use checks::{BasicPathValidator, ChainValidator};
pub use system::find_system_ca_bundle;
pub use token::{ExternalToken, MemoryToken};
pub use trust_list::{
    ReleasedTrust, TrustList, TrustListOptions, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_VERIFY_DEPTH,
    MAX_NAME_SIZE,
};

/// A typed hint passed to [`TrustList::verify_crt2`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyHint {
    /// The leaf must be valid for this DNS name or IP literal.
    DnsHostname(String),
    /// The leaf's extended key usage must allow this dotted-decimal OID.
    KeyPurposeOid(String),
}

/// Signature of the per-certificate output callback: the examined
/// certificate, its issuer, the CRL consulted (if any) and the status of
/// that single step.
pub type OutputFn<'a, C> =
    dyn FnMut(&C, Option<&C>, Option<&<C as Certificate>::Crl>, CertStatus) + 'a;

/// Optional per-certificate output callback.
///
/// The chain validator reports every link it examines and the CRL overlay
/// reports every CRL it consults.
pub struct VerifyOutput<'a, C: Certificate> {
    func: Option<&'a mut OutputFn<'a, C>>,
}

impl<'a, C: Certificate> VerifyOutput<'a, C> {
    /// No callback.
    pub fn none() -> Self {
        VerifyOutput { func: None }
    }

    pub fn new(func: &'a mut OutputFn<'a, C>) -> Self {
        VerifyOutput { func: Some(func) }
    }

    pub(crate) fn emit(
        &mut self,
        cert: &C,
        issuer: Option<&C>,
        crl: Option<&C::Crl>,
        status: CertStatus,
    ) {
        if let Some(func) = self.func.as_deref_mut() {
            func(cert, issuer, crl, status);
        }
    }
}

impl<C: Certificate> Default for VerifyOutput<'_, C> {
    fn default() -> Self {
        Self::none()
    }
}
