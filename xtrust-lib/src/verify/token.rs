//! External trust tokens.
//!
//! A token is a second source of trust anchors (a PKCS#11 module, an OS
//! store) consulted only when the trust list itself cannot find a signer.

use super::checks::{BasicPathValidator, ChainValidator};
use super::VerifyOutput;
use crate::cert::Certificate;
use crate::status::{CertStatus, VerifyFlags};

/// A source of trust anchors outside the trust list.
pub trait ExternalToken<C: Certificate>: Send + Sync {
    /// An owned copy of a CA in the token that could have issued `cert`.
    fn find_issuer(&self, cert: &C) -> Option<C>;

    /// Verify a sorted, shortened chain against the token's anchors.
    fn verify_chain(
        &self,
        chain: &[&C],
        flags: VerifyFlags,
        now: i64,
        output: &mut VerifyOutput<'_, C>,
    ) -> CertStatus;
}

/// An [`ExternalToken`] backed by an in-memory set of CAs.
pub struct MemoryToken<C: Certificate> {
    cas: Vec<C>,
    validator: Box<dyn ChainValidator<C>>,
}

impl<C: Certificate> MemoryToken<C> {
    pub fn new(cas: Vec<C>) -> Self {
        Self::with_validator(cas, BasicPathValidator)
    }

    pub fn with_validator<V: ChainValidator<C> + 'static>(cas: Vec<C>, validator: V) -> Self {
        MemoryToken {
            cas,
            validator: Box::new(validator),
        }
    }

    pub fn len(&self) -> usize {
        self.cas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cas.is_empty()
    }
}

impl<C: Certificate + Send + Sync> ExternalToken<C> for MemoryToken<C> {
    fn find_issuer(&self, cert: &C) -> Option<C> {
        self.cas.iter().find(|ca| cert.check_issuer(ca)).cloned()
    }

    fn verify_chain(
        &self,
        chain: &[&C],
        flags: VerifyFlags,
        now: i64,
        output: &mut VerifyOutput<'_, C>,
    ) -> CertStatus {
        self.validator
            .verify_chain(chain, &self.cas, flags, now, output)
    }
}
