//! The hashed trust list.
//!
//! Trusted CAs are partitioned into buckets keyed by `hash(DN) mod N`: CAs
//! by their subject DN, CRLs and name-pinned certificates by their issuer
//! DN. Issuer lookups therefore hash the issuer DN of the certificate being
//! verified and scan a single bucket.
//!
//! Bucket order is insertion order until [`TrustList::remove_cas`] swaps the
//! last entry into the removed slot.

use super::checks::{BasicPathValidator, ChainValidator};
use super::token::ExternalToken;
use crate::cert::{same_cert, same_key, Certificate, KeyUsage, RevocationList};
use crate::status::{TrustListFlags, VerifyFlags};
use crate::XtrustError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of buckets used when none is requested.
pub const DEFAULT_BUCKET_COUNT: usize = 127;

/// Longest chain accepted by the verification entry points by default.
pub const DEFAULT_MAX_VERIFY_DEPTH: usize = 16;

/// Longest name accepted by [`TrustList::add_named_cert`].
pub const MAX_NAME_SIZE: usize = 256;

/// Construction-time configuration of a [`TrustList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustListOptions {
    /// Number of hash buckets. Zero selects [`DEFAULT_BUCKET_COUNT`].
    pub bucket_count: usize,
    /// Chains longer than this are rejected with
    /// [`XtrustError::Constraint`]. `None` or `Some(0)` disables the limit.
    pub max_verify_depth: Option<usize>,
    /// Verify at this Unix timestamp instead of the system clock.
    pub verification_time: Option<i64>,
}

impl Default for TrustListOptions {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_verify_depth: Some(DEFAULT_MAX_VERIFY_DEPTH),
            verification_time: None,
        }
    }
}

pub(crate) struct NamedCert<C> {
    pub(crate) cert: C,
    pub(crate) name: Vec<u8>,
}

pub(crate) struct Bucket<C: Certificate> {
    pub(crate) trusted_cas: Vec<C>,
    pub(crate) crls: Vec<C::Crl>,
    pub(crate) named_certs: Vec<NamedCert<C>>,
}

impl<C: Certificate> Bucket<C> {
    fn new() -> Self {
        Bucket {
            trusted_cas: Vec::new(),
            crls: Vec::new(),
            named_certs: Vec::new(),
        }
    }
}

/// Trusted CAs and CRLs handed back by [`TrustList::deinit`].
pub struct ReleasedTrust<C: Certificate> {
    pub cas: Vec<C>,
    pub crls: Vec<C::Crl>,
}

/// A set of trust anchors, CRLs, name-pinned certificates and distrusted
/// certificates against which chains are verified.
///
/// The list is not internally synchronized. Mutation takes `&mut self`;
/// verification takes `&self` and may run concurrently.
pub struct TrustList<C: Certificate> {
    pub(super) buckets: Vec<Bucket<C>>,
    pub(super) blacklist: Vec<C>,
    pub(super) rdn_sequence: Vec<u8>,
    pub(super) token: Option<Box<dyn ExternalToken<C>>>,
    pub(super) validator: Box<dyn ChainValidator<C>>,
    pub(super) options: TrustListOptions,
}

impl<C: Certificate> std::fmt::Debug for TrustList<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustList")
            .field("buckets", &self.buckets.len())
            .field("cas", &self.len())
            .field("blacklist", &self.blacklist.len())
            .field("external_token", &self.token.is_some())
            .finish()
    }
}

/// The PJW-style string hash used to select buckets.
pub(crate) fn hash_pjw_bare(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |h, &b| u32::from(b).wrapping_add(h.rotate_left(9)))
}

impl<C: Certificate> TrustList<C> {
    /// Create an empty list with `size` buckets (zero selects the default).
    pub fn init(size: usize) -> Result<Self, XtrustError> {
        Self::with_options(TrustListOptions {
            bucket_count: size,
            ..TrustListOptions::default()
        })
    }

    pub fn with_options(options: TrustListOptions) -> Result<Self, XtrustError> {
        let bucket_count = if options.bucket_count == 0 {
            DEFAULT_BUCKET_COUNT
        } else {
            options.bucket_count
        };
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(bucket_count)?;
        buckets.extend((0..bucket_count).map(|_| Bucket::new()));

        Ok(TrustList {
            buckets,
            blacklist: Vec::new(),
            rdn_sequence: Vec::new(),
            token: None,
            validator: Box::new(BasicPathValidator),
            options: TrustListOptions {
                bucket_count,
                ..options
            },
        })
    }

    /// Delegate lookups and verifications that fail locally to `token`.
    pub fn set_external_token<T: ExternalToken<C> + 'static>(&mut self, token: T) {
        self.token = Some(Box::new(token));
    }

    /// Replace the primitive that verifies a chain against trusted CAs.
    pub fn set_validator<V: ChainValidator<C> + 'static>(&mut self, validator: V) {
        self.validator = Box::new(validator);
    }

    pub fn options(&self) -> &TrustListOptions {
        &self.options
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of trusted CAs.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.trusted_cas.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.trusted_cas.is_empty())
    }

    /// All trusted CAs, bucket by bucket.
    pub fn iter_cas(&self) -> impl Iterator<Item = &C> {
        self.buckets.iter().flat_map(|b| b.trusted_cas.iter())
    }

    /// All stored CRLs, bucket by bucket.
    pub fn iter_crls(&self) -> impl Iterator<Item = &C::Crl> {
        self.buckets.iter().flat_map(|b| b.crls.iter())
    }

    /// Certificates distrusted through [`TrustList::remove_cas`].
    pub fn blacklist(&self) -> &[C] {
        &self.blacklist
    }

    /// Subject names of CAs added with `USE_IN_TLS`, each prefixed by its
    /// length as a big-endian u16.
    pub fn rdn_sequence(&self) -> &[u8] {
        &self.rdn_sequence
    }

    /// The verification time: the configured one, else the system clock.
    pub fn now(&self) -> i64 {
        self.options.verification_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64
        })
    }

    fn bucket_index(&self, dn: &[u8]) -> usize {
        hash_pjw_bare(dn) as usize % self.buckets.len()
    }

    /// The bucket a DN hashes to.
    #[allow(clippy::indexing_slicing)] // bucket_index is reduced modulo buckets.len(), never zero
    pub(crate) fn bucket(&self, dn: &[u8]) -> &Bucket<C> {
        &self.buckets[self.bucket_index(dn)]
    }

    #[allow(clippy::indexing_slicing)] // see bucket()
    fn bucket_mut(&mut self, dn: &[u8]) -> &mut Bucket<C> {
        let idx = self.bucket_index(dn);
        &mut self.buckets[idx]
    }

    /// Add trusted CAs.
    ///
    /// With `NO_DUPLICATES` an identical certificate already in the list is
    /// replaced in place; with `NO_DUPLICATE_KEY` one with the same subject
    /// and public key is. `USE_IN_TLS` also appends the subject name to the
    /// RDN sequence; a CA whose name does not fit its 16-bit length prefix
    /// is skipped. Returns the number of certificates processed, which is
    /// short of the input when an allocation fails part way.
    pub fn add_cas<I>(&mut self, cas: I, flags: TrustListFlags) -> usize
    where
        I: IntoIterator<Item = C>,
    {
        let mut processed = 0;
        for ca in cas {
            let dn_len = ca.subject_dn().len();
            let rdn_len = if flags.contains(TrustListFlags::USE_IN_TLS) {
                match u16::try_from(dn_len) {
                    Ok(len) => Some(len),
                    Err(_) => {
                        log::warn!("skipping CA whose {} byte name cannot be advertised", dn_len);
                        continue;
                    }
                }
            } else {
                None
            };
            if rdn_len.is_some() {
                if let Err(e) = self.rdn_sequence.try_reserve(dn_len + 2) {
                    log::warn!("cannot advertise CA name of {} bytes: {}", dn_len, e);
                    return processed;
                }
            }

            let bucket = self.bucket_mut(ca.subject_dn());

            if flags.intersects(TrustListFlags::NO_DUPLICATES | TrustListFlags::NO_DUPLICATE_KEY) {
                let existing = bucket.trusted_cas.iter().position(|t| {
                    if flags.contains(TrustListFlags::NO_DUPLICATES) {
                        same_cert(t, &ca)
                    } else {
                        same_key(t, &ca)
                    }
                });
                if let Some(slot) = existing.and_then(|pos| bucket.trusted_cas.get_mut(pos)) {
                    *slot = ca;
                    processed += 1;
                    continue;
                }
            }

            if let Err(e) = bucket.trusted_cas.try_reserve(1) {
                log::warn!("cannot add CA to trust list: {}", e);
                return processed;
            }
            let advertised_dn = rdn_len.map(|len| (len, ca.subject_dn().to_vec()));
            bucket.trusted_cas.push(ca);

            // Space was reserved above.
            if let Some((len, dn)) = advertised_dn {
                self.rdn_sequence.extend_from_slice(&len.to_be_bytes());
                self.rdn_sequence.extend_from_slice(&dn);
            }
            processed += 1;
        }
        processed
    }

    /// Remove CAs and distrust them.
    ///
    /// Every input certificate is blacklisted, whether or not it was in the
    /// list, so chains containing it are rejected from now on. Every copy
    /// is removed; returns the number of entries dropped.
    pub fn remove_cas(&mut self, cas: &[C]) -> usize {
        let mut removed = 0;
        for ca in cas {
            let bucket = self.bucket_mut(ca.subject_dn());
            let before = bucket.trusted_cas.len();
            bucket.trusted_cas.retain(|t| !same_cert(t, ca));
            removed += before - bucket.trusted_cas.len();

            if let Err(e) = self.blacklist.try_reserve(1) {
                log::warn!("cannot blacklist certificate: {}", e);
                return removed;
            }
            self.blacklist.push(ca.clone());
        }
        removed
    }

    /// Pin `cert` to `name` for [`TrustList::verify_named_crt`].
    pub fn add_named_cert(&mut self, cert: C, name: &[u8]) -> Result<(), XtrustError> {
        if name.len() > MAX_NAME_SIZE {
            return Err(XtrustError::InvalidRequest(format!(
                "name of {} bytes exceeds the maximum of {}",
                name.len(),
                MAX_NAME_SIZE
            )));
        }
        let bucket = self.bucket_mut(cert.issuer_dn());
        bucket.named_certs.try_reserve(1)?;
        bucket.named_certs.push(NamedCert {
            cert,
            name: name.to_vec(),
        });
        Ok(())
    }

    /// Add CRLs, bucketed by their issuer.
    ///
    /// With `VERIFY_CRL` each CRL must be signed by a CA already in its
    /// bucket and be current (unless time checks are disabled in
    /// `verify_flags`); failing CRLs are skipped. With `NO_DUPLICATES` a CRL
    /// from the same issuer is replaced when the new one is not older, and
    /// the new one is discarded otherwise. Returns the number of CRLs stored.
    pub fn add_crls<I>(&mut self, crls: I, flags: TrustListFlags, verify_flags: VerifyFlags) -> usize
    where
        I: IntoIterator<Item = C::Crl>,
    {
        let now = self.now();
        let mut added = 0;
        for crl in crls {
            if flags.contains(TrustListFlags::VERIFY_CRL)
                && !self.crl_is_acceptable(&crl, verify_flags, now)
            {
                log::debug!("skipping CRL that fails verification");
                continue;
            }

            let bucket = self.bucket_mut(crl.issuer_dn());
            if flags.contains(TrustListFlags::NO_DUPLICATES) {
                let existing = bucket
                    .crls
                    .iter_mut()
                    .find(|c| c.issuer_dn() == crl.issuer_dn());
                if let Some(slot) = existing {
                    if crl.this_update() >= slot.this_update() {
                        *slot = crl;
                        added += 1;
                    } else {
                        log::debug!("discarding CRL older than the one already stored");
                    }
                    continue;
                }
            }

            if let Err(e) = bucket.crls.try_reserve(1) {
                log::warn!("cannot add CRL to trust list: {}", e);
                return added;
            }
            bucket.crls.push(crl);
            added += 1;
        }
        added
    }

    fn crl_is_acceptable(&self, crl: &C::Crl, verify_flags: VerifyFlags, now: i64) -> bool {
        if verify_flags.time_checks() {
            if crl.this_update() > now {
                return false;
            }
            if crl.next_update().is_some_and(|next| next < now) {
                return false;
            }
        }
        self.bucket(crl.issuer_dn()).trusted_cas.iter().any(|ca| {
            ca.subject_dn() == crl.issuer_dn()
                && ca
                    .key_usage()
                    .map_or(true, |ku| ku.contains(KeyUsage::CRL_SIGN))
                && crl.verify_signature(ca)
        })
    }

    /// The first trusted CA in the issuer bucket of `cert` that could have
    /// issued it. The external token is not consulted.
    pub fn find_issuer(&self, cert: &C) -> Option<&C> {
        self.bucket(cert.issuer_dn())
            .trusted_cas
            .iter()
            .find(|ca| cert.check_issuer(ca))
    }

    /// Like [`TrustList::find_issuer`], falling back to the external token.
    /// An issuer found through the token is added to the list so the
    /// returned reference can borrow from it; distrusted issuers are
    /// neither cached nor returned.
    pub fn get_issuer(&mut self, cert: &C) -> Result<&C, XtrustError> {
        let local = self
            .bucket(cert.issuer_dn())
            .trusted_cas
            .iter()
            .position(|ca| cert.check_issuer(ca));
        if let Some(pos) = local {
            return self
                .bucket(cert.issuer_dn())
                .trusted_cas
                .get(pos)
                .ok_or(XtrustError::DataNotAvailable);
        }

        let issuer = self.token_issuer(cert)?;
        log::debug!("caching issuer found through the external token");
        self.add_cas(std::iter::once(issuer.clone()), TrustListFlags::NO_DUPLICATES);
        self.bucket(issuer.subject_dn())
            .trusted_cas
            .iter()
            .find(|ca| same_cert(*ca, &issuer))
            .ok_or(XtrustError::DataNotAvailable)
    }

    /// Owned copy of the issuer of `cert`, from the list or the external
    /// token. Nothing is cached.
    pub fn get_issuer_owned(&self, cert: &C) -> Result<C, XtrustError> {
        if let Some(issuer) = self.find_issuer(cert) {
            return Ok(issuer.clone());
        }
        self.token_issuer(cert)
    }

    /// Issuer offered by the external token, unless it was distrusted.
    fn token_issuer(&self, cert: &C) -> Result<C, XtrustError> {
        let issuer = self
            .token
            .as_ref()
            .and_then(|token| token.find_issuer(cert))
            .ok_or(XtrustError::DataNotAvailable)?;
        if self.blacklist.iter().any(|b| same_cert(b, &issuer)) {
            log::debug!("ignoring distrusted issuer offered by the external token");
            return Err(XtrustError::DataNotAvailable);
        }
        Ok(issuer)
    }

    /// Tear the list down. With `release_all` everything is dropped;
    /// otherwise the trusted CAs and CRLs are handed back to the caller.
    pub fn deinit(self, release_all: bool) -> Option<ReleasedTrust<C>> {
        if release_all {
            return None;
        }
        let mut released = ReleasedTrust {
            cas: Vec::new(),
            crls: Vec::new(),
        };
        for bucket in self.buckets {
            released.cas.extend(bucket.trusted_cas);
            released.crls.extend(bucket.crls);
        }
        Some(released)
    }
}
