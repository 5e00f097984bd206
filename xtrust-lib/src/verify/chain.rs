//! Chain sorting and shortening.
//!
//! Peers may send their certificates in any order and may include the trust
//! anchor itself. Before verification the chain is put in subject-to-issuer
//! order and cut at the first certificate the trust list already holds.

use super::TrustList;
use crate::cert::{same_cert, Certificate};
use crate::XtrustError;

/// Longest chain that is sorted. Sorting compares every pair of
/// certificates, so longer chains are verified in the order supplied.
pub const MAX_SORT_DEPTH: usize = 128;

/// Reorder `chain` from subject to issuer.
///
/// Each certificate's issuer is the first other certificate in the list for
/// which `check_issuer` succeeds. The walk starts at the leaf: index 0,
/// unless index 0 issued another certificate of the list, in which case the
/// first certificate that issued none is taken. The leaf is never considered
/// as an issuer. The output stops at the first certificate without an issuer
/// in the list or when the walk revisits a certificate, so certificates
/// unrelated to the leaf's path are dropped.
#[allow(clippy::indexing_slicing)] // all indices come from enumerating `chain`
pub fn sort_chain<'a, C: Certificate>(chain: &[&'a C]) -> Vec<&'a C> {
    if chain.len() > MAX_SORT_DEPTH {
        log::debug!(
            "chain of {} certificates exceeds the sort limit, keeping order",
            chain.len()
        );
        return chain.to_vec();
    }
    if chain.len() <= 1 {
        return chain.to_vec();
    }

    let issues_other = |j: usize| {
        chain
            .iter()
            .enumerate()
            .any(|(i, cert)| i != j && cert.check_issuer(chain[j]))
    };
    let start = if issues_other(0) {
        (1..chain.len()).find(|&j| !issues_other(j)).unwrap_or(0)
    } else {
        0
    };

    let mut issuer: Vec<Option<usize>> = vec![None; chain.len()];
    for (i, cert) in chain.iter().enumerate() {
        for (j, candidate) in chain.iter().enumerate() {
            if j == i || j == start {
                continue;
            }
            if cert.check_issuer(candidate) {
                issuer[i] = Some(j);
                break;
            }
        }
    }

    let mut sorted = Vec::with_capacity(chain.len());
    let mut seen = vec![false; chain.len()];
    let mut next = Some(start);
    while let Some(i) = next {
        if seen[i] {
            break;
        }
        seen[i] = true;
        sorted.push(chain[i]);
        next = issuer[i];
    }
    sorted
}

/// Drop what the trust list makes redundant.
///
/// A trailing self-issued certificate is removed (trust must come from the
/// list, not from the peer). Then, starting at index 1, the chain is cut
/// right after the first certificate found in the bucket of its issuer DN.
pub(crate) fn shorten_chain<C: Certificate>(list: &TrustList<C>, chain: &mut Vec<&C>) {
    if chain.len() > 1 {
        if let Some(last) = chain.last() {
            if last.check_issuer(last) {
                chain.pop();
            }
        }
    }

    let cut = chain.iter().enumerate().skip(1).find_map(|(i, cert)| {
        list.bucket(cert.issuer_dn())
            .trusted_cas
            .iter()
            .any(|ca| same_cert(ca, *cert))
            .then_some(i)
    });
    if let Some(i) = cut {
        log::debug!("chain shortened at trusted certificate {}", i);
        chain.truncate(i + 1);
    }
}

impl<C: Certificate> TrustList<C> {
    /// The part of `chain` (sorted, leaf first) that still needs
    /// verification against this list.
    pub fn shorten<'a>(&self, chain: &[&'a C]) -> Vec<&'a C> {
        let mut shortened = chain.to_vec();
        shorten_chain(self, &mut shortened);
        shortened
    }
}

/// Require `chain` to be ordered from subject to issuer: the issuer DN of
/// every certificate must equal the subject DN of the next one.
pub fn check_if_sorted<C: Certificate>(chain: &[C]) -> Result<(), XtrustError> {
    for pair in chain.windows(2) {
        if let [cert, next] = pair {
            if cert.issuer_dn() != next.subject_dn() {
                return Err(XtrustError::UnsortedChain);
            }
        }
    }
    Ok(())
}
