//! CRL-based certificate revocation checking.

use super::{TrustList, VerifyOutput};
use crate::cert::{Certificate, RevocationList};
use crate::status::CertStatus;

/// Check one certificate against the CRLs of a bucket.
///
/// Only CRLs whose issuer DN equals the certificate's issuer DN are
/// consulted, and each consulted CRL is reported to `output`. A matching
/// serial yields `REVOKED | INVALID` and ends the scan. Stale or
/// future-dated CRLs that were consulted add the informational
/// `REVOCATION_DATA_SUPERSEDED` / `REVOCATION_DATA_ISSUED_IN_FUTURE` bits.
pub(crate) fn check_cert_revocation<C: Certificate>(
    cert: &C,
    crls: &[C::Crl],
    now: i64,
    output: &mut VerifyOutput<'_, C>,
) -> CertStatus {
    let mut status = CertStatus::empty();
    for crl in crls {
        if crl.issuer_dn() != cert.issuer_dn() {
            continue;
        }

        if crl.next_update().is_some_and(|next| next < now) {
            status |= CertStatus::REVOCATION_DATA_SUPERSEDED;
        }
        if crl.this_update() > now {
            status |= CertStatus::REVOCATION_DATA_ISSUED_IN_FUTURE;
        }

        if crl.is_revoked(cert.serial()) {
            let revoked = CertStatus::REVOKED | CertStatus::INVALID;
            output.emit(cert, None, Some(crl), revoked);
            return status | revoked;
        }
        output.emit(cert, None, Some(crl), CertStatus::empty());
    }
    status
}

/// The revocation overlay for a verified chain.
///
/// The last certificate is checked first, against the bucket of its issuer
/// DN, then every other certificate in order. The first revoked certificate
/// ends the overlay.
pub(crate) fn check_chain_revocation<C: Certificate>(
    list: &TrustList<C>,
    chain: &[&C],
    now: i64,
    output: &mut VerifyOutput<'_, C>,
) -> CertStatus {
    let Some((&last, rest)) = chain.split_last() else {
        return CertStatus::empty();
    };

    let mut status = CertStatus::empty();
    for cert in std::iter::once(last).chain(rest.iter().copied()) {
        status |= check_cert_revocation(cert, &list.bucket(cert.issuer_dn()).crls, now, output);
        if status.contains(CertStatus::REVOKED) {
            log::debug!("certificate revoked by CRL");
            break;
        }
    }
    status
}
