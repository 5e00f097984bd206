//! Certificate fingerprint (digest) computation.

use crate::util::hex_colon_upper;
use digest::Digest;

/// Compute the SHA-256 fingerprint of DER-encoded certificate bytes.
///
/// Returns a colon-separated uppercase hex string (e.g., "AB:CD:EF:...").
pub fn compute_fingerprint(der_bytes: &[u8]) -> String {
    hex_colon_upper(&sha2::Sha256::digest(der_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        let fp = compute_fingerprint(b"");
        assert!(fp.starts_with("E3:B0:C4:42"));
        assert_eq!(fp.split(':').count(), 32);
    }
}
