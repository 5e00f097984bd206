#![no_main]

use libfuzzer_sys::fuzz_target;
use xtrust_lib::{compute_fingerprint, Certificate, X509Cert, X509Crl};

fuzz_target!(|data: &[u8]| {
    // The DER parsers must never panic, regardless of input.
    if let Ok(cert) = X509Cert::from_der(data) {
        let _ = cert.subject_string();
        let _ = cert.issuer_string();
        let _ = cert.serial_hex();
        let _ = compute_fingerprint(cert.der());
        let _ = cert.check_issuer(&cert);
        let _ = cert.verify_signature(&cert);
        let _ = cert.dns_names();
        let _ = cert.ip_addresses();
        let _ = cert.key_purposes();
    }

    if let Ok(crl) = X509Crl::from_der(data) {
        let _ = crl.issuer_string();
        let _ = crl.revoked_count();
    }
});
