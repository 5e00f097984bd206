#![no_main]

use libfuzzer_sys::fuzz_target;
use xtrust_lib::{
    parse_pem_chain, parse_pem_crl, sort_chain, Certificate, TrustList, TrustListFlags,
    TrustListOptions, VerifyFlags, VerifyHint, VerifyOutput, X509Cert,
};

fuzz_target!(|data: &[u8]| {
    // Sorting, shortening and verification must never panic, whatever
    // order or mix of certificates the input holds.
    let Ok(certs) = parse_pem_chain(data) else {
        return;
    };

    let refs: Vec<&X509Cert> = certs.iter().collect();
    let sorted = sort_chain(&refs);
    assert!(sorted.len() <= refs.len());

    let Ok(mut list) = TrustList::<X509Cert>::with_options(TrustListOptions {
        bucket_count: 7,
        verification_time: Some(1_800_000_000),
        ..TrustListOptions::default()
    }) else {
        return;
    };

    // Trust every self-issued certificate of the input, so chains ending in
    // one reach the signature and constraint checks.
    let roots: Vec<X509Cert> = certs.iter().filter(|c| c.is_self_issued()).cloned().collect();
    list.add_cas(roots, TrustListFlags::NO_DUPLICATES);
    if let Ok(crls) = parse_pem_crl(data) {
        list.add_crls(crls, TrustListFlags::VERIFY_CRL, VerifyFlags::empty());
    }

    let shortened = list.shorten(&sorted);
    assert!(shortened.len() <= sorted.len());

    let hints = [VerifyHint::DnsHostname("example.com".to_string())];
    let first = list.verify_crt2(&certs, &hints, VerifyFlags::empty(), VerifyOutput::none());
    let second = list.verify_crt2(&certs, &hints, VerifyFlags::empty(), VerifyOutput::none());
    if let (Ok(a), Ok(b)) = (first, second) {
        assert_eq!(a, b, "verification is not deterministic");
    }

    if let Some(leaf) = certs.first() {
        let _ = list.get_issuer_owned(leaf);
        let _ = list.verify_named_crt(
            leaf,
            b"example.com",
            VerifyFlags::empty(),
            VerifyOutput::none(),
        );
    }
});
