//! Loading X.509 trust anchors and CRLs from memory, files and the system
//! store.
//!
//! The system store is discovered the way OpenSSL does it: `SSL_CERT_FILE`
//! and `SSL_CERT_DIR`, then the locations reported by `openssl-probe`, then
//! well-known distribution paths.

use super::TrustList;
use crate::status::{TrustListFlags, VerifyFlags};
use crate::x509::{pem_blocks, X509Cert, X509Crl, CERT_LABELS, CRL_LABEL};
use crate::XtrustError;
use std::path::{Path, PathBuf};

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Matches `.pem`, `.crt`, `.cer` and OpenSSL hash links (`XXXXXXXX.N`).
fn is_cert_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

/// Matches `.crl` and OpenSSL CRL hash links (`XXXXXXXX.rN`).
fn is_crl_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some("crl") => true,
        Some(ext) => ext
            .strip_prefix('r')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, XtrustError> {
    std::fs::read(path).map_err(|e| {
        XtrustError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Certificates of a PEM bundle, skipping entries that fail to parse.
fn parse_cas_lenient(pem: &[u8]) -> Result<Vec<X509Cert>, XtrustError> {
    let blocks = pem_blocks(pem, CERT_LABELS)?;
    Ok(blocks
        .iter()
        .filter_map(|der| match X509Cert::from_der(der) {
            Ok(cert) => Some(cert),
            Err(e) => {
                log::debug!("skipping unparsable certificate: {}", e);
                None
            }
        })
        .collect())
}

/// CRLs of a PEM bundle, skipping entries that fail to parse.
fn parse_crls_lenient(pem: &[u8]) -> Result<Vec<X509Crl>, XtrustError> {
    let blocks = pem_blocks(pem, &[CRL_LABEL])?;
    Ok(blocks
        .iter()
        .filter_map(|der| match X509Crl::from_der(der) {
            Ok(crl) => Some(crl),
            Err(e) => {
                log::debug!("skipping unparsable CRL: {}", e);
                None
            }
        })
        .collect())
}

impl TrustList<X509Cert> {
    /// Add the CAs of a PEM bundle and, optionally, the CRLs of another.
    /// CAs are added first so `VERIFY_CRL` can check the CRLs against them.
    /// Returns the number of CAs and CRLs added.
    pub fn add_trust_mem(
        &mut self,
        ca_pem: Option<&[u8]>,
        crl_pem: Option<&[u8]>,
        flags: TrustListFlags,
        verify_flags: VerifyFlags,
    ) -> Result<(usize, usize), XtrustError> {
        let mut cas = 0;
        if let Some(pem) = ca_pem {
            cas = self.add_cas(parse_cas_lenient(pem)?, flags);
        }
        let mut crls = 0;
        if let Some(pem) = crl_pem {
            crls = self.add_crls(parse_crls_lenient(pem)?, flags, verify_flags);
        }
        Ok((cas, crls))
    }

    /// Like [`TrustList::add_trust_mem`], reading PEM files.
    pub fn add_trust_file(
        &mut self,
        ca_file: Option<&Path>,
        crl_file: Option<&Path>,
        flags: TrustListFlags,
        verify_flags: VerifyFlags,
    ) -> Result<(usize, usize), XtrustError> {
        let ca_pem = ca_file.map(read_file).transpose()?;
        let crl_pem = crl_file.map(read_file).transpose()?;
        self.add_trust_mem(ca_pem.as_deref(), crl_pem.as_deref(), flags, verify_flags)
    }

    /// Load the certificates of every PEM file in a directory (like
    /// OpenSSL's `-CApath`), then the CRLs found in the same files.
    /// Unreadable files are skipped.
    pub fn add_trust_dir(
        &mut self,
        dir: &Path,
        flags: TrustListFlags,
        verify_flags: VerifyFlags,
    ) -> Result<(usize, usize), XtrustError> {
        let mut files: Vec<PathBuf> = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            XtrustError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", dir.display(), e),
            ))
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && (is_cert_file(&path) || is_crl_file(&path)) {
                files.push(path);
            }
        }
        files.sort();

        let contents: Vec<Vec<u8>> = files
            .iter()
            .filter_map(|path| std::fs::read(path).ok())
            .collect();

        let mut cas = 0;
        for data in &contents {
            if let Ok(parsed) = parse_cas_lenient(data) {
                cas += self.add_cas(parsed, flags);
            }
        }
        let mut crls = 0;
        for data in &contents {
            if let Ok(parsed) = parse_crls_lenient(data) {
                crls += self.add_crls(parsed, flags, verify_flags);
            }
        }
        Ok((cas, crls))
    }

    /// Load the system trust store. Returns the number of CAs added.
    ///
    /// The bundle file found by [`find_system_ca_bundle`] is tried first,
    /// then `SSL_CERT_DIR`, the `openssl-probe` directory and the
    /// well-known directories; the first source yielding certificates wins.
    pub fn add_system_trust(
        &mut self,
        flags: TrustListFlags,
        verify_flags: VerifyFlags,
    ) -> Result<usize, XtrustError> {
        if let Some(bundle_path) = find_system_ca_bundle() {
            if let Ok(data) = std::fs::read(&bundle_path) {
                let (added, _) = self.add_trust_mem(Some(&data), None, flags, verify_flags)?;
                if added > 0 {
                    log::debug!("loaded {} CAs from {}", added, bundle_path.display());
                    return Ok(added);
                }
            }
        }

        let probe = openssl_probe::probe();
        let dir_candidates = std::env::var("SSL_CERT_DIR")
            .ok()
            .into_iter()
            .chain(
                probe
                    .cert_dir
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            )
            .chain(KNOWN_CA_DIR_PATHS.iter().map(|s| (*s).to_string()));

        for dir in dir_candidates {
            if let Ok((added, _)) = self.add_trust_dir(Path::new(&dir), flags, verify_flags) {
                if added > 0 {
                    log::debug!("loaded {} CAs from {}", added, dir);
                    return Ok(added);
                }
            }
        }

        Err(XtrustError::DataNotAvailable)
    }
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let probe = openssl_probe::probe();
    if let Some(file) = probe.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
