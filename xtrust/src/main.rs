//! xtrust: Command-line tool for verifying X.509 certificate chains against
//! a hashed trust list.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use xtrust_lib::{
    ChainCertInfo, TrustList, TrustListFlags, TrustListOptions, VerificationReport,
    VerifyFlags, VerifyHint, VerifyOutput, X509Cert, XtrustError,
};

#[derive(Parser)]
#[command(
    name = "xtrust",
    about = "Verify X.509 certificate chains against a hashed trust list",
    long_about = "xtrust loads trusted CAs and CRLs into a trust list and verifies\n\
                  PEM certificate chains against it. Chains may be supplied in any\n\
                  order; they are sorted and shortened before verification.\n\n\
                  All commands read from stdin when no file is given.",
    after_help = "EXAMPLES:\n\
                  \n  xtrust verify chain.pem\
                  \n  xtrust verify --CAfile root.pem --hostname www.example.com chain.pem\
                  \n  xtrust verify --CAfile root.pem --CRLfile root.crl --verify-crl chain.pem\
                  \n  xtrust verify --json --recurse certs/\
                  \n  xtrust sort chain.pem\
                  \n  xtrust issuer --CAfile bundle.pem leaf.pem\
                  \n  xtrust pinned --pin server.pem --name www.example.com server.pem"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where trusted CAs, CRLs and distrusted certificates come from.
#[derive(Args, Debug, Default)]
struct TrustArgs {
    /// PEM file containing trusted CA certificates (default: system trust store)
    #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
    ca_file: Option<PathBuf>,
    /// Directory of trusted CA certificates in PEM format
    #[arg(long = "CApath", visible_alias = "ca-path", value_name = "DIR")]
    ca_path: Option<PathBuf>,
    /// PEM file containing CRL(s) to add to the trust list
    #[arg(long = "CRLfile", visible_alias = "crl-file", value_name = "FILE")]
    crl_file: Option<PathBuf>,
    /// Only keep CRLs signed by a CA of the trust list
    #[arg(long)]
    verify_crl: bool,
    /// Distrust the certificates in FILE (may be repeated)
    #[arg(long, value_name = "FILE")]
    distrust: Vec<PathBuf>,
    /// Verify at a specific time: Unix seconds or RFC 3339
    #[arg(long, value_name = "TIME")]
    attime: Option<String>,
    /// Maximum chain length (0 disables the limit)
    #[arg(long, value_name = "N")]
    verify_depth: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify certificate chains (like openssl verify)
    #[command(after_help = "EXAMPLES:\n\
                      \n  xtrust verify chain.pem\
                      \n  xtrust verify --hostname www.example.com chain.pem\
                      \n  xtrust verify --CAfile ca.pem --purpose tls-server chain.pem\
                      \n  xtrust verify --attime 2030-01-01T00:00:00Z chain.pem\
                      \n  xtrust verify --failures-only -r certs/\
                      \n  cat chain.pem | xtrust verify")]
    Verify {
        /// PEM file or directory with certificate chain(s).
        /// Reads from stdin if omitted.
        file: Option<PathBuf>,
        #[command(flatten)]
        trust: TrustArgs,
        /// Hostname or IP address the leaf certificate must be valid for
        #[arg(long)]
        hostname: Option<String>,
        /// Required key purpose: tls-server, tls-client, codesign, any, or OID
        #[arg(long, value_name = "PURPOSE")]
        purpose: Option<String>,
        /// Skip validity date checks
        #[arg(long)]
        no_check_time: bool,
        /// Skip revocation checks
        #[arg(long)]
        no_crl_check: bool,
        /// Require the chain to be sorted from leaf to root
        #[arg(long)]
        strict_order: bool,
        /// Display subject and issuer for each certificate in the chain
        #[arg(long)]
        show_chain: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only print failures (directory mode)
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
    },
    /// Print a certificate list in subject-to-issuer order
    #[command(after_help = "EXAMPLES:\n\
                      \n  xtrust sort chain.pem\
                      \n  xtrust sort --check chain.pem\
                      \n  xtrust sort --CAfile root.pem chain.pem")]
    Sort {
        /// PEM file with a certificate list. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Fail unless the list is already sorted
        #[arg(long)]
        check: bool,
        /// Also cut the sorted chain at the first CA trusted by FILE
        #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
        ca_file: Option<PathBuf>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Find the trusted issuer of a certificate
    Issuer {
        /// PEM certificate. Reads from stdin if omitted.
        file: Option<PathBuf>,
        #[command(flatten)]
        trust: TrustArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Verify a certificate pinned to a name, without building a chain
    Pinned {
        /// PEM certificate to verify. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// PEM file with the certificate(s) pinned to NAME
        #[arg(long, value_name = "FILE")]
        pin: PathBuf,
        /// Name the certificate is pinned to
        #[arg(long)]
        name: String,
        /// PEM file containing CRL(s) to check the certificate against
        #[arg(long = "CRLfile", visible_alias = "crl-file", value_name = "FILE")]
        crl_file: Option<PathBuf>,
        /// Verify at a specific time: Unix seconds or RFC 3339
        #[arg(long, value_name = "TIME")]
        attime: Option<String>,
        /// Skip revocation checks
        #[arg(long)]
        no_crl_check: bool,
    },
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn input_label(file: Option<&PathBuf>) -> String {
    file.map_or("stdin".to_string(), |f| f.display().to_string())
}

/// Parse a verification time.
///
/// Plain numbers are Unix seconds. Otherwise an RFC 3339 timestamp is
/// expected; a missing zone means UTC.
///
/// Examples: "1800000000", "2030-01-01T00:00:00Z", "2030-01-01 12:00:00".
fn parse_time(s: &str) -> Result<i64> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().context("Invalid timestamp value");
    }
    let time =
        humantime::parse_rfc3339_weak(s).with_context(|| format!("Invalid time: '{s}'"))?;
    let secs = time
        .duration_since(UNIX_EPOCH)
        .with_context(|| format!("Time before 1970: '{s}'"))?
        .as_secs();
    i64::try_from(secs).context("Time out of range")
}

fn trust_options(attime: Option<&str>, verify_depth: Option<usize>) -> Result<TrustListOptions> {
    let mut options = TrustListOptions::default();
    if let Some(t) = attime {
        options.verification_time = Some(parse_time(t)?);
    }
    if let Some(depth) = verify_depth {
        options.max_verify_depth = Some(depth);
    }
    Ok(options)
}

/// Build the trust list described by `args`.
fn load_trust(args: &TrustArgs) -> Result<TrustList<X509Cert>> {
    let options = trust_options(args.attime.as_deref(), args.verify_depth)?;
    let mut list = TrustList::with_options(options)?;
    let flags = TrustListFlags::NO_DUPLICATES;

    if args.ca_file.is_none() && args.ca_path.is_none() {
        let added = list
            .add_system_trust(flags, VerifyFlags::empty())
            .context("No system trust store found; use --CAfile or --CApath")?;
        log::debug!("loaded {} system CAs", added);
    }
    if let Some(path) = &args.ca_file {
        let (added, _) = list
            .add_trust_file(Some(path), None, flags, VerifyFlags::empty())
            .with_context(|| format!("Failed to load CA file: {}", path.display()))?;
        if added == 0 {
            anyhow::bail!("No certificates found in CA file: {}", path.display());
        }
    }
    if let Some(dir) = &args.ca_path {
        list.add_trust_dir(dir, flags, VerifyFlags::empty())
            .with_context(|| format!("Failed to load CA directory: {}", dir.display()))?;
    }

    if let Some(path) = &args.crl_file {
        let crl_flags = if args.verify_crl {
            flags | TrustListFlags::VERIFY_CRL
        } else {
            flags
        };
        let (_, added) = list
            .add_trust_file(None, Some(path), crl_flags, VerifyFlags::empty())
            .with_context(|| format!("Failed to load CRL file: {}", path.display()))?;
        log::debug!("loaded {} CRLs from {}", added, path.display());
    }

    for path in &args.distrust {
        let data = read_input(Some(path))?;
        let certs = xtrust_lib::parse_pem_chain(&data).with_context(|| {
            format!("Failed to parse distrusted certificates: {}", path.display())
        })?;
        let removed = list.remove_cas(&certs);
        log::debug!(
            "distrusted {} certificates ({} removed from the trust list)",
            certs.len(),
            removed
        );
    }
    Ok(list)
}

fn verify_flags(no_check_time: bool, no_crl_check: bool, strict_order: bool) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();
    flags.set(VerifyFlags::DISABLE_TIME_CHECKS, no_check_time);
    flags.set(VerifyFlags::DISABLE_CRL_CHECKS, no_crl_check);
    flags.set(VerifyFlags::DO_NOT_ALLOW_UNSORTED_CHAIN, strict_order);
    flags
}

/// Parse a PEM certificate list, or a single DER certificate.
fn parse_certs(data: &[u8]) -> Result<Vec<X509Cert>, XtrustError> {
    if xtrust_lib::is_pem(data) {
        xtrust_lib::parse_pem_chain(data)
    } else {
        Ok(vec![X509Cert::from_der(data)?])
    }
}

/// Verification request shared by single-file and directory mode.
struct Verifier {
    list: TrustList<X509Cert>,
    hints: Vec<VerifyHint>,
    flags: VerifyFlags,
}

impl Verifier {
    fn verify(&self, chain: &[X509Cert]) -> Result<VerificationReport, XtrustError> {
        let status = self
            .list
            .verify_crt2(chain, &self.hints, self.flags, VerifyOutput::none())?;
        Ok(VerificationReport::new(chain, status))
    }

    /// Verify the certificates of `data`: as one chain, or one by one when
    /// they are an unrelated bundle (e.g. a CA bundle file).
    fn verify_pem(&self, label: &str, data: &[u8]) -> Vec<BatchResult> {
        let certs = match parse_certs(data) {
            Ok(c) => c,
            Err(e) => {
                return vec![BatchResult {
                    path: label.to_string(),
                    pass: false,
                    detail: format!("FAIL (parse error: {})", e),
                    report: None,
                }]
            }
        };

        if is_bundle(&certs) {
            return certs
                .iter()
                .enumerate()
                .map(|(i, cert)| {
                    let result = self.verify(std::slice::from_ref(cert));
                    verify_to_batch(format!("{}[{}]", label, i), result)
                })
                .collect();
        }
        vec![verify_to_batch(label.to_string(), self.verify(&certs))]
    }
}

/// More than one certificate and none of them issued another.
fn is_bundle(certs: &[X509Cert]) -> bool {
    let refs: Vec<&X509Cert> = certs.iter().collect();
    certs.len() > 1 && xtrust_lib::sort_chain(&refs).len() == 1
}

/// Check if a path has a certificate file extension (.pem, .der, .crt, .cer).
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// A single result from batch processing.
struct BatchResult {
    path: String,
    pass: bool,
    detail: String,
    report: Option<VerificationReport>,
}

/// Process certificate files in parallel, printing `filename: result`.
///
/// Returns the number of failures.
fn run_batch<F>(files: &[PathBuf], failures_only: bool, json: bool, op: F) -> Result<usize>
where
    F: Fn(&Path) -> Vec<BatchResult> + Sync,
{
    let results: Vec<Vec<BatchResult>> = files.par_iter().map(|f| op(f)).collect();

    let mut failures = 0;
    let mut reports = Vec::new();
    for r in results.into_iter().flatten() {
        if !r.pass {
            failures += 1;
        }
        if failures_only && r.pass {
            continue;
        }
        if json {
            reports.push(serde_json::json!({
                "path": r.path,
                "error": r.report.is_none().then_some(&r.detail),
                "report": r.report,
            }));
        } else if r.pass {
            println!("{}: {}", r.path, r.detail);
        } else {
            eprintln!("{}: {}", r.path, r.detail);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(failures)
}

/// Convert a verification result (or error) into a BatchResult.
fn verify_to_batch(
    label: String,
    result: Result<VerificationReport, impl std::fmt::Display>,
) -> BatchResult {
    match result {
        Ok(r) => BatchResult {
            path: label,
            pass: r.is_valid,
            detail: format!("{}", r),
            report: Some(r),
        },
        Err(e) => BatchResult {
            path: label,
            pass: false,
            detail: format!("FAIL ({})", e),
            report: None,
        },
    }
}

fn print_chain(chain: &[ChainCertInfo]) {
    for info in chain {
        println!(
            "depth {}: subject = {}, issuer = {}",
            info.depth, info.subject, info.issuer
        );
    }
}

/// Print a single verification result (JSON, text valid, or text invalid).
fn print_verify_result(r: &BatchResult, json: bool, show_chain: bool) -> Result<()> {
    if json {
        match &r.report {
            Some(report) => println!("{}", report.to_json()?),
            None => eprintln!("{}: {}", r.path, r.detail),
        }
    } else if r.pass {
        println!("{}: {}", r.path, r.detail);
        if show_chain {
            if let Some(report) = &r.report {
                print_chain(&report.chain);
            }
        }
    } else {
        eprintln!("{}: {}", r.path, r.detail);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Verify {
            file,
            trust,
            hostname,
            purpose,
            no_check_time,
            no_crl_check,
            strict_order,
            show_chain,
            json,
            failures_only,
            recurse,
        } => {
            let mut hints = Vec::new();
            if let Some(name) = hostname {
                hints.push(VerifyHint::DnsHostname(name.clone()));
            }
            if let Some(p) = purpose {
                let oid = xtrust_lib::resolve_purpose(p).unwrap_or(p.as_str());
                hints.push(VerifyHint::KeyPurposeOid(oid.to_string()));
            }
            let verifier = Verifier {
                list: load_trust(trust)?,
                hints,
                flags: verify_flags(*no_check_time, *no_crl_check, *strict_order),
            };
            log::debug!("verifying against {:?}", verifier.list);

            // Directory mode: verify all cert files in parallel
            if let Some(path) = file {
                if path.is_dir() {
                    let files = find_cert_files(path, *recurse);
                    if files.is_empty() {
                        anyhow::bail!(
                            "No certificate files (.pem, .der, .crt, .cer) found in {}",
                            path.display()
                        );
                    }
                    let failures = run_batch(&files, *failures_only, *json, |f| {
                        let label = f.display().to_string();
                        match std::fs::read(f) {
                            Ok(data) => verifier.verify_pem(&label, &data),
                            Err(e) => vec![BatchResult {
                                path: label,
                                pass: false,
                                detail: format!("FAIL (read error: {})", e),
                                report: None,
                            }],
                        }
                    })?;
                    if failures > 0 {
                        std::process::exit(2);
                    }
                    return Ok(());
                }
            }

            // Single file mode
            let input = read_input(file.as_ref())?;
            let results = verifier.verify_pem(&input_label(file.as_ref()), &input);
            let mut any_invalid = false;
            let single = results.len() == 1;
            for r in &results {
                print_verify_result(r, *json, *show_chain && single)?;
                any_invalid |= !r.pass;
            }
            if any_invalid {
                std::process::exit(2);
            }
        }

        Commands::Sort {
            file,
            check,
            ca_file,
            json,
        } => {
            let input = read_input(file.as_ref())?;
            let certs = if *check {
                xtrust_lib::parse_pem_chain_sorted(&input)
                    .with_context(|| format!("{}: FAIL", input_label(file.as_ref())))?
            } else {
                parse_certs(&input)?
            };

            let refs: Vec<&X509Cert> = certs.iter().collect();
            let mut sorted = xtrust_lib::sort_chain(&refs);
            if let Some(path) = ca_file {
                let mut list: TrustList<X509Cert> = TrustList::init(0)?;
                list.add_trust_file(
                    Some(path),
                    None,
                    TrustListFlags::NO_DUPLICATES,
                    VerifyFlags::empty(),
                )
                .with_context(|| format!("Failed to load CA file: {}", path.display()))?;
                sorted = list.shorten(&sorted);
            }
            if sorted.len() < certs.len() {
                eprintln!(
                    "{} of {} certificates are not part of the chain",
                    certs.len() - sorted.len(),
                    certs.len()
                );
            }

            let infos: Vec<ChainCertInfo> = sorted
                .iter()
                .enumerate()
                .map(|(depth, cert)| ChainCertInfo::new(depth, cert))
                .collect();
            if *json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                print_chain(&infos);
            }
        }

        Commands::Issuer { file, trust, json } => {
            let list = load_trust(trust)?;
            let input = read_input(file.as_ref())?;
            let certs = parse_certs(&input)?;
            let Some(leaf) = certs.first() else {
                anyhow::bail!("No certificate in {}", input_label(file.as_ref()));
            };

            match list.get_issuer_owned(leaf) {
                Ok(issuer) => {
                    let info = ChainCertInfo::new(1, &issuer);
                    if *json {
                        println!("{}", serde_json::to_string_pretty(&info)?);
                    } else {
                        println!("issuer = {}", info.subject);
                        println!("serial = {}", info.serial);
                        println!("fingerprint = {}", info.fingerprint);
                    }
                }
                Err(XtrustError::DataNotAvailable) => {
                    eprintln!(
                        "{}: no trusted issuer for {}",
                        input_label(file.as_ref()),
                        leaf.subject_string()
                    );
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Pinned {
            file,
            pin,
            name,
            crl_file,
            attime,
            no_crl_check,
        } => {
            let mut list: TrustList<X509Cert> =
                TrustList::with_options(trust_options(attime.as_deref(), None)?)?;
            let pinned = xtrust_lib::parse_pem_chain(&read_input(Some(pin))?).with_context(|| {
                format!("Failed to parse pinned certificates: {}", pin.display())
            })?;
            for cert in pinned {
                list.add_named_cert(cert, name.as_bytes())?;
            }
            if let Some(path) = crl_file {
                list.add_trust_file(
                    None,
                    Some(path),
                    TrustListFlags::empty(),
                    VerifyFlags::empty(),
                )
                .with_context(|| format!("Failed to load CRL file: {}", path.display()))?;
            }

            let input = read_input(file.as_ref())?;
            let Some(cert) = parse_certs(&input)?.into_iter().next() else {
                anyhow::bail!("No certificate in {}", input_label(file.as_ref()));
            };
            let flags = verify_flags(false, *no_crl_check, false);
            let status =
                list.verify_named_crt(&cert, name.as_bytes(), flags, VerifyOutput::none())?;
            let report = VerificationReport::new(std::slice::from_ref(&cert), status);
            println!("{}: {}", input_label(file.as_ref()), report);
            if !status.is_trusted() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn certs_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/certs")
    }

    fn fixture_args() -> TrustArgs {
        TrustArgs {
            ca_file: Some(certs_dir().join("root.pem")),
            attime: Some("1800000000".to_string()),
            ..TrustArgs::default()
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    // ---- parse_time ----

    #[test]
    fn parse_plain_seconds() {
        assert_eq!(parse_time("1800000000").unwrap(), 1_800_000_000);
        assert_eq!(parse_time("0").unwrap(), 0);
    }

    #[test]
    fn parse_rfc3339() {
        assert_eq!(parse_time("2030-01-01T00:00:00Z").unwrap(), 1_893_456_000);
        assert_eq!(parse_time("2030-01-01 00:00:00").unwrap(), 1_893_456_000);
    }

    #[test]
    fn reject_bad_times() {
        assert!(parse_time("").is_err());
        assert!(parse_time("-5").is_err());
        assert!(parse_time("tomorrow").is_err());
        assert!(parse_time("2030-13-01T00:00:00Z").is_err());
    }

    // ---- verify_flags ----

    #[test]
    fn flags_follow_switches() {
        assert_eq!(verify_flags(false, false, false), VerifyFlags::empty());
        assert_eq!(
            verify_flags(true, true, true),
            VerifyFlags::DISABLE_TIME_CHECKS
                | VerifyFlags::DISABLE_CRL_CHECKS
                | VerifyFlags::DO_NOT_ALLOW_UNSORTED_CHAIN
        );
    }

    // ---- is_cert_file tests ----

    #[test]
    fn is_cert_file_accepts_known_extensions() {
        assert!(is_cert_file(Path::new("cert.pem")));
        assert!(is_cert_file(Path::new("cert.der")));
        assert!(is_cert_file(Path::new("cert.crt")));
        assert!(is_cert_file(Path::new("cert.cer")));
        assert!(is_cert_file(Path::new("cert.PEM")));
    }

    #[test]
    fn is_cert_file_rejects_non_cert() {
        assert!(!is_cert_file(Path::new("cert.txt")));
        assert!(!is_cert_file(Path::new("cert.key")));
        assert!(!is_cert_file(Path::new("cert")));
    }

    // ---- find_cert_files tests ----

    #[test]
    fn find_cert_files_sorted() {
        let files = find_cert_files(&certs_dir(), false);
        assert!(!files.is_empty(), "should find cert files in tests/certs");
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted, "files should be sorted");
    }

    #[test]
    fn find_cert_files_empty_dir() {
        let tmp = std::env::temp_dir().join("xtrust_test_empty_dir");
        let _ = std::fs::create_dir(&tmp);
        let files = find_cert_files(&tmp, false);
        assert!(files.is_empty(), "empty dir should return no files");
        let _ = std::fs::remove_dir(&tmp);
    }

    // ---- trust loading and verification ----

    #[test]
    fn der_input_is_accepted() {
        let pem = std::fs::read(certs_dir().join("leaf.pem")).unwrap();
        let leaf = X509Cert::from_pem(&pem).unwrap();
        let certs = parse_certs(xtrust_lib::Certificate::der(&leaf)).unwrap();
        assert_eq!(certs, vec![leaf]);
        assert_eq!(parse_certs(&pem).unwrap().len(), 1);
        assert!(parse_certs(b"garbage").is_err());
    }

    #[test]
    fn bundle_detection() {
        let read = |name: &str| {
            xtrust_lib::parse_pem_chain(&std::fs::read(certs_dir().join(name)).unwrap()).unwrap()
        };
        assert!(!is_bundle(&read("chain.pem")));
        assert!(!is_bundle(&read("leaf.pem")));

        let mut roots = read("root.pem");
        roots.extend(read("other-root.pem"));
        assert!(is_bundle(&roots));
    }

    #[test]
    fn verify_fixture_chain() {
        let verifier = Verifier {
            list: load_trust(&fixture_args()).unwrap(),
            hints: vec![VerifyHint::DnsHostname("example.com".to_string())],
            flags: VerifyFlags::empty(),
        };
        let data = std::fs::read(certs_dir().join("chain-unsorted.pem")).unwrap();
        let results = verifier.verify_pem("chain-unsorted.pem", &data);
        assert_eq!(results.len(), 1);
        assert!(results[0].pass, "{}", results[0].detail);
        assert!(results[0].detail.starts_with("example.com, 20:01, OK"));
    }

    #[test]
    fn crl_and_distrust_fail_the_chain() {
        let mut args = fixture_args();
        args.crl_file = Some(certs_dir().join("root-revokes-intermediate.crl.pem"));
        args.verify_crl = true;
        let verifier = Verifier {
            list: load_trust(&args).unwrap(),
            hints: Vec::new(),
            flags: VerifyFlags::empty(),
        };
        let data = std::fs::read(certs_dir().join("chain.pem")).unwrap();
        let results = verifier.verify_pem("chain.pem", &data);
        assert!(!results[0].pass);
        assert!(results[0].detail.contains("revoked"));

        let mut args = fixture_args();
        args.distrust = vec![certs_dir().join("intermediate.pem")];
        let verifier = Verifier {
            list: load_trust(&args).unwrap(),
            hints: Vec::new(),
            flags: VerifyFlags::empty(),
        };
        assert!(!verifier.verify_pem("chain.pem", &data)[0].pass);
    }

    #[test]
    fn depth_limit_is_reported_as_failure() {
        let mut args = fixture_args();
        args.verify_depth = Some(1);
        let verifier = Verifier {
            list: load_trust(&args).unwrap(),
            hints: Vec::new(),
            flags: VerifyFlags::empty(),
        };
        let data = std::fs::read(certs_dir().join("chain.pem")).unwrap();
        let results = verifier.verify_pem("chain.pem", &data);
        assert!(!results[0].pass);
        assert!(results[0].report.is_none());
        assert!(results[0].detail.starts_with("FAIL ("));
    }

    #[test]
    fn missing_ca_file_is_an_error() {
        let args = TrustArgs {
            ca_file: Some(certs_dir().join("missing.pem")),
            ..TrustArgs::default()
        };
        assert!(load_trust(&args).is_err());
    }
}
