use std::sync::Mutex;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use securewrap_client::{Authority, ClientError, ClientResult, LocalAuthority};
use securewrap_crypto::{DeploymentKey, open};
use securewrap_issuer::{IssueRequest, Issuer, IssuerError};
use securewrap_package::PackageArtifact;
use securewrap_registry::{MemoryRuleRegistry, RuleRegistry};
use securewrap_types::{AccessRule, Decision, DeviceFingerprint, PackageId};

const STUB: &[u8] = b"#!stub agent executable";
const URL: &str = "http://authority.test:8080";

fn request(dir: &Path, out_dir: PathBuf) -> IssueRequest {
    let file = dir.join("report.final.pdf");
    std::fs::write(&file, b"%PDF-1.7 secret").unwrap();
    IssueRequest {
        file,
        password: "pw".into(),
        fingerprint: DeviceFingerprint::new("10.0.0.5", "AA:BB:CC:DD:EE:FF"),
        out_dir,
    }
}

fn expected_artifact_name() -> String {
    format!("Secure-report{}", std::env::consts::EXE_SUFFIX)
}

/// Records calls and refuses every registration.
#[derive(Default)]
struct RefusingAuthority {
    deregistered: Mutex<Vec<PackageId>>,
}

impl Authority for RefusingAuthority {
    fn register(&self, _: &AccessRule) -> ClientResult<()> {
        Err(ClientError::Rejected {
            status: 500,
            message: "failed to store rule".into(),
        })
    }
    fn deregister(&self, id: &PackageId) -> ClientResult<()> {
        self.deregistered.lock().unwrap().push(id.clone());
        Ok(())
    }
    fn pre_check(&self, _: &PackageId, _: &DeviceFingerprint) -> ClientResult<Decision> {
        Ok(Decision::denied())
    }
    fn verify(&self, _: &PackageId, _: &str, _: &DeviceFingerprint) -> ClientResult<Decision> {
        Ok(Decision::denied())
    }
}

#[test]
fn issue_registers_rule_and_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let issued = issuer
        .issue_at(&request(dir.path(), dir.path().join("out")), 1_700_000_000)
        .unwrap();

    assert_eq!(issued.package_id.as_str(), "report.final-1700000000");
    assert_eq!(
        issued.artifact_path,
        dir.path().join("out").join(expected_artifact_name())
    );

    let bytes = std::fs::read(&issued.artifact_path).unwrap();
    assert!(bytes.starts_with(STUB));
    let artifact = PackageArtifact::from_bytes(&bytes).unwrap();
    assert_eq!(artifact.manifest.original_file_name, "report.final.pdf");
    assert_eq!(artifact.manifest.authority_url, URL);
    assert_eq!(open(&artifact.envelope, &key).unwrap(), b"%PDF-1.7 secret");

    let rule = authority
        .registry()
        .lookup(&issued.package_id)
        .unwrap()
        .unwrap();
    assert_eq!(rule.password, "pw");
    assert_eq!(rule.ip, "10.0.0.5");
    assert_eq!(rule.mac, "AA:BB:CC:DD:EE:FF");
}

#[cfg(unix)]
#[test]
fn artifact_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());
    let issued = issuer
        .issue(&request(dir.path(), dir.path().to_path_buf()))
        .unwrap();

    let mode = std::fs::metadata(&issued.artifact_path)
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[test]
fn refused_registration_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let key = DeploymentKey::generate();
    let authority = RefusingAuthority::default();
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let err = issuer.issue(&request(dir.path(), out.clone())).unwrap_err();
    assert!(matches!(err, IssuerError::Registration(_)));
    assert!(!out.exists());
    assert!(authority.deregistered.lock().unwrap().is_empty());
}

#[test]
fn failed_write_rolls_back_registration() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the output directory should be.
    let blocked = dir.path().join("not-a-dir");
    std::fs::write(&blocked, b"").unwrap();

    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let err = issuer.issue(&request(dir.path(), blocked)).unwrap_err();
    match err {
        IssuerError::Write { rolled_back, .. } => assert!(rolled_back),
        other => panic!("expected write failure, got {other:?}"),
    }
    assert_eq!(authority.registry().count().unwrap(), 0);
}

#[test]
fn empty_password_is_rejected_before_registration() {
    let dir = tempfile::tempdir().unwrap();
    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let mut req = request(dir.path(), dir.path().to_path_buf());
    req.password.clear();
    assert!(matches!(
        issuer.issue(&req),
        Err(IssuerError::InvalidInput(_))
    ));
    assert_eq!(authority.registry().count().unwrap(), 0);
}

#[test]
fn empty_mac_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let mut req = request(dir.path(), dir.path().to_path_buf());
    req.fingerprint.mac = String::new();
    assert!(matches!(
        issuer.issue(&req),
        Err(IssuerError::InvalidInput(_))
    ));
}

#[test]
fn missing_input_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let key = DeploymentKey::generate();
    let authority = LocalAuthority::new(MemoryRuleRegistry::new());
    let issuer = Issuer::new(&authority, &key, URL, STUB.to_vec());

    let req = IssueRequest {
        file: dir.path().join("absent.txt"),
        password: "pw".into(),
        fingerprint: DeviceFingerprint::new("10.0.0.5", "m"),
        out_dir: dir.path().to_path_buf(),
    };
    assert!(matches!(
        issuer.issue(&req),
        Err(IssuerError::InvalidInput(_))
    ));
    assert_eq!(authority.registry().count().unwrap(), 0);
}

#[test]
fn request_debug_hides_password() {
    let dir = tempfile::tempdir().unwrap();
    let rendered = format!("{:?}", request(dir.path(), dir.path().to_path_buf()));
    assert!(rendered.contains("[REDACTED]"));
    assert!(!rendered.contains("\"pw\""));
}
