//! Issue a package against a live Authority, then open it with the agent.

use std::cell::RefCell;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use pretty_assertions::assert_eq;
use securewrap_agent::{Agent, AgentError, Console, Destroyer, Outcome, Stage};
use securewrap_authority::{AppState, build_router};
use securewrap_client::HttpAuthority;
use securewrap_crypto::DeploymentKey;
use securewrap_device::{NetworkInterface, StaticInterfaces};
use securewrap_issuer::{IssueRequest, Issuer};
use securewrap_package::PackageArtifact;
use securewrap_registry::SqliteRuleRegistry;
use securewrap_types::DeviceFingerprint;

fn spawn_authority(db: PathBuf) -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let registry = Arc::new(SqliteRuleRegistry::open(db).unwrap());
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            axum::serve(listener, build_router(AppState::new(registry)))
                .await
                .unwrap();
        });
    });
    format!("http://127.0.0.1:{}", rx.recv().unwrap())
}

struct FixedPassword(&'static str);

impl Console for FixedPassword {
    fn password(&self) -> Option<String> {
        Some(self.0.to_string())
    }
    fn error(&self, _: &str, _: &str) {}
    fn info(&self, _: &str, _: &str) {}
}

#[derive(Default)]
struct RecordingDestroyer(RefCell<Vec<PathBuf>>);

impl Destroyer for RecordingDestroyer {
    fn destroy(&self, artifact: &Path) {
        self.0.borrow_mut().push(artifact.to_path_buf());
    }
}

fn nic(ip: &str, mac: &str) -> StaticInterfaces {
    StaticInterfaces(vec![
        NetworkInterface {
            name: "lo".into(),
            is_up: true,
            is_loopback: true,
            mac: None,
            addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
        },
        NetworkInterface {
            name: "eth0".into(),
            is_up: true,
            is_loopback: false,
            mac: Some(mac.into()),
            addresses: vec![ip.parse().unwrap()],
        },
    ])
}

struct Issued {
    dir: tempfile::TempDir,
    key: DeploymentKey,
    artifact_path: PathBuf,
}

fn issue_package() -> Issued {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_authority(dir.path().join("rules.db"));
    let key = DeploymentKey::generate();

    let file = dir.path().join("doc.txt");
    std::fs::write(&file, b"eyes only").unwrap();

    let authority = HttpAuthority::new(base.clone(), Duration::from_secs(5)).unwrap();
    let issuer = Issuer::new(&authority, &key, base, b"stub".to_vec());
    let issued = issuer
        .issue(&IssueRequest {
            file,
            password: "pw".into(),
            fingerprint: DeviceFingerprint::new("10.0.0.5", "aa:bb:cc:dd:ee:ff"),
            out_dir: dir.path().join("dist"),
        })
        .unwrap();

    Issued {
        dir,
        key,
        artifact_path: issued.artifact_path,
    }
}

fn open_package(
    issued: &Issued,
    interfaces: &StaticInterfaces,
    password: &'static str,
) -> (Outcome, Vec<PathBuf>) {
    let artifact = PackageArtifact::read_from_path(&issued.artifact_path).unwrap();
    let authority =
        HttpAuthority::new(artifact.manifest.authority_url.clone(), Duration::from_secs(5))
            .unwrap();
    let console = FixedPassword(password);
    let destroyer = RecordingDestroyer::default();
    let restore_dir = issued.dir.path().join("restored");
    std::fs::create_dir_all(&restore_dir).unwrap();

    let mut agent = Agent::new(&authority, interfaces, &console, &destroyer, &issued.key)
        .output_dir(&restore_dir);
    let outcome = agent.run(&artifact, &issued.artifact_path);
    (outcome, destroyer.0.into_inner())
}

#[test]
fn issued_package_opens_on_the_authorized_device() {
    let issued = issue_package();
    let (outcome, destroyed) =
        open_package(&issued, &nic("10.0.0.5", "aa:bb:cc:dd:ee:ff"), "pw");

    let Outcome::Success { output } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(output.file_name().unwrap(), "doc.txt");
    assert_eq!(std::fs::read(output).unwrap(), b"eyes only");
    assert!(destroyed.is_empty());
}

#[test]
fn issued_package_self_destructs_elsewhere() {
    let issued = issue_package();
    let (outcome, destroyed) =
        open_package(&issued, &nic("10.0.0.99", "aa:bb:cc:dd:ee:ff"), "pw");

    assert!(matches!(
        outcome,
        Outcome::Destroyed {
            cause: AgentError::Denied {
                stage: Stage::PreCheck,
                reason: None
            }
        }
    ));
    assert_eq!(destroyed, vec![issued.artifact_path.clone()]);
}

#[test]
fn issued_package_rejects_wrong_password() {
    let issued = issue_package();
    let (outcome, destroyed) =
        open_package(&issued, &nic("10.0.0.5", "aa:bb:cc:dd:ee:ff"), "guess");

    assert!(matches!(
        outcome,
        Outcome::Destroyed {
            cause: AgentError::Denied {
                stage: Stage::Verify,
                reason: Some(_)
            }
        }
    ));
    assert_eq!(destroyed.len(), 1);
}
