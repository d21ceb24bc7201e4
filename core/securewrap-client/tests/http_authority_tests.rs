use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use securewrap_authority::{AppState, build_router};
use securewrap_client::{Authority, ClientError, HttpAuthority};
use securewrap_registry::{MemoryRuleRegistry, RuleRegistry};
use securewrap_types::{
    AccessRule, Decision, DeviceFingerprint, PackageId, REASON_CREDENTIALS_MISMATCH,
    REASON_NOT_FOUND,
};

/// Runs the Authority on its own runtime thread, returning the base URL.
fn spawn_authority(state: AppState) -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            axum::serve(listener, build_router(state)).await.unwrap();
        });
    });
    format!("http://127.0.0.1:{}", rx.recv().unwrap())
}

fn setup() -> (HttpAuthority, Arc<MemoryRuleRegistry>) {
    let registry = Arc::new(MemoryRuleRegistry::new());
    let base = spawn_authority(AppState::new(registry.clone()));
    let client = HttpAuthority::new(base, Duration::from_secs(5)).unwrap();
    (client, registry)
}

fn device() -> DeviceFingerprint {
    DeviceFingerprint::new("10.0.0.5", "AA:BB:CC:DD:EE:FF")
}

fn rule() -> AccessRule {
    AccessRule::new(PackageId::parse("doc-1700000000").unwrap(), "pw", device())
}

#[test]
fn health_succeeds() {
    let (client, _) = setup();
    client.health().unwrap();
}

#[test]
fn register_then_pre_check_and_verify() {
    let (client, registry) = setup();
    client.register(&rule()).unwrap();
    assert_eq!(registry.count().unwrap(), 1);

    let id = rule().package_id;
    assert_eq!(client.pre_check(&id, &device()).unwrap(), Decision::Allowed);
    assert_eq!(client.verify(&id, "pw", &device()).unwrap(), Decision::Allowed);
}

#[test]
fn pre_check_denial_is_a_decision_not_an_error() {
    let (client, _) = setup();
    client.register(&rule()).unwrap();
    let other = DeviceFingerprint::new("10.0.0.5", "11:22:33:44:55:66");
    let decision = client.pre_check(&rule().package_id, &other).unwrap();
    assert_eq!(decision, Decision::denied());
}

#[test]
fn verify_denials_carry_reasons() {
    let (client, _) = setup();
    client.register(&rule()).unwrap();

    let mismatch = client.verify(&rule().package_id, "wrong", &device()).unwrap();
    assert_eq!(mismatch.reason(), Some(REASON_CREDENTIALS_MISMATCH));

    let missing = PackageId::parse("ghost").unwrap();
    let unknown = client.verify(&missing, "pw", &device()).unwrap();
    assert_eq!(unknown.reason(), Some(REASON_NOT_FOUND));
}

#[test]
fn register_with_empty_field_is_rejected() {
    let (client, _) = setup();
    let mut bad = rule();
    bad.ip = String::new();
    match client.register(&bad) {
        Err(ClientError::Rejected { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("ip"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn deregister_removes_rule() {
    let (client, registry) = setup();
    client.register(&rule()).unwrap();
    client.deregister(&rule().package_id).unwrap();
    client.deregister(&rule().package_id).unwrap();
    assert_eq!(registry.count().unwrap(), 0);
}

#[test]
fn trailing_slash_in_base_url_is_ignored() {
    let registry = Arc::new(MemoryRuleRegistry::new());
    let base = spawn_authority(AppState::new(registry));
    let client = HttpAuthority::new(format!("{base}/"), Duration::from_secs(5)).unwrap();
    assert_eq!(client.base_url(), base);
    client.health().unwrap();
}

#[test]
fn unreachable_authority_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client =
        HttpAuthority::new(format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();
    let err = client.pre_check(&rule().package_id, &device()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}

#[test]
fn silent_authority_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut stream = stream;
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            std::thread::sleep(Duration::from_secs(5));
        }
    });

    let client =
        HttpAuthority::new(format!("http://127.0.0.1:{port}"), Duration::from_millis(300)).unwrap();
    let err = client.verify(&rule().package_id, "pw", &device()).unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");
}

#[test]
fn zero_timeout_is_rejected() {
    let err = HttpAuthority::new("http://localhost:8080", Duration::ZERO).err();
    assert!(matches!(err, Some(ClientError::Config(_))));
}
