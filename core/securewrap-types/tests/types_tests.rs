use pretty_assertions::assert_eq;
use securewrap_types::wire::{PreCheckRequest, Status, StatusResponse, VerifyRequest};
use securewrap_types::{
    AccessRule, Decision, DeviceFingerprint, Error, PackageId, REASON_CREDENTIALS_MISMATCH,
};
use std::path::Path;

fn rule() -> AccessRule {
    AccessRule::new(
        PackageId::parse("doc-1700000000").unwrap(),
        "pw",
        DeviceFingerprint::new("10.0.0.5", "AA:BB:CC:DD:EE:FF"),
    )
}

// ── PackageId ────────────────────────────────────────────────────

#[test]
fn package_id_uses_stem_and_timestamp() {
    let id = PackageId::for_file_at(Path::new("/tmp/doc.pdf"), 1_700_000_000);
    assert_eq!(id.as_str(), "doc-1700000000");
}

#[test]
fn package_id_keeps_inner_dots_of_stem() {
    let id = PackageId::for_file_at(Path::new("archive.tar.gz"), 5);
    assert_eq!(id.as_str(), "archive.tar-5");
}

#[test]
fn package_id_without_stem_falls_back() {
    let id = PackageId::for_file_at(Path::new("/"), 7);
    assert_eq!(id.as_str(), "package-7");
}

#[test]
fn package_id_rejects_empty() {
    assert!(PackageId::parse("").is_err());
    assert!(PackageId::parse("   ").is_err());
}

#[test]
fn package_id_serializes_as_plain_string() {
    let id = PackageId::parse("abc-1").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc-1""#);
}

// ── AccessRule ───────────────────────────────────────────────────

#[test]
fn rule_matches_exact_fingerprint() {
    let rule = rule();
    assert!(rule.matches_fingerprint(&DeviceFingerprint::new("10.0.0.5", "AA:BB:CC:DD:EE:FF")));
}

#[test]
fn rule_comparison_is_case_sensitive() {
    let rule = rule();
    assert!(!rule.matches_fingerprint(&DeviceFingerprint::new("10.0.0.5", "aa:bb:cc:dd:ee:ff")));
}

#[test]
fn rule_credentials_require_all_three_fields() {
    let rule = rule();
    let fp = rule.fingerprint();
    assert!(rule.matches_credentials("pw", &fp));
    assert!(!rule.matches_credentials("PW", &fp));
    assert!(!rule.matches_credentials("pw", &DeviceFingerprint::new("10.0.0.6", fp.mac.clone())));
}

#[test]
fn rule_validate_reports_missing_field() {
    let mut rule = rule();
    rule.mac.clear();
    assert!(matches!(rule.validate(), Err(Error::MissingField("mac"))));
}

#[test]
fn rule_debug_redacts_password() {
    let mut rule = rule();
    rule.password = "hunter2".into();
    let debug = format!("{rule:?}");
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("REDACTED"));
}

#[test]
fn rule_accepts_legacy_file_id_field() {
    let json = r#"{"file_id":"doc-1","password":"pw","ip":"1.2.3.4","mac":"m"}"#;
    let rule: AccessRule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.package_id.as_str(), "doc-1");
}

#[test]
fn rule_missing_field_fails_to_parse() {
    let json = r#"{"package_id":"doc-1","ip":"1.2.3.4","mac":"m"}"#;
    assert!(serde_json::from_str::<AccessRule>(json).is_err());
}

// ── Decision ─────────────────────────────────────────────────────

#[test]
fn allowed_serializes_to_status_only() {
    let json = serde_json::to_string(&Decision::Allowed).unwrap();
    assert_eq!(json, r#"{"status":"allowed"}"#);
}

#[test]
fn vague_denial_has_no_reason_key() {
    let json = serde_json::to_string(&Decision::denied()).unwrap();
    assert_eq!(json, r#"{"status":"denied"}"#);
}

#[test]
fn reasoned_denial_parses() {
    let decision: Decision =
        serde_json::from_str(r#"{"status":"denied","reason":"credentials mismatch"}"#).unwrap();
    assert_eq!(decision.reason(), Some(REASON_CREDENTIALS_MISMATCH));
    assert!(!decision.is_allowed());
}

#[test]
fn without_reason_strips_denial_detail() {
    let decision = Decision::denied_because("x").without_reason();
    assert_eq!(decision, Decision::denied());
    assert_eq!(Decision::Allowed.without_reason(), Decision::Allowed);
}

#[test]
fn unknown_status_is_rejected() {
    assert!(serde_json::from_str::<Decision>(r#"{"status":"maybe"}"#).is_err());
}

// ── Wire ─────────────────────────────────────────────────────────

#[test]
fn pre_check_request_carries_fingerprint() {
    let fp = DeviceFingerprint::new("10.0.0.5", "aa:bb");
    let req = PreCheckRequest::new(PackageId::parse("p-1").unwrap(), &fp);
    assert_eq!(req.fingerprint(), fp);
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["package_id"], "p-1");
    assert!(json.get("password").is_none());
}

#[test]
fn verify_request_validate_rejects_blank_password() {
    let fp = DeviceFingerprint::new("10.0.0.5", "aa:bb");
    let req = VerifyRequest::new(PackageId::parse("p-1").unwrap(), "", &fp);
    assert!(matches!(req.validate(), Err(Error::MissingField("password"))));
}

#[test]
fn whitespace_credentials_validate_like_registration() {
    let fp = DeviceFingerprint::new(" ", "\t");
    let id = PackageId::parse("p-1").unwrap();
    let rule = AccessRule::new(id.clone(), "   ", fp.clone());
    assert!(rule.validate().is_ok());
    assert!(VerifyRequest::new(id.clone(), "   ", &fp).validate().is_ok());
    assert!(PreCheckRequest::new(id, &fp).validate().is_ok());
}

#[test]
fn status_response_shape() {
    let json = serde_json::to_string(&StatusResponse::new(Status::Registered)).unwrap();
    assert_eq!(json, r#"{"status":"registered"}"#);
}
