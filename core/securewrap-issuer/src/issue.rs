//! The issue pipeline.
//!
//! Issuing is two-phase so that a rule never outlives a failed issue:
//!
//! 1. Seal the file and build the complete artifact in memory.
//! 2. Register the rule with the Authority.
//! 3. Write the artifact. If that fails, deregister the rule again.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use securewrap_client::Authority;
use securewrap_crypto::{DeploymentKey, seal};
use securewrap_package::{PackageArtifact, PackageManifest, artifact_file_name};
use securewrap_types::{AccessRule, DeviceFingerprint, PackageId};
use tracing::{debug, info, warn};

use crate::error::{IssuerError, IssuerResult};

/// What the operator asked for.
#[derive(Clone)]
pub struct IssueRequest {
    pub file: PathBuf,
    pub password: String,
    pub fingerprint: DeviceFingerprint,
    pub out_dir: PathBuf,
}

impl std::fmt::Debug for IssueRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueRequest")
            .field("file", &self.file)
            .field("password", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint)
            .field("out_dir", &self.out_dir)
            .finish()
    }
}

/// A package that was registered and written.
#[derive(Debug, Clone)]
pub struct IssuedPackage {
    pub package_id: PackageId,
    pub artifact_path: PathBuf,
    pub manifest: PackageManifest,
}

pub struct Issuer<'a> {
    authority: &'a dyn Authority,
    key: &'a DeploymentKey,
    authority_url: String,
    stub: Vec<u8>,
}

impl<'a> Issuer<'a> {
    /// `stub` is the agent executable every artifact starts with;
    /// `authority_url` is recorded in each manifest for the agent to call.
    pub fn new(
        authority: &'a dyn Authority,
        key: &'a DeploymentKey,
        authority_url: impl Into<String>,
        stub: Vec<u8>,
    ) -> Self {
        Self {
            authority,
            key,
            authority_url: authority_url.into(),
            stub,
        }
    }

    /// Issues a package stamped with the current time.
    pub fn issue(&self, request: &IssueRequest) -> IssuerResult<IssuedPackage> {
        self.issue_at(request, chrono::Utc::now().timestamp())
    }

    /// Issues a package whose id is stamped with `unix_secs`.
    pub fn issue_at(&self, request: &IssueRequest, unix_secs: i64) -> IssuerResult<IssuedPackage> {
        validate(request)?;

        let plaintext = fs::read(&request.file).map_err(|source| IssuerError::Read {
            path: request.file.clone(),
            source,
        })?;

        let package_id = PackageId::for_file_at(&request.file, unix_secs);
        let manifest = PackageManifest::new(
            package_id.clone(),
            &request.file,
            self.authority_url.clone(),
        );
        let envelope = seal(&plaintext, self.key)?;
        let artifact = PackageArtifact::new(manifest.clone(), envelope);
        let bytes = artifact.embed(&self.stub)?;
        debug!(
            "Built artifact for {}: {} bytes payload, {} bytes total",
            package_id,
            plaintext.len(),
            bytes.len()
        );

        let rule = AccessRule::new(
            package_id.clone(),
            request.password.clone(),
            request.fingerprint.clone(),
        );
        self.authority
            .register(&rule)
            .map_err(IssuerError::Registration)?;
        info!("Registered {} for {}", package_id, request.fingerprint);

        let artifact_path = request.out_dir.join(artifact_file_name(&request.file));
        if let Err(source) = write_artifact(&artifact_path, &bytes) {
            let rolled_back = match self.authority.deregister(&package_id) {
                Ok(()) => {
                    info!("Rolled back registration of {}", package_id);
                    true
                }
                Err(e) => {
                    warn!("Rollback of {} failed: {}", package_id, e);
                    false
                }
            };
            return Err(IssuerError::Write {
                path: artifact_path,
                source,
                rolled_back,
            });
        }

        info!("Wrote {:?}", artifact_path);
        Ok(IssuedPackage {
            package_id,
            artifact_path,
            manifest,
        })
    }
}

fn validate(request: &IssueRequest) -> IssuerResult<()> {
    if request.password.is_empty() {
        return Err(IssuerError::InvalidInput("password must not be empty".into()));
    }
    if request.fingerprint.ip.is_empty() {
        return Err(IssuerError::InvalidInput("IP address must not be empty".into()));
    }
    if request.fingerprint.mac.is_empty() {
        return Err(IssuerError::InvalidInput("MAC address must not be empty".into()));
    }
    if !request.file.is_file() {
        return Err(IssuerError::InvalidInput(format!(
            "{} is not a readable file",
            request.file.display()
        )));
    }
    Ok(())
}

/// Writes through a temp file in the target directory so a failed write
/// never leaves a partial artifact behind.
fn write_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o755))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
