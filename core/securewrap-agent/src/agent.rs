//! The verification protocol run by every package.
//!
//! ```text
//! Start -> FingerprintCheck -> PreAuthorized -> PasswordPrompt
//!       -> FullyVerified -> Decrypting -> Success
//! ```
//!
//! Any failure before `Success` moves to `Destroyed`, except cancelling the
//! password prompt, which moves to `Aborted` and touches nothing. The
//! fingerprint is derived afresh for pre-check and again for verify.

use std::fs;
use std::path::{Path, PathBuf};

use securewrap_client::Authority;
use securewrap_crypto::{DeploymentKey, open};
use securewrap_device::{InterfaceSource, derive_fingerprint_from};
use securewrap_package::PackageArtifact;
use securewrap_types::Decision;
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::destroy::Destroyer;
use crate::error::{AgentError, Stage};
use crate::state::{AgentState, Outcome};

pub const MSG_DEVICE_DENIED: &str = "This device is not authorized to open this package.";
pub const MSG_FINGERPRINT: &str = "Could not determine the network identity of this device.";
pub const MSG_CORRUPTED: &str = "Decryption failed. The package may be corrupted.";
pub const MSG_UNREACHABLE: &str = "The authorization server could not be reached.";

pub struct Agent<'a> {
    authority: &'a dyn Authority,
    interfaces: &'a dyn InterfaceSource,
    console: &'a dyn Console,
    destroyer: &'a dyn Destroyer,
    key: &'a DeploymentKey,
    output_dir: PathBuf,
    trace: Vec<AgentState>,
}

impl<'a> Agent<'a> {
    pub fn new(
        authority: &'a dyn Authority,
        interfaces: &'a dyn InterfaceSource,
        console: &'a dyn Console,
        destroyer: &'a dyn Destroyer,
        key: &'a DeploymentKey,
    ) -> Self {
        Self {
            authority,
            interfaces,
            console,
            destroyer,
            key,
            output_dir: PathBuf::from("."),
            trace: Vec::new(),
        }
    }

    /// Directory the plaintext is restored into. Defaults to the working directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Current state. `Start` before `run`.
    pub fn state(&self) -> AgentState {
        self.trace.last().copied().unwrap_or(AgentState::Start)
    }

    /// Every state entered so far, in order.
    pub fn trace(&self) -> &[AgentState] {
        &self.trace
    }

    /// Runs the protocol for `artifact`, located at `artifact_path`.
    pub fn run(&mut self, artifact: &PackageArtifact, artifact_path: &Path) -> Outcome {
        self.trace.clear();
        self.enter(AgentState::Start);
        let package_id = &artifact.manifest.package_id;
        info!("Opening package {}", package_id);

        // Silent pre-check.
        self.enter(AgentState::FingerprintCheck);
        let fingerprint = match derive_fingerprint_from(self.interfaces) {
            Ok(fp) => fp,
            Err(e) => {
                self.console.error("Security Error", MSG_FINGERPRINT);
                return self.destroy(artifact_path, e.into());
            }
        };
        match self.authority.pre_check(package_id, &fingerprint) {
            Ok(Decision::Allowed) => {}
            Ok(Decision::Denied { reason }) => {
                self.console.error("Access Denied", MSG_DEVICE_DENIED);
                return self.destroy(
                    artifact_path,
                    AgentError::Denied {
                        stage: Stage::PreCheck,
                        reason,
                    },
                );
            }
            Err(e) => {
                self.console.error("Access Denied", MSG_UNREACHABLE);
                return self.destroy(artifact_path, e.into());
            }
        }
        self.enter(AgentState::PreAuthorized);

        self.enter(AgentState::PasswordPrompt);
        let Some(password) = self.console.password() else {
            info!("Password prompt cancelled");
            self.enter(AgentState::Aborted);
            return Outcome::Aborted;
        };

        let fingerprint = match derive_fingerprint_from(self.interfaces) {
            Ok(fp) => fp,
            Err(e) => {
                self.console.error("Security Error", MSG_FINGERPRINT);
                return self.destroy(artifact_path, e.into());
            }
        };
        match self.authority.verify(package_id, &password, &fingerprint) {
            Ok(Decision::Allowed) => {}
            Ok(Decision::Denied { reason }) => {
                let shown = reason.as_deref().unwrap_or("access denied");
                self.console.error(
                    "Access Denied",
                    &format!("Reason: {shown}\n\nInitiating self-destruct sequence."),
                );
                return self.destroy(
                    artifact_path,
                    AgentError::Denied {
                        stage: Stage::Verify,
                        reason,
                    },
                );
            }
            Err(e) => {
                self.console.error("Access Denied", MSG_UNREACHABLE);
                return self.destroy(artifact_path, e.into());
            }
        }
        self.enter(AgentState::FullyVerified);

        self.enter(AgentState::Decrypting);
        let output = self.output_dir.join(artifact.manifest.output_file_name());
        if let Err(e) = self.restore(artifact, &output) {
            self.console.error("Critical Error", MSG_CORRUPTED);
            return self.destroy(artifact_path, e);
        }

        self.enter(AgentState::Success);
        self.console.info(
            "Success",
            &format!("File successfully decrypted and saved as: {}", output.display()),
        );
        Outcome::Success { output }
    }

    fn restore(&self, artifact: &PackageArtifact, output: &Path) -> Result<(), AgentError> {
        let plaintext = open(&artifact.envelope, self.key)?;
        fs::write(output, plaintext)?;
        info!("Restored {} bytes to {:?}", fs::metadata(output)?.len(), output);
        Ok(())
    }

    /// Records the failure and hands the artifact to the destroyer.
    ///
    /// The destroyer normally ends the process; if it returns, the outcome
    /// is reported to the caller.
    fn destroy(&mut self, artifact_path: &Path, cause: AgentError) -> Outcome {
        warn!("Destroying package after {}: {}", self.state(), cause);
        self.enter(AgentState::Destroyed);
        self.destroyer.destroy(artifact_path);
        Outcome::Destroyed { cause }
    }

    fn enter(&mut self, state: AgentState) {
        debug!("agent -> {}", state);
        self.trace.push(state);
    }
}
