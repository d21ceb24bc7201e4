//! Destructive failure handler.
//!
//! A running executable cannot reliably delete itself, so destruction hands
//! the job to a detached shell script that waits out a grace delay, removes
//! the artifact and then removes itself. Every step is best-effort: errors
//! are logged and discarded, and the process exits regardless.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{info, warn};

/// Exit code of a process that destroyed its artifact.
pub const DESTROY_EXIT_CODE: i32 = 1;

/// Seconds the helper waits before deleting, so this process can exit first.
pub const GRACE_DELAY_SECS: u32 = 2;

/// Removes the artifact after a denial or corruption.
pub trait Destroyer {
    fn destroy(&self, artifact: &Path);
}

/// Deletes the running artifact through a detached helper and exits.
#[derive(Debug, Clone)]
pub struct SelfDestruct {
    script_dir: PathBuf,
}

impl Default for SelfDestruct {
    fn default() -> Self {
        Self {
            script_dir: std::env::temp_dir(),
        }
    }
}

impl SelfDestruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes helper scripts into `dir` instead of the system temp dir.
    pub fn with_script_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: dir.into(),
        }
    }

    /// Writes the deletion script and launches it detached. Returns the
    /// script path.
    pub fn schedule(&self, artifact: &Path) -> io::Result<PathBuf> {
        let script_path = self.script_dir.join(format!(
            "securewrap-cleanup-{}.{}",
            uuid::Uuid::new_v4().simple(),
            SCRIPT_EXTENSION
        ));
        fs::write(&script_path, deletion_script(artifact))?;
        launch_detached(&script_path)?;
        info!("Scheduled deletion of {:?}", artifact);
        Ok(script_path)
    }
}

impl Destroyer for SelfDestruct {
    fn destroy(&self, artifact: &Path) {
        if let Err(e) = self.schedule(artifact) {
            warn!("Self-destruct could not be scheduled: {}", e);
        }
        std::process::exit(DESTROY_EXIT_CODE);
    }
}

#[cfg(not(windows))]
const SCRIPT_EXTENSION: &str = "sh";
#[cfg(windows)]
const SCRIPT_EXTENSION: &str = "bat";

/// Script that deletes `artifact` and then itself after the grace delay.
#[cfg(not(windows))]
pub fn deletion_script(artifact: &Path) -> String {
    format!(
        "#!/bin/sh\nsleep {GRACE_DELAY_SECS}\nrm -f {}\nrm -f \"$0\"\n",
        shell_quote(&artifact.to_string_lossy())
    )
}

/// Script that deletes `artifact` and then itself after the grace delay.
#[cfg(windows)]
pub fn deletion_script(artifact: &Path) -> String {
    format!(
        "@echo off\r\ntimeout /t {GRACE_DELAY_SECS} /nobreak > NUL\r\ndel /f /q \"{}\"\r\ndel /f /q \"%~f0\"\r\n",
        artifact.display()
    )
}

#[cfg(not(windows))]
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(not(windows))]
fn launch_detached(script: &Path) -> io::Result<()> {
    Command::new("/bin/sh")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(windows)]
fn launch_detached(script: &Path) -> io::Result<()> {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    Command::new("cmd.exe")
        .arg("/C")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(DETACHED_PROCESS | CREATE_NO_WINDOW)
        .spawn()
        .map(|_| ())
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn script_waits_then_removes_artifact_and_itself() {
        let script = deletion_script(Path::new("/opt/pkg/Secure-report"));
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines,
            vec![
                "#!/bin/sh",
                "sleep 2",
                "rm -f '/opt/pkg/Secure-report'",
                "rm -f \"$0\"",
            ]
        );
    }

    #[test]
    fn quotes_in_paths_are_escaped() {
        let script = deletion_script(Path::new("/tmp/it's here"));
        assert!(script.contains("rm -f '/tmp/it'\\''s here'"));
    }

    #[test]
    fn scheduled_script_removes_artifact_and_itself() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("Secure-report");
        fs::write(&artifact, b"stub").unwrap();

        let script = SelfDestruct::with_script_dir(dir.path())
            .schedule(&artifact)
            .unwrap();
        assert!(script.starts_with(dir.path()));
        assert!(artifact.exists(), "deletion must wait for the grace delay");

        std::thread::sleep(std::time::Duration::from_secs(u64::from(GRACE_DELAY_SECS) + 2));
        assert!(!artifact.exists());
        assert!(!script.exists());
    }
}
