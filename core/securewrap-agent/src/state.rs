//! Agent protocol states and run outcomes.

use std::fmt;
use std::path::PathBuf;

use crate::error::AgentError;

/// States of one agent run, in protocol order.
///
/// `Success`, `Aborted` and `Destroyed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Start,
    FingerprintCheck,
    PreAuthorized,
    PasswordPrompt,
    FullyVerified,
    Decrypting,
    Success,
    Aborted,
    Destroyed,
}

impl AgentState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Aborted | Self::Destroyed)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::FingerprintCheck => "fingerprint-check",
            Self::PreAuthorized => "pre-authorized",
            Self::PasswordPrompt => "password-prompt",
            Self::FullyVerified => "fully-verified",
            Self::Decrypting => "decrypting",
            Self::Success => "success",
            Self::Aborted => "aborted",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// How an agent run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Plaintext restored at `output`.
    Success { output: PathBuf },
    /// The user cancelled the password prompt. Nothing was touched.
    Aborted,
    /// Destruction was triggered.
    Destroyed { cause: AgentError },
}

impl Outcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success { .. } | Self::Aborted => 0,
            Self::Destroyed { .. } => crate::destroy::DESTROY_EXIT_CODE,
        }
    }
}
