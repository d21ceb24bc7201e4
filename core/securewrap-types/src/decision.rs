//! Authorization decisions.

use serde::{Deserialize, Serialize};

/// Reason given by verify when no rule exists for the package.
pub const REASON_NOT_FOUND: &str = "package not found";

/// Reason given by verify when a rule exists but a field differs.
pub const REASON_CREDENTIALS_MISMATCH: &str = "credentials mismatch";

/// Outcome of a pre-check or verify call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Decision {
    /// The device (and password, for verify) is authorized.
    Allowed,
    /// Authorization refused. Pre-check never carries a reason.
    Denied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Decision {
    /// A denial without explanation.
    #[must_use]
    pub fn denied() -> Self {
        Self::Denied { reason: None }
    }

    /// A denial carrying a reason.
    #[must_use]
    pub fn denied_because(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed => None,
            Self::Denied { reason } => reason.as_deref(),
        }
    }

    /// Drops the reason from a denial.
    #[must_use]
    pub fn without_reason(self) -> Self {
        match self {
            Self::Allowed => Self::Allowed,
            Self::Denied { .. } => Self::denied(),
        }
    }
}
