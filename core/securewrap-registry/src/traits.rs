//! RuleRegistry trait: the abstract interface for rule persistence.
//!
//! Implementations provide atomic upsert/lookup/delete keyed by package id.
//! The authorization checks are provided methods built on `lookup`, so every
//! backend answers pre-check and verify identically.

use securewrap_types::{
    AccessRule, Decision, DeviceFingerprint, PackageId, REASON_CREDENTIALS_MISMATCH,
    REASON_NOT_FOUND,
};
use tracing::warn;

use crate::error::RegistryResult;

/// Result of comparing a request against the stored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every compared field matched.
    Allowed,
    /// No rule exists for the package, or it could not be read.
    UnknownPackage,
    /// A rule exists but at least one compared field differs.
    Mismatch,
}

impl Verdict {
    /// Pre-check answers never say why they failed.
    #[must_use]
    pub fn pre_check_decision(self) -> Decision {
        match self {
            Self::Allowed => Decision::Allowed,
            Self::UnknownPackage | Self::Mismatch => Decision::denied(),
        }
    }

    /// Verify answers distinguish a missing package from wrong credentials.
    #[must_use]
    pub fn verify_decision(self) -> Decision {
        match self {
            Self::Allowed => Decision::Allowed,
            Self::UnknownPackage => Decision::denied_because(REASON_NOT_FOUND),
            Self::Mismatch => Decision::denied_because(REASON_CREDENTIALS_MISMATCH),
        }
    }
}

/// Persistent store of access rules, one per package id.
pub trait RuleRegistry: Send + Sync {
    /// Inserts the rule, or replaces every field of an existing rule with the same id.
    fn register(&self, rule: &AccessRule) -> RegistryResult<()>;

    /// Removes a rule. Returns whether one existed.
    fn deregister(&self, package_id: &PackageId) -> RegistryResult<bool>;

    /// Fetches the rule for a package.
    fn lookup(&self, package_id: &PackageId) -> RegistryResult<Option<AccessRule>>;

    /// Number of stored rules.
    fn count(&self) -> RegistryResult<usize>;

    /// Compares IP and MAC against the stored rule.
    fn check_fingerprint(&self, package_id: &PackageId, fingerprint: &DeviceFingerprint) -> Verdict {
        match self.lookup(package_id) {
            Ok(Some(rule)) if rule.matches_fingerprint(fingerprint) => Verdict::Allowed,
            Ok(Some(_)) => Verdict::Mismatch,
            Ok(None) => Verdict::UnknownPackage,
            Err(e) => {
                warn!("Rule lookup failed for {}: {}", package_id, e);
                Verdict::UnknownPackage
            }
        }
    }

    /// Compares password, IP and MAC against the stored rule.
    fn check_credentials(
        &self,
        package_id: &PackageId,
        password: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Verdict {
        match self.lookup(package_id) {
            Ok(Some(rule)) if rule.matches_credentials(password, fingerprint) => Verdict::Allowed,
            Ok(Some(_)) => Verdict::Mismatch,
            Ok(None) => Verdict::UnknownPackage,
            Err(e) => {
                warn!("Rule lookup failed for {}: {}", package_id, e);
                Verdict::UnknownPackage
            }
        }
    }

    /// Silent pre-check: Allowed only when IP and MAC both match.
    fn pre_check(&self, package_id: &PackageId, fingerprint: &DeviceFingerprint) -> Decision {
        self.check_fingerprint(package_id, fingerprint)
            .pre_check_decision()
    }

    /// Full verification: Allowed only when password, IP and MAC all match.
    fn verify(
        &self,
        package_id: &PackageId,
        password: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Decision {
        self.check_credentials(package_id, password, fingerprint)
            .verify_decision()
    }
}
