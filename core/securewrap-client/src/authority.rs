//! The Authority as seen by issuers and agents.

use securewrap_registry::RuleRegistry;
use securewrap_types::{AccessRule, Decision, DeviceFingerprint, PackageId};

use crate::error::ClientResult;

/// Operations an issuer or agent performs against the Authority.
///
/// A returned `Decision` is the Authority's answer; an `Err` means no answer
/// was obtained. Agents treat both a denial and an error as "not allowed".
pub trait Authority: Send + Sync {
    fn register(&self, rule: &AccessRule) -> ClientResult<()>;

    /// Removes a rule. Succeeds whether or not the rule existed.
    fn deregister(&self, package_id: &PackageId) -> ClientResult<()>;

    fn pre_check(
        &self,
        package_id: &PackageId,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision>;

    fn verify(
        &self,
        package_id: &PackageId,
        password: &str,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision>;
}

/// Runs the Authority protocol against a registry in the same process.
pub struct LocalAuthority<R> {
    registry: R,
}

impl<R: RuleRegistry> LocalAuthority<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}

impl<R: RuleRegistry> Authority for LocalAuthority<R> {
    fn register(&self, rule: &AccessRule) -> ClientResult<()> {
        Ok(self.registry.register(rule)?)
    }

    fn deregister(&self, package_id: &PackageId) -> ClientResult<()> {
        self.registry.deregister(package_id)?;
        Ok(())
    }

    fn pre_check(
        &self,
        package_id: &PackageId,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision> {
        Ok(self.registry.pre_check(package_id, fingerprint))
    }

    fn verify(
        &self,
        package_id: &PackageId,
        password: &str,
        fingerprint: &DeviceFingerprint,
    ) -> ClientResult<Decision> {
        Ok(self.registry.verify(package_id, password, fingerprint))
    }
}
