//! In-memory implementation of the RuleRegistry trait.
//!
//! Same semantics as SQLite, no persistence. Used by tests and by
//! `--database :memory:` runs of the Authority.

use std::collections::HashMap;
use std::sync::RwLock;

use securewrap_types::{AccessRule, PackageId};

use crate::error::{RegistryError, RegistryResult};
use crate::traits::RuleRegistry;

/// In-memory rule store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryRuleRegistry {
    rules: RwLock<HashMap<PackageId, AccessRule>>,
}

impl MemoryRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleRegistry for MemoryRuleRegistry {
    fn register(&self, rule: &AccessRule) -> RegistryResult<()> {
        rule.validate()?;
        let mut rules = self.rules.write().map_err(|_| RegistryError::Poisoned)?;
        rules.insert(rule.package_id.clone(), rule.clone());
        Ok(())
    }

    fn deregister(&self, package_id: &PackageId) -> RegistryResult<bool> {
        let mut rules = self.rules.write().map_err(|_| RegistryError::Poisoned)?;
        Ok(rules.remove(package_id).is_some())
    }

    fn lookup(&self, package_id: &PackageId) -> RegistryResult<Option<AccessRule>> {
        let rules = self.rules.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(rules.get(package_id).cloned())
    }

    fn count(&self) -> RegistryResult<usize> {
        let rules = self.rules.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(rules.len())
    }
}
