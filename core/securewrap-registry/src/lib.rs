//! Access rule registry for the SecureWrap Authority.
//!
//! Rules are stored one per package id behind the [`RuleRegistry`] trait.
//! [`SqliteRuleRegistry`] is the production backend; [`MemoryRuleRegistry`]
//! has the same semantics without persistence.
//!
//! Authorization is exact string equality. The pre-check compares IP and
//! MAC and never explains a denial; verify also compares the password and
//! tells a missing package apart from a credentials mismatch.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::{RegistryError, RegistryResult};
pub use memory::MemoryRuleRegistry;
pub use sqlite::SqliteRuleRegistry;
pub use traits::{RuleRegistry, Verdict};
