//! SQLite implementation of the RuleRegistry trait.
//!
//! One row per package in `access_rules`; the primary key on `package_id`
//! makes registration an atomic upsert.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use securewrap_types::{AccessRule, PackageId};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::traits::RuleRegistry;

/// Persistent rule store backed by SQLite.
pub struct SqliteRuleRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRuleRegistry {
    /// Opens (or creates) a rule store at the given path.
    pub fn open(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory rule store.
    pub fn open_in_memory() -> RegistryResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> RegistryResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> RegistryResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS access_rules (
                    package_id TEXT PRIMARY KEY,
                    password TEXT NOT NULL,
                    ip_address TEXT NOT NULL,
                    mac_address TEXT NOT NULL
                );
                ",
            )?;
            Ok(())
        })
    }

    fn with_conn<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&Connection) -> RegistryResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| RegistryError::Poisoned)?;
        f(&conn)
    }
}

impl RuleRegistry for SqliteRuleRegistry {
    fn register(&self, rule: &AccessRule) -> RegistryResult<()> {
        rule.validate()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO access_rules (package_id, password, ip_address, mac_address)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (package_id) DO UPDATE SET
                    password = excluded.password,
                    ip_address = excluded.ip_address,
                    mac_address = excluded.mac_address",
                params![rule.package_id.as_str(), rule.password, rule.ip, rule.mac],
            )?;
            debug!("Stored rule for {}", rule.package_id);
            Ok(())
        })
    }

    fn deregister(&self, package_id: &PackageId) -> RegistryResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM access_rules WHERE package_id = ?1",
                params![package_id.as_str()],
            )?;
            Ok(removed > 0)
        })
    }

    fn lookup(&self, package_id: &PackageId) -> RegistryResult<Option<AccessRule>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT package_id, password, ip_address, mac_address
                     FROM access_rules WHERE package_id = ?1",
                    params![package_id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(id, password, ip, mac)| -> RegistryResult<AccessRule> {
                let package_id = PackageId::parse(&id)
                    .map_err(|e| RegistryError::InvalidData(format!("package_id: {e}")))?;
                Ok(AccessRule {
                    package_id,
                    password,
                    ip,
                    mac,
                })
            })
            .transpose()
        })
    }

    fn count(&self) -> RegistryResult<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM access_rules", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}
