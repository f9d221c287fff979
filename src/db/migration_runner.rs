//! Versioned schema migrations.
//!
//! Each applied migration is recorded in `schema_migrations` with a SHA-256 of
//! its SQL so an edited migration is caught on the next open. Databases that
//! predate the history table are inspected and their existing tables marked as
//! applied instead of re-created.

use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use super::backup;
use crate::error::{JournalError, Result};

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }

    pub fn checksum(&self) -> String {
        Sha256::digest(self.sql.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

const MIGRATIONS: &[Migration] = &[
    Migration::new(0, "bootstrap", include_str!("migrations/000_bootstrap.sql")),
    Migration::new(1, "initial_schema", include_str!("migrations/001_initial_schema.sql")),
    Migration::new(2, "add_soft_delete", include_str!("migrations/002_add_soft_delete.sql")),
];

/// A row of `schema_migrations`. `checksum` is absent for migrations that
/// were detected on a legacy database rather than run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub checksum: Option<String>,
}

pub struct MigrationRunner {
    migrations: &'static [Migration],
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self { migrations: MIGRATIONS }
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map_or(0, |m| m.version)
    }

    /// Bring the schema up to the latest version and return how many
    /// migrations ran. File databases are snapshotted first.
    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        if !table_exists(conn, "schema_migrations")? {
            self.adopt_untracked_schema(conn)?;
        }

        let current = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| current.is_none_or(|v| m.version > v))
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        log::info!(
            "Journal schema at {:?}; migrating to v{} ({} step(s))",
            current,
            self.latest_version(),
            pending.len()
        );

        let snapshot = if backup::is_file_database(db_path) {
            let path = backup::snapshot(db_path, self.latest_version())?;
            log::info!("Saved pre-migration copy to {}", path.display());
            Some(path)
        } else {
            None
        };

        for (done, migration) in pending.iter().enumerate() {
            if let Err(e) = self.apply(conn, migration) {
                log::error!("Migration v{} {} failed: {}", migration.version, migration.name, e);
                if let Some(path) = &snapshot {
                    log::error!("The journal as it was before migrating is at {}", path.display());
                }
                return Err(e);
            }
            log::debug!("{}/{} migrations done", done + 1, pending.len());
        }

        Ok(pending.len())
    }

    fn apply(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let started = Instant::now();
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                migration.version,
                migration.name,
                Utc::now().timestamp(),
                migration.checksum(),
                elapsed_ms
            ],
        )?;
        tx.commit()?;

        log::info!(
            "Migration v{} {} applied ({} ms)",
            migration.version,
            migration.name,
            elapsed_ms
        );
        Ok(())
    }

    pub fn applied_migrations(&self, conn: &Connection) -> Result<Vec<AppliedMigration>> {
        let mut stmt =
            conn.prepare("SELECT version, name, checksum FROM schema_migrations ORDER BY version")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    checksum: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Error if any recorded checksum no longer matches the migration's SQL.
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        for applied in self.applied_migrations(conn)? {
            let Some(recorded) = &applied.checksum else {
                continue;
            };
            let Some(known) = self.migrations.iter().find(|m| m.version == applied.version) else {
                log::warn!(
                    "Journal has migration v{} {} which this version does not know",
                    applied.version,
                    applied.name
                );
                continue;
            };
            if *recorded != known.checksum() {
                return Err(JournalError::DatabaseError(format!(
                    "migration v{} {} was modified after it was applied",
                    applied.version, applied.name
                )));
            }
        }
        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        if !table_exists(conn, "schema_migrations")? {
            return Ok(None);
        }
        let version = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .optional()?
            .flatten();
        Ok(version)
    }

    /// Version a journal created before migrations were tracked is already at.
    fn detect_untracked_version(&self, conn: &Connection) -> Result<u32> {
        Ok(if column_exists(conn, "trades", "deleted_at")? {
            2
        } else if table_exists(conn, "trades")? {
            1
        } else {
            0
        })
    }

    fn adopt_untracked_schema(&self, conn: &Connection) -> Result<()> {
        let existing = self.detect_untracked_version(conn)?;
        self.apply(conn, &self.migrations[0])?;
        if existing == 0 {
            return Ok(());
        }

        log::info!("Found an untracked journal schema at v{}", existing);
        let now = Utc::now().timestamp();
        for migration in self.migrations[1..].iter().filter(|m| m.version <= existing) {
            conn.execute(
                "INSERT INTO schema_migrations
                     (version, name, applied_at, checksum, execution_time_ms, notes)
                 VALUES (?1, ?2, ?3, NULL, 0, 'detected')",
                params![migration.version, migration.name, now],
            )?;
        }

        let integrity: String = conn.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            return Err(JournalError::DatabaseError(format!(
                "existing journal failed integrity check: {}",
                integrity
            )));
        }
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
