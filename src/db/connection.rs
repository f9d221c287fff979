use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

use crate::db::migration_runner::MigrationRunner;
use crate::error::{JournalError, Result};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the journal database and bring its schema up to date.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::migrate(conn, db_path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrate(Connection::open_in_memory()?, ":memory:")
    }

    fn migrate(conn: Connection, db_path: &str) -> Result<Self> {
        let runner = MigrationRunner::new();

        log::info!("=== Starting database migration check ===");
        let applied = runner.run_pending_migrations(&conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;
        if let Some(version) = runner.get_current_version(&conn)? {
            log::info!("Schema version: {}", version);
        }

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| JournalError::DatabaseError(e.to_string()))
    }
}
