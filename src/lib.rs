//! Trading journal core: SQLite-backed storage for trades, accounts, setup
//! templates and the mistake catalogue, plus the performance and psychology
//! analytics computed over them.

pub mod analytics;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use analytics::{AnalyticsReport, build_report};
pub use db::Database;
pub use error::{JournalError, Result};
pub use store::JournalStore;

/// Open the journal at `db_path`, creating and migrating it as needed.
pub fn open_journal(db_path: &str) -> Result<Database> {
    let database = Database::new(db_path)?;
    log::info!("Journal opened at {}", db_path);
    Ok(database)
}
