//! Persistence collaborator: the read accessors the analytics depend on, and a
//! SQLite-backed journal that implements them.

pub mod export;
mod settings;
mod trades;
mod vocabulary;

pub use export::{ImportSummary, JournalExport, export_all, import_all, trades_to_csv};

use crate::db::Database;
use crate::error::Result;
use crate::models::{Account, JournalSnapshot, Mistake, Settings, Template, Trade};

/// Read side of the journal. Each call returns an owned snapshot.
pub trait JournalStore {
    fn list_trades(&self) -> Result<Vec<Trade>>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn list_templates(&self) -> Result<Vec<Template>>;
    fn list_mistakes(&self) -> Result<Vec<Mistake>>;
    fn get_settings(&self) -> Result<Settings>;

    fn snapshot(&self) -> Result<JournalSnapshot> {
        Ok(JournalSnapshot {
            settings: self.get_settings()?,
            accounts: self.list_accounts()?,
            templates: self.list_templates()?,
            mistakes: self.list_mistakes()?,
            trades: self.list_trades()?,
        })
    }
}

impl JournalStore for Database {
    fn list_trades(&self) -> Result<Vec<Trade>> {
        trades::list_trades(self)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        vocabulary::list_accounts(self)
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        vocabulary::list_templates(self)
    }

    fn list_mistakes(&self) -> Result<Vec<Mistake>> {
        vocabulary::list_mistakes(self)
    }

    fn get_settings(&self) -> Result<Settings> {
        settings::get_settings(self)
    }
}
