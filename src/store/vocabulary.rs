//! Accounts, setup templates and the mistake catalogue. Each list is replaced
//! wholesale on save and read back in the order it was saved.

use std::collections::HashSet;

use rusqlite::Connection;

use crate::db::Database;
use crate::error::{JournalError, Result};
use crate::models::{Account, Mistake, Template, normalize_default};

fn assign_ids<'a>(prefix: &str, ids: impl Iterator<Item = &'a mut String>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            *id = format!("{}-{}", prefix, uuid::Uuid::new_v4());
        }
        if !seen.insert(id.clone()) {
            return Err(JournalError::InvalidInput(format!("duplicate id {}", id)));
        }
    }
    Ok(())
}

fn decode_list(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Unreadable template list {:?}: {}", raw, e);
        Vec::new()
    })
}

/// Delete-then-insert inside the caller's transaction.
fn replace_all<T>(
    conn: &Connection,
    table: &str,
    items: &[T],
    insert: impl Fn(&Connection, &T, usize) -> Result<()>,
) -> Result<()> {
    conn.execute(&format!("DELETE FROM {}", table), [])?;
    for (position, item) in items.iter().enumerate() {
        insert(conn, item, position)?;
    }
    Ok(())
}

pub(super) fn prepare_accounts(mut accounts: Vec<Account>) -> Result<Vec<Account>> {
    assign_ids("ACC", accounts.iter_mut().map(|a| &mut a.id))?;
    let cleared = normalize_default(&mut accounts);
    if cleared > 0 {
        log::warn!("Cleared {} extra default account flag(s)", cleared);
    }
    Ok(accounts)
}

pub(super) fn prepare_templates(mut templates: Vec<Template>) -> Result<Vec<Template>> {
    assign_ids("TPL", templates.iter_mut().map(|t| &mut t.id))?;
    let cleared = normalize_default(&mut templates);
    if cleared > 0 {
        log::warn!("Cleared {} extra default template flag(s)", cleared);
    }
    Ok(templates)
}

pub(super) fn prepare_mistakes(mut mistakes: Vec<Mistake>) -> Result<Vec<Mistake>> {
    assign_ids("MST", mistakes.iter_mut().map(|m| &mut m.id))?;
    Ok(mistakes)
}

pub(super) fn write_accounts(conn: &Connection, accounts: &[Account]) -> Result<()> {
    replace_all(conn, "accounts", accounts, |conn, account, position| {
        conn.execute(
            "INSERT INTO accounts (id, name, opening_balance, is_default, position)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![
                account.id,
                account.name,
                account.opening_balance,
                account.is_default as i32,
                position as i64,
            ],
        )?;
        Ok(())
    })
}

pub(super) fn write_templates(conn: &Connection, templates: &[Template]) -> Result<()> {
    replace_all(conn, "templates", templates, |conn, template, position| {
        conn.execute(
            "INSERT INTO templates (id, name, checklist, profile_4h, drivers, is_default, position)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                template.id,
                template.name,
                serde_json::to_string(&template.checklist)?,
                serde_json::to_string(&template.profile_4h)?,
                serde_json::to_string(&template.drivers)?,
                template.is_default as i32,
                position as i64,
            ],
        )?;
        Ok(())
    })
}

pub(super) fn write_mistakes(conn: &Connection, mistakes: &[Mistake]) -> Result<()> {
    replace_all(conn, "mistakes", mistakes, |conn, mistake, position| {
        conn.execute(
            "INSERT INTO mistakes (id, label, color, position) VALUES (?, ?, ?, ?)",
            rusqlite::params![mistake.id, mistake.label, mistake.color, position as i64],
        )?;
        Ok(())
    })
}

pub(super) fn list_accounts(db: &Database) -> Result<Vec<Account>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, opening_balance, is_default FROM accounts ORDER BY position ASC",
    )?;
    let accounts = stmt
        .query_map([], |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                opening_balance: row.get(2)?,
                is_default: row.get::<_, i32>(3)? == 1,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(accounts)
}

pub(super) fn list_templates(db: &Database) -> Result<Vec<Template>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, checklist, profile_4h, drivers, is_default
         FROM templates ORDER BY position ASC",
    )?;
    let templates = stmt
        .query_map([], |row| {
            Ok(Template {
                id: row.get(0)?,
                name: row.get(1)?,
                checklist: decode_list(row.get(2)?),
                profile_4h: decode_list(row.get(3)?),
                drivers: decode_list(row.get(4)?),
                is_default: row.get::<_, i32>(5)? == 1,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(templates)
}

pub(super) fn list_mistakes(db: &Database) -> Result<Vec<Mistake>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare("SELECT id, label, color FROM mistakes ORDER BY position ASC")?;
    let mistakes = stmt
        .query_map([], |row| {
            Ok(Mistake {
                id: row.get(0)?,
                label: row.get(1)?,
                color: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mistakes)
}

impl Database {
    /// Replace the account list. Blank ids are assigned; a second default is cleared.
    pub fn set_accounts(&self, accounts: Vec<Account>) -> Result<Vec<Account>> {
        let accounts = prepare_accounts(accounts)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_accounts(&tx, &accounts)?;
        tx.commit()?;
        Ok(accounts)
    }

    pub fn set_templates(&self, templates: Vec<Template>) -> Result<Vec<Template>> {
        let templates = prepare_templates(templates)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_templates(&tx, &templates)?;
        tx.commit()?;
        Ok(templates)
    }

    pub fn set_mistakes(&self, mistakes: Vec<Mistake>) -> Result<Vec<Mistake>> {
        let mistakes = prepare_mistakes(mistakes)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_mistakes(&tx, &mistakes)?;
        tx.commit()?;
        Ok(mistakes)
    }
}
