use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::db::Database;
use crate::error::{JournalError, Result};
use crate::models::{Direction, Psychology, Trade};

const TRADE_COLUMNS: [&str; 19] = [
    "id",
    "date",
    "time",
    "account_id",
    "symbol",
    "direction",
    "entry",
    "exit",
    "stop",
    "target",
    "size",
    "pnl",
    "result",
    "r_multiple",
    "template_id",
    "psychology",
    "notes",
    "created_at",
    "updated_at",
];

// Journal order; same-day trades stay in the order they were logged.
const ORDER_CLAUSE: &str = "ORDER BY date ASC, COALESCE(time, '') ASC, created_at ASC, rowid ASC";

pub(super) fn new_trade_id() -> String {
    format!("TRADE-{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
}

/// Helper function to map a database row to a Trade struct
fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    let id: String = row.get("id")?;
    let psychology = row
        .get::<_, Option<String>>("psychology")?
        .and_then(|raw| match serde_json::from_str::<Psychology>(&raw) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("Ignoring unreadable psychology for trade {}: {}", id, e);
                None
            }
        });

    Ok(Trade {
        date: row.get("date")?,
        time: row.get("time")?,
        account_id: row.get("account_id")?,
        symbol: row.get("symbol")?,
        direction: Direction::from_label(&row.get::<_, String>("direction")?),
        entry: row.get("entry")?,
        exit: row.get("exit")?,
        stop: row.get("stop")?,
        target: row.get("target")?,
        size: row.get("size")?,
        pnl: row.get("pnl")?,
        result: row.get("result")?,
        r_multiple: row.get("r_multiple")?,
        template_id: row.get("template_id")?,
        psychology,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        id,
    })
}

fn query_trades(
    conn: &Connection,
    condition: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Trade>> {
    let query = format!(
        "SELECT {} FROM trades WHERE {} {}",
        TRADE_COLUMNS.join(", "),
        condition,
        ORDER_CLAUSE
    );
    let mut stmt = conn.prepare(&query)?;
    let trades = stmt
        .query_map(params, map_row_to_trade)?
        .collect::<rusqlite::Result<Vec<Trade>>>()?;
    Ok(trades)
}

/// Insert the trade, or overwrite every field but `created_at` if the id exists.
pub(super) fn upsert_trade(conn: &Connection, trade: &Trade) -> Result<()> {
    let placeholders = vec!["?"; TRADE_COLUMNS.len()].join(", ");
    let updates = TRADE_COLUMNS
        .iter()
        .filter(|c| !matches!(**c, "id" | "created_at"))
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "INSERT INTO trades ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
        TRADE_COLUMNS.join(", "),
        placeholders,
        updates
    );

    let psychology = trade
        .psychology
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        &query,
        rusqlite::params![
            trade.id,
            trade.date,
            trade.time,
            trade.account_id,
            trade.symbol,
            trade.direction.as_str(),
            trade.entry,
            trade.exit,
            trade.stop,
            trade.target,
            trade.size,
            trade.pnl,
            trade.result,
            trade.r_multiple,
            trade.template_id,
            psychology,
            trade.notes,
            trade.created_at,
            trade.updated_at,
        ],
    )?;
    Ok(())
}

pub(super) fn list_trades(db: &Database) -> Result<Vec<Trade>> {
    let conn = db.lock()?;
    query_trades(&conn, "deleted_at IS NULL", &[])
}

impl Database {
    pub fn get_trade(&self, id: &str) -> Result<Trade> {
        let conn = self.lock()?;
        query_trades(&conn, "id = ? AND deleted_at IS NULL", &[&id])?
            .into_iter()
            .next()
            .ok_or_else(|| JournalError::NotFound(format!("trade {}", id)))
    }

    /// Create the trade (assigning an id when it has none) or update it in place.
    pub fn save_trade(&self, mut trade: Trade) -> Result<Trade> {
        if trade.id.trim().is_empty() {
            trade.id = new_trade_id();
        }

        {
            let conn = self.lock()?;
            let now = Utc::now().timestamp();
            let existing: Option<(i64, Option<i64>)> = conn
                .query_row(
                    "SELECT created_at, deleted_at FROM trades WHERE id = ?",
                    [&trade.id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((_, Some(_))) = existing {
                return Err(JournalError::InvalidInput(format!(
                    "trade {} is deleted, restore it before editing",
                    trade.id
                )));
            }
            let existing = existing.map(|(created_at, _)| created_at);

            trade.created_at = existing.unwrap_or(now);
            trade.updated_at = now;
            upsert_trade(&conn, &trade)?;

            if existing.is_none() {
                log::info!("Created trade {}", trade.id);
            }
        }

        self.get_trade(&trade.id)
    }

    /// Soft delete; the trade can be brought back with `restore_trade`.
    pub fn delete_trade(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE trades SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
            rusqlite::params![Utc::now().timestamp(), id],
        )?;
        if changed == 0 {
            return Err(JournalError::NotFound(format!("trade {}", id)));
        }
        Ok(())
    }

    pub fn restore_trade(&self, id: &str) -> Result<Trade> {
        {
            let conn = self.lock()?;
            let changed = conn.execute(
                "UPDATE trades SET deleted_at = NULL WHERE id = ? AND deleted_at IS NOT NULL",
                [id],
            )?;
            if changed == 0 {
                return Err(JournalError::NotFound(format!("deleted trade {}", id)));
            }
        }
        self.get_trade(id)
    }

    pub fn list_deleted_trades(&self) -> Result<Vec<Trade>> {
        let conn = self.lock()?;
        query_trades(&conn, "deleted_at IS NOT NULL", &[])
    }

    /// Permanently remove every trade, deleted or not. Returns the row count.
    pub fn delete_all_trades(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count = conn.execute("DELETE FROM trades", [])?;
        log::warn!("Deleted all {} trades", count);
        Ok(count)
    }
}
