use rusqlite::Connection;

use crate::analytics::AnalyticsConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{Settings, UpdateSettingsInput};

pub(super) fn get_settings(db: &Database) -> Result<Settings> {
    let conn = db.lock()?;

    let (settings, raw_config) = conn.query_row(
        "SELECT currency, initial_capital, analytics_config, created_at, updated_at
         FROM settings WHERE id = 1",
        [],
        |row| {
            Ok((
                Settings {
                    currency: row.get(0)?,
                    initial_capital: row.get(1)?,
                    analytics: AnalyticsConfig::default(),
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                },
                row.get::<_, String>(2)?,
            ))
        },
    )?;

    let analytics = serde_json::from_str(&raw_config).unwrap_or_else(|e| {
        log::warn!("Unreadable analytics config, using defaults: {}", e);
        AnalyticsConfig::default()
    });

    Ok(Settings { analytics, ..settings })
}

/// Apply the fields that are set; the caller owns the transaction.
pub(super) fn write_settings(conn: &Connection, settings: UpdateSettingsInput) -> Result<()> {
    // Build dynamic UPDATE query
    let mut updates = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(val) = settings.currency {
        updates.push("currency = ?");
        values.push(Box::new(val));
    }
    if let Some(val) = settings.initial_capital {
        updates.push("initial_capital = ?");
        values.push(Box::new(val));
    }
    if let Some(val) = settings.analytics {
        updates.push("analytics_config = ?");
        values.push(Box::new(serde_json::to_string(&val)?));
    }

    updates.push("updated_at = strftime('%s', 'now')");

    let query = format!("UPDATE settings SET {} WHERE id = 1", updates.join(", "));
    let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

    conn.execute(&query, params.as_slice())?;
    Ok(())
}

impl Database {
    pub fn update_settings(&self, settings: UpdateSettingsInput) -> Result<Settings> {
        {
            let conn = self.lock()?;
            write_settings(&conn, settings)?;
        }

        get_settings(self)
    }
}
