use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::JournalStore;
use super::settings::write_settings;
use super::trades::{new_trade_id, upsert_trade};
use super::vocabulary::{
    prepare_accounts, prepare_mistakes, prepare_templates, write_accounts, write_mistakes,
    write_templates,
};
use crate::db::Database;
use crate::error::{JournalError, Result};
use crate::models::{Account, Mistake, Settings, Template, Trade, UpdateSettingsInput};

pub const EXPORT_VERSION: u32 = 1;

/// Full journal backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalExport {
    pub version: u32,
    pub exported_at: String,
    pub settings: Settings,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub mistakes: Vec<Mistake>,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl JournalExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub accounts: usize,
    pub templates: usize,
    pub mistakes: usize,
    pub trades: usize,
}

pub fn export_all<S: JournalStore>(store: &S) -> Result<JournalExport> {
    let snapshot = store.snapshot()?;
    Ok(JournalExport {
        version: EXPORT_VERSION,
        exported_at: Utc::now().to_rfc3339(),
        settings: snapshot.settings,
        accounts: snapshot.accounts,
        templates: snapshot.templates,
        mistakes: snapshot.mistakes,
        trades: snapshot.trades,
    })
}

/// Restore a backup: settings and the three vocabularies are replaced, trades
/// are written over any existing trade with the same id. Either everything is
/// written or nothing is.
pub fn import_all(db: &Database, export: JournalExport) -> Result<ImportSummary> {
    if export.version > EXPORT_VERSION {
        return Err(JournalError::InvalidInput(format!(
            "export version {} is newer than supported version {}",
            export.version, EXPORT_VERSION
        )));
    }

    let accounts = prepare_accounts(export.accounts)?;
    let templates = prepare_templates(export.templates)?;
    let mistakes = prepare_mistakes(export.mistakes)?;

    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    write_settings(
        &tx,
        UpdateSettingsInput {
            currency: Some(export.settings.currency),
            initial_capital: Some(export.settings.initial_capital),
            analytics: Some(export.settings.analytics),
        },
    )?;
    write_accounts(&tx, &accounts)?;
    write_templates(&tx, &templates)?;
    write_mistakes(&tx, &mistakes)?;

    let now = Utc::now().timestamp();
    let mut trades = 0;
    for mut trade in export.trades {
        if trade.id.trim().is_empty() {
            trade.id = new_trade_id();
        }
        if trade.created_at == 0 {
            trade.created_at = now;
        }
        if trade.updated_at == 0 {
            trade.updated_at = now;
        }
        upsert_trade(&tx, &trade)?;
        // deleted_at is NULL for imported trades
        tx.execute("UPDATE trades SET deleted_at = NULL WHERE id = ?", [&trade.id])?;
        trades += 1;
    }

    tx.commit()?;

    let summary = ImportSummary {
        accounts: accounts.len(),
        templates: templates.len(),
        mistakes: mistakes.len(),
        trades,
    };
    log::info!("Imported journal backup: {:?}", summary);
    Ok(summary)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: &'a str,
    time: &'a str,
    account_id: &'a str,
    symbol: &'a str,
    direction: &'a str,
    entry: Option<f64>,
    exit: Option<f64>,
    stop: Option<f64>,
    target: Option<f64>,
    size: Option<f64>,
    pnl: f64,
    outcome: &'a str,
    r_multiple: Option<f64>,
    template_id: &'a str,
    mood: &'a str,
    confidence: Option<f64>,
    stress: Option<f64>,
    sleep: Option<f64>,
    discipline: &'a str,
    emotions: String,
    mistakes: String,
    notes: &'a str,
}

/// One row per trade, psychology flattened; list fields are joined with `;`.
pub fn trades_to_csv(trades: &[Trade]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for trade in trades {
        let pre = trade.pre_trade();
        let post = trade.post_trade();
        writer.serialize(CsvRow {
            id: &trade.id,
            date: &trade.date,
            time: trade.time.as_deref().unwrap_or(""),
            account_id: trade.account_id.as_deref().unwrap_or(""),
            symbol: &trade.symbol,
            direction: trade.direction.as_str(),
            entry: trade.entry,
            exit: trade.exit,
            stop: trade.stop,
            target: trade.target,
            size: trade.size,
            pnl: trade.pnl_value(),
            outcome: trade.outcome().as_str(),
            r_multiple: trade.r_multiple,
            template_id: trade.template_id.as_deref().unwrap_or(""),
            mood: pre.and_then(|p| p.mood).map(|m| m.as_str()).unwrap_or(""),
            confidence: pre.and_then(|p| p.confidence),
            stress: pre.and_then(|p| p.stress),
            sleep: pre.and_then(|p| p.sleep),
            discipline: post.and_then(|p| p.discipline).map(|d| d.as_str()).unwrap_or(""),
            emotions: post.map(|p| p.emotions.join(";")).unwrap_or_default(),
            mistakes: trade.mistake_ids().join(";"),
            notes: &trade.notes,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| JournalError::CsvError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| JournalError::CsvError(e.to_string()))
}
