use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::filter_trades;
use super::grouping::{
    GroupStat, group_by_account, group_by_emotion, group_by_mistake, group_by_profile_4h,
    group_by_risk_reward, group_by_template,
};
use super::psychology::{Correlation, Insight, compute_correlations_with, compute_insights_with};
use super::stats::{
    DrawdownPoint, EquityCurvePoint, Stats, compute_stats, drawdown_series, equity_curve,
};
use super::targets::{TargetStats, compute_target_stats};
use crate::models::{JournalSnapshot, Trade, TradeFilter};

/// Every analytics view over one filtered selection of trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub trade_count: usize,
    pub starting_balance: f64,
    pub stats: Option<Stats>,
    pub equity_curve: Vec<EquityCurvePoint>,
    pub drawdown: Vec<DrawdownPoint>,
    pub by_template: Vec<GroupStat>,
    pub by_mistake: Vec<GroupStat>,
    pub by_profile_4h: Vec<GroupStat>,
    pub by_risk_reward: Vec<GroupStat>,
    pub by_account: Vec<GroupStat>,
    pub by_emotion: Vec<GroupStat>,
    pub correlations: Vec<Correlation>,
    pub insights: Vec<Insight>,
    pub targets: Option<TargetStats>,
}

/// Balance the equity curve starts from: the filtered account's opening
/// balance, else every account's combined, else the configured capital.
pub fn starting_balance(snapshot: &JournalSnapshot, filter: &TradeFilter) -> f64 {
    if let Some(account_id) = &filter.account_id {
        return snapshot
            .accounts
            .iter()
            .find(|a| &a.id == account_id)
            .and_then(|a| a.opening_balance)
            .unwrap_or(0.0);
    }

    if snapshot.accounts.is_empty() {
        snapshot.settings.initial_capital
    } else {
        snapshot
            .accounts
            .iter()
            .filter_map(|a| a.opening_balance)
            .sum()
    }
}

pub fn build_report(
    snapshot: &JournalSnapshot,
    filter: &TradeFilter,
    today: NaiveDate,
) -> AnalyticsReport {
    let config = &snapshot.settings.analytics;
    let trades: Vec<Trade> = filter_trades(&snapshot.trades, filter, today)
        .into_iter()
        .cloned()
        .collect();
    let starting_balance = starting_balance(snapshot, filter);

    log::debug!(
        "Building analytics report over {} of {} trades",
        trades.len(),
        snapshot.trades.len()
    );

    AnalyticsReport {
        trade_count: trades.len(),
        starting_balance,
        stats: compute_stats(&trades),
        equity_curve: equity_curve(&trades, starting_balance),
        drawdown: drawdown_series(&trades),
        by_template: group_by_template(&trades, &snapshot.templates),
        by_mistake: group_by_mistake(&trades, &snapshot.mistakes),
        by_profile_4h: group_by_profile_4h(&trades),
        by_risk_reward: group_by_risk_reward(&trades, config),
        by_account: group_by_account(&trades, &snapshot.accounts),
        by_emotion: group_by_emotion(&trades),
        correlations: compute_correlations_with(&trades, config),
        insights: compute_insights_with(&trades, config),
        targets: compute_target_stats(&trades),
    }
}
