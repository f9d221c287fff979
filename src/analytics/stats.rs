use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::PROFIT_FACTOR_NO_LOSSES;
use crate::models::{Outcome, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub expectancy: f64,
    pub avg_r_multiple: Option<f64>,
    pub max_drawdown: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub trade_id: String,
    pub date: String,
    pub cumulative_pnl: f64,
    pub peak: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: String,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
    pub balance: f64,
    pub trade_count: usize,
}

/// Percentage of winners in a set of trades; 0 for an empty set.
pub fn win_rate<'a, I>(trades: I) -> f64
where
    I: IntoIterator<Item = &'a Trade>,
{
    let (count, wins) = trades
        .into_iter()
        .fold((0usize, 0usize), |(count, wins), t| {
            (count + 1, wins + usize::from(t.is_win()))
        });

    if count == 0 {
        0.0
    } else {
        wins as f64 / count as f64 * 100.0
    }
}

/// Trades in date order. Stable, so same-day trades keep their input order;
/// undated trades come first.
pub fn chronological(trades: &[Trade]) -> Vec<&Trade> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.trade_date());
    ordered
}

/// Overflowed values become the largest finite value of the same sign, NaN
/// becomes 0.
pub fn finite(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

/// `a + b` that saturates at the finite range instead of reaching infinity.
pub fn saturating_add(a: f64, b: f64) -> f64 {
    finite(a + b)
}

pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss > 0.0 {
        finite(gross_profit / gross_loss)
    } else if gross_profit > 0.0 {
        PROFIT_FACTOR_NO_LOSSES
    } else {
        0.0
    }
}

pub fn compute_stats(trades: &[Trade]) -> Option<Stats> {
    if trades.is_empty() {
        return None;
    }

    let total_trades = trades.len();
    let mut wins = 0;
    let mut losses = 0;
    let mut breakevens = 0;
    let mut total_pnl = 0.0;
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;
    let mut best_trade = f64::MIN;
    let mut worst_trade = f64::MAX;

    for trade in trades {
        let pnl = trade.pnl_value();
        total_pnl = saturating_add(total_pnl, pnl);
        best_trade = best_trade.max(pnl);
        worst_trade = worst_trade.min(pnl);

        match trade.outcome() {
            Outcome::Win => {
                wins += 1;
                gross_profit = saturating_add(gross_profit, pnl.abs());
            }
            Outcome::Loss => {
                losses += 1;
                gross_loss = saturating_add(gross_loss, pnl.abs());
            }
            Outcome::Breakeven => breakevens += 1,
        }
    }

    let win_rate = wins as f64 / total_trades as f64 * 100.0;
    let avg_win = if wins > 0 { gross_profit / wins as f64 } else { 0.0 };
    let avg_loss = if losses > 0 { gross_loss / losses as f64 } else { 0.0 };
    let expectancy = finite((win_rate / 100.0) * avg_win - (1.0 - win_rate / 100.0) * avg_loss);

    let r_values: Vec<f64> = trades
        .iter()
        .filter_map(|t| t.r_multiple)
        .filter(|r| r.is_finite())
        .collect();
    let avg_r_multiple = if r_values.is_empty() {
        None
    } else {
        let sum = r_values.iter().fold(0.0, |acc, r| saturating_add(acc, *r));
        Some(sum / r_values.len() as f64)
    };

    let ordered = chronological(trades);
    let (max_consecutive_wins, max_consecutive_losses) = streaks(&ordered);

    Some(Stats {
        total_trades,
        wins,
        losses,
        breakevens,
        win_rate,
        total_pnl,
        gross_profit,
        gross_loss,
        profit_factor: profit_factor(gross_profit, gross_loss),
        avg_win,
        avg_loss,
        expectancy,
        avg_r_multiple,
        max_drawdown: max_drawdown(trades),
        best_trade,
        worst_trade,
        max_consecutive_wins,
        max_consecutive_losses,
    })
}

fn streaks(ordered: &[&Trade]) -> (usize, usize) {
    let mut best_wins = 0;
    let mut best_losses = 0;
    let mut wins = 0;
    let mut losses = 0;

    for trade in ordered {
        match trade.outcome() {
            Outcome::Win => {
                wins += 1;
                losses = 0;
            }
            Outcome::Loss => {
                losses += 1;
                wins = 0;
            }
            Outcome::Breakeven => {
                wins = 0;
                losses = 0;
            }
        }
        best_wins = best_wins.max(wins);
        best_losses = best_losses.max(losses);
    }

    (best_wins, best_losses)
}

/// Peak-to-trough walk over cumulative pnl in date order.
///
/// The peak starts at zero and only ever rises, so an account that loses from
/// the first trade is in drawdown from the start.
pub fn drawdown_series(trades: &[Trade]) -> Vec<DrawdownPoint> {
    let mut running = 0.0;
    let mut peak: f64 = 0.0;

    chronological(trades)
        .into_iter()
        .map(|trade| {
            running = saturating_add(running, trade.pnl_value());
            peak = peak.max(running);
            DrawdownPoint {
                trade_id: trade.id.clone(),
                date: trade.date.clone(),
                cumulative_pnl: running,
                peak,
                drawdown: finite(peak - running),
            }
        })
        .collect()
}

pub fn max_drawdown(trades: &[Trade]) -> f64 {
    drawdown_series(trades)
        .iter()
        .map(|p| p.drawdown)
        .fold(0.0, f64::max)
}

/// Daily equity points starting from `starting_balance`.
pub fn equity_curve(trades: &[Trade], starting_balance: f64) -> Vec<EquityCurvePoint> {
    let mut daily: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for trade in trades {
        let Some(day) = trade.trade_date() else {
            log::debug!("Equity curve skips trade {} with date {:?}", trade.id, trade.date);
            continue;
        };
        let entry = daily.entry(day).or_insert((0.0, 0));
        entry.0 = saturating_add(entry.0, trade.pnl_value());
        entry.1 += 1;
    }

    let mut cumulative_pnl = 0.0;
    daily
        .into_iter()
        .map(|(day, (daily_pnl, trade_count))| {
            cumulative_pnl = saturating_add(cumulative_pnl, daily_pnl);
            EquityCurvePoint {
                date: day.format("%Y-%m-%d").to_string(),
                daily_pnl,
                cumulative_pnl,
                balance: saturating_add(starting_balance, cumulative_pnl),
                trade_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: &str, date: &str, pnl: f64) -> Trade {
        Trade {
            id: id.to_string(),
            date: date.to_string(),
            pnl: Some(pnl),
            ..Default::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_empty_trades_have_no_stats() {
        assert!(compute_stats(&[]).is_none());
    }

    #[test]
    fn test_basic_aggregates() {
        let trades = vec![
            trade("t1", "2024-01-01", 100.0),
            trade("t2", "2024-01-02", -50.0),
            trade("t3", "2024-01-03", -30.0),
        ];
        let stats = compute_stats(&trades).unwrap();

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 2);
        assert_eq!(stats.breakevens, 0);
        assert_close(stats.total_pnl, 20.0);
        assert_close(stats.win_rate, 33.33);
        assert_close(stats.gross_profit, 100.0);
        assert_close(stats.gross_loss, 80.0);
        assert_close(stats.profit_factor, 1.25);
        assert_close(stats.avg_win, 100.0);
        assert_close(stats.avg_loss, 40.0);
        // 1/3 * 100 - 2/3 * 40
        assert_close(stats.expectancy, 6.67);
        assert_eq!(stats.best_trade, 100.0);
        assert_eq!(stats.worst_trade, -50.0);
        assert_eq!(stats.max_consecutive_losses, 2);
    }

    #[test]
    fn test_counts_always_add_up() {
        let trades = vec![
            trade("a", "2024-01-01", 10.0),
            trade("b", "2024-01-01", 0.0),
            Trade { id: "c".into(), ..Default::default() },
            trade("d", "2024-01-02", -4.0),
        ];
        let stats = compute_stats(&trades).unwrap();
        assert_eq!(stats.wins + stats.losses + stats.breakevens, stats.total_trades);
        assert_eq!(stats.breakevens, 2);
        assert!((0.0..=100.0).contains(&stats.win_rate));
    }

    #[test]
    fn test_profit_factor_sentinel() {
        let all_wins = vec![trade("a", "2024-01-01", 10.0), trade("b", "2024-01-02", 5.0)];
        assert_eq!(compute_stats(&all_wins).unwrap().profit_factor, 999.0);

        let flat = vec![trade("a", "2024-01-01", 0.0)];
        let stats = compute_stats(&flat).unwrap();
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.avg_win, 0.0);
        assert_eq!(stats.avg_loss, 0.0);
        assert_eq!(stats.expectancy, 0.0);

        let all_losses = vec![trade("a", "2024-01-01", -10.0)];
        assert_eq!(compute_stats(&all_losses).unwrap().profit_factor, 0.0);
    }

    #[test]
    fn test_avg_r_multiple_ignores_unset() {
        let mut trades = vec![
            trade("a", "2024-01-01", 10.0),
            trade("b", "2024-01-02", -5.0),
            trade("c", "2024-01-03", 20.0),
        ];
        trades[0].r_multiple = Some(2.0);
        trades[2].r_multiple = Some(3.0);

        let stats = compute_stats(&trades).unwrap();
        assert_eq!(stats.avg_r_multiple, Some(2.5));

        let none_set = vec![trade("a", "2024-01-01", 10.0)];
        assert_eq!(compute_stats(&none_set).unwrap().avg_r_multiple, None);
    }

    #[test]
    fn test_max_drawdown_walk() {
        let trades = vec![
            trade("t1", "2024-01-01", 100.0),
            trade("t2", "2024-01-02", -150.0),
            trade("t3", "2024-01-03", 50.0),
        ];
        let series = drawdown_series(&trades);
        let peaks: Vec<f64> = series.iter().map(|p| p.peak).collect();
        let drawdowns: Vec<f64> = series.iter().map(|p| p.drawdown).collect();

        assert_eq!(peaks, vec![100.0, 100.0, 100.0]);
        assert_eq!(drawdowns, vec![0.0, 150.0, 100.0]);
        assert_eq!(max_drawdown(&trades), 150.0);
    }

    #[test]
    fn test_drawdown_sorts_by_date_without_touching_input() {
        let trades = vec![
            trade("late", "2024-01-03", 50.0),
            trade("early", "2024-01-01", 100.0),
            trade("mid", "2024-01-02", -150.0),
        ];
        let before = trades.clone();

        assert_eq!(max_drawdown(&trades), 150.0);
        assert_eq!(trades, before);
        assert_eq!(drawdown_series(&trades), drawdown_series(&trades));
    }

    #[test]
    fn test_drawdown_from_first_loss() {
        let trades = vec![trade("a", "2024-01-01", -40.0), trade("b", "2024-01-02", -10.0)];
        assert_eq!(max_drawdown(&trades), 50.0);
    }

    #[test]
    fn test_drawdown_never_decreases_when_appending() {
        let pnls = [120.0, -80.0, 30.0, -200.0, 500.0, -10.0];
        let mut trades = Vec::new();
        let mut previous = 0.0;

        for (i, pnl) in pnls.iter().enumerate() {
            trades.push(trade(&format!("t{}", i), &format!("2024-02-{:02}", i + 1), *pnl));
            let current = max_drawdown(&trades);
            assert!(current >= previous);
            assert!(current >= 0.0);
            previous = current;
        }
        assert_eq!(previous, 250.0);
    }

    #[test]
    fn test_same_day_trades_keep_input_order() {
        let trades = vec![
            trade("first", "2024-01-01", -100.0),
            trade("second", "2024-01-01", 100.0),
        ];
        let series = drawdown_series(&trades);
        assert_eq!(series[0].trade_id, "first");
        assert_eq!(series[0].drawdown, 100.0);
        assert_eq!(series[1].drawdown, 0.0);
    }

    #[test]
    fn test_equity_curve_groups_days() {
        let trades = vec![
            trade("a", "2024-01-02", 50.0),
            trade("b", "2024-01-01", 100.0),
            trade("c", "2024-01-02", -20.0),
            trade("d", "not a date", 999.0),
        ];
        let curve = equity_curve(&trades, 1000.0);

        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].date, "2024-01-01");
        assert_eq!(curve[0].balance, 1100.0);
        assert_eq!(curve[1].daily_pnl, 30.0);
        assert_eq!(curve[1].trade_count, 2);
        assert_eq!(curve[1].cumulative_pnl, 130.0);
        assert_eq!(curve[1].balance, 1130.0);
    }

    #[test]
    fn test_extreme_pnl_stays_finite() {
        let trades = vec![
            trade("a", "2024-01-01", 1e308),
            trade("b", "2024-01-02", 1e308),
            trade("c", "2024-01-03", -1e308),
        ];
        let stats = compute_stats(&trades).unwrap();

        for value in [
            stats.total_pnl,
            stats.gross_profit,
            stats.gross_loss,
            stats.profit_factor,
            stats.avg_win,
            stats.avg_loss,
            stats.expectancy,
            stats.max_drawdown,
        ] {
            assert!(value.is_finite(), "{:?}", stats);
        }
        assert_eq!(stats.gross_profit, f64::MAX);
        assert!(stats.max_drawdown > 0.0);

        let series = drawdown_series(&trades);
        assert!(series.iter().all(|p| p.cumulative_pnl.is_finite() && p.drawdown.is_finite()));
        assert_eq!(series[1].peak, f64::MAX);

        let curve = equity_curve(&trades, f64::MAX);
        assert!(curve.iter().all(|p| p.balance.is_finite() && p.cumulative_pnl.is_finite()));
    }

    #[test]
    fn test_finite_helpers() {
        assert_eq!(finite(f64::INFINITY), f64::MAX);
        assert_eq!(finite(f64::NEG_INFINITY), f64::MIN);
        assert_eq!(finite(f64::NAN), 0.0);
        assert_eq!(saturating_add(f64::MAX, f64::MAX), f64::MAX);
        assert_eq!(saturating_add(1.5, 2.0), 3.5);
    }

    #[test]
    fn test_win_rate_of_subset() {
        let trades = vec![
            trade("a", "2024-01-01", 10.0),
            trade("b", "2024-01-01", -10.0),
            trade("c", "2024-01-01", 10.0),
            trade("d", "2024-01-01", 0.0),
        ];
        assert_eq!(win_rate(&trades), 50.0);
        assert_close(win_rate(trades.iter().filter(|t| t.pnl_value() != 0.0)), 66.67);
        assert_eq!(win_rate(std::iter::empty::<&Trade>()), 0.0);
    }
}
