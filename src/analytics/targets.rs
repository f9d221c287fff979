use serde::{Deserialize, Serialize};

use super::stats::{finite, saturating_add};
use crate::models::{Direction, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStats {
    pub participating: usize,
    pub hits: usize,
    pub target_hit_rate: f64,
    /// Trades with a positive planned R, the ones averaged below.
    pub r_samples: usize,
    pub avg_planned_r: f64,
    pub avg_actual_r: f64,
    /// Actual over planned R as a percentage. Not clamped.
    pub execution_efficiency: f64,
}

impl TargetStats {
    /// Efficiency bounded to a 0-100 bar width.
    pub fn display_efficiency(&self) -> f64 {
        self.execution_efficiency.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RAccuracy {
    pub trade_id: String,
    pub target_hit: bool,
    pub planned_r: Option<f64>,
    pub actual_r: Option<f64>,
}

struct Plan {
    entry: f64,
    exit: f64,
    stop: f64,
    target: f64,
}

fn plan(trade: &Trade) -> Option<Plan> {
    Some(Plan {
        entry: trade.entry_price()?,
        exit: trade.exit_price()?,
        stop: trade.stop_price()?,
        target: trade.target_price()?,
    })
}

fn is_target_hit(direction: Direction, plan: &Plan) -> bool {
    match direction {
        Direction::Long => plan.exit >= plan.target,
        Direction::Short => plan.exit <= plan.target,
    }
}

/// (risk, reward) in price units, signed so that a sane plan has both positive.
fn risk_reward(direction: Direction, plan: &Plan) -> (f64, f64) {
    match direction {
        Direction::Long => (plan.entry - plan.stop, plan.target - plan.entry),
        Direction::Short => (plan.stop - plan.entry, plan.entry - plan.target),
    }
}

fn r_values(trade: &Trade, plan: &Plan) -> Option<(f64, f64)> {
    let (risk, reward) = risk_reward(trade.direction, plan);
    let risk = risk.abs();
    if risk == 0.0 {
        return None;
    }
    let planned = reward / risk;
    if planned <= 0.0 {
        return None;
    }
    Some((finite(planned), finite(trade.pnl_value() / risk)))
}

/// Planned reward:risk for a fully specified trade; `None` when any price is
/// missing, the stop sits on the entry, or the target is on the wrong side.
pub fn planned_r(trade: &Trade) -> Option<f64> {
    let plan = plan(trade)?;
    r_values(trade, &plan).map(|(planned, _)| planned)
}

pub fn r_accuracy(trade: &Trade) -> Option<RAccuracy> {
    let plan = plan(trade)?;
    let values = r_values(trade, &plan);
    Some(RAccuracy {
        trade_id: trade.id.clone(),
        target_hit: is_target_hit(trade.direction, &plan),
        planned_r: values.map(|(planned, _)| planned),
        actual_r: values.map(|(_, actual)| actual),
    })
}

pub fn compute_target_stats(trades: &[Trade]) -> Option<TargetStats> {
    let rows: Vec<RAccuracy> = trades.iter().filter_map(r_accuracy).collect();
    if rows.is_empty() {
        return None;
    }

    let participating = rows.len();
    let hits = rows.iter().filter(|r| r.target_hit).count();

    let samples: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.planned_r?, r.actual_r?)))
        .collect();
    let r_samples = samples.len();

    let (avg_planned_r, avg_actual_r) = if r_samples == 0 {
        (0.0, 0.0)
    } else {
        let n = r_samples as f64;
        (
            samples.iter().fold(0.0, |acc, (p, _)| saturating_add(acc, *p)) / n,
            samples.iter().fold(0.0, |acc, (_, a)| saturating_add(acc, *a)) / n,
        )
    };

    let execution_efficiency = if avg_planned_r > 0.0 {
        finite(avg_actual_r / avg_planned_r * 100.0)
    } else {
        0.0
    };

    Some(TargetStats {
        participating,
        hits,
        target_hit_rate: hits as f64 / participating as f64 * 100.0,
        r_samples,
        avg_planned_r,
        avg_actual_r,
        execution_efficiency,
    })
}
