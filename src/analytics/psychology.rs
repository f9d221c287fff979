//! Psychology correlations.
//!
//! Each axis splits the journal into two cohorts by a pre- or post-trade
//! self-assessment and compares their win rates. Cohorts smaller than
//! `min_cohort_size` are not reported, and nothing is reported at all until
//! `min_psychology_trades` trades carry a pre-trade record.

use serde::{Deserialize, Serialize};

use super::config::AnalyticsConfig;
use super::stats::win_rate;
use crate::models::{ChecklistItem, Discipline, PreTrade, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychAxis {
    Sleep,
    Confidence,
    Stress,
    Mood,
    Discipline,
    Checklist,
}

impl PsychAxis {
    pub fn title(&self) -> &'static str {
        match self {
            PsychAxis::Sleep => "Sleep Quality",
            PsychAxis::Confidence => "Confidence Level",
            PsychAxis::Stress => "Stress Level",
            PsychAxis::Mood => "Mood",
            PsychAxis::Discipline => "Plan Discipline",
            PsychAxis::Checklist => "Checklist Adherence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStat {
    pub label: String,
    pub trades: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub axis: PsychAxis,
    pub title: String,
    pub cohorts: Vec<CohortStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    RestHelps,
    Overconfidence,
    ConfidenceHelps,
    StressHurts,
    DisciplinePays,
    MoodMatters,
    ChecklistPays,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub axis: PsychAxis,
    pub verdict: Verdict,
    /// Win-rate points between the two cohorts, always positive.
    pub gap: f64,
    pub favored: CohortStat,
    pub compared: CohortStat,
}

struct Cohort<'a> {
    label: String,
    trades: Vec<&'a Trade>,
}

impl<'a> Cohort<'a> {
    fn collect<F>(label: String, trades: &[&'a Trade], pred: F) -> Self
    where
        F: Fn(&Trade) -> bool,
    {
        Self {
            label,
            trades: trades.iter().copied().filter(|t| pred(t)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.trades.len()
    }

    fn stat(&self) -> CohortStat {
        CohortStat {
            label: self.label.clone(),
            trades: self.trades.len(),
            win_rate: win_rate(self.trades.iter().copied()),
        }
    }
}

/// Two sides of an axis plus the optional middle band (confidence only).
struct Split<'a> {
    axis: PsychAxis,
    a: Cohort<'a>,
    b: Cohort<'a>,
    middle: Option<Cohort<'a>>,
}

fn pre_number(trade: &Trade, pick: fn(&PreTrade) -> Option<f64>) -> Option<f64> {
    trade.pre_trade().and_then(pick)
}

fn sleep_split<'a>(trades: &[&'a Trade], config: &AnalyticsConfig) -> Split<'a> {
    let sleep = |t: &Trade| pre_number(t, |p| p.sleep);
    Split {
        axis: PsychAxis::Sleep,
        a: Cohort::collect(format!("{}+ hours", config.rested_sleep_hours), trades, |t| {
            sleep(t).is_some_and(|h| h >= config.rested_sleep_hours)
        }),
        b: Cohort::collect(format!("Under {} hours", config.tired_sleep_hours), trades, |t| {
            sleep(t).is_some_and(|h| h < config.tired_sleep_hours)
        }),
        middle: None,
    }
}

fn confidence_split<'a>(trades: &[&'a Trade], config: &AnalyticsConfig) -> Split<'a> {
    let confidence = |t: &Trade| pre_number(t, |p| p.confidence);
    Split {
        axis: PsychAxis::Confidence,
        a: Cohort::collect(format!("High ({}+)", config.high_confidence), trades, |t| {
            confidence(t).is_some_and(|c| c >= config.high_confidence)
        }),
        b: Cohort::collect(format!("Low (≤{})", config.low_confidence), trades, |t| {
            confidence(t).is_some_and(|c| c <= config.low_confidence)
        }),
        middle: Some(Cohort::collect("Medium".to_string(), trades, |t| {
            confidence(t).is_some_and(|c| c > config.low_confidence && c < config.high_confidence)
        })),
    }
}

fn stress_split<'a>(trades: &[&'a Trade], config: &AnalyticsConfig) -> Split<'a> {
    let stress = |t: &Trade| pre_number(t, |p| p.stress);
    Split {
        axis: PsychAxis::Stress,
        a: Cohort::collect(format!("Low stress (≤{})", config.low_stress), trades, |t| {
            stress(t).is_some_and(|s| s <= config.low_stress)
        }),
        b: Cohort::collect(format!("High stress (≥{})", config.high_stress), trades, |t| {
            stress(t).is_some_and(|s| s >= config.high_stress)
        }),
        middle: None,
    }
}

fn mood_split<'a>(trades: &[&'a Trade]) -> Split<'a> {
    let mood = |t: &Trade| t.pre_trade().and_then(|p| p.mood);
    Split {
        axis: PsychAxis::Mood,
        a: Cohort::collect("Good mood".to_string(), trades, |t| {
            mood(t).is_some_and(|m| m.is_positive())
        }),
        b: Cohort::collect("Poor mood".to_string(), trades, |t| {
            mood(t).is_some_and(|m| m.is_negative())
        }),
        middle: None,
    }
}

fn discipline_split<'a>(trades: &[&'a Trade]) -> Split<'a> {
    let discipline = |t: &Trade| t.post_trade().and_then(|p| p.discipline);
    Split {
        axis: PsychAxis::Discipline,
        a: Cohort::collect("Followed plan".to_string(), trades, |t| {
            discipline(t) == Some(Discipline::Yes)
        }),
        b: Cohort::collect("Broke plan".to_string(), trades, |t| {
            discipline(t) == Some(Discipline::No)
        }),
        middle: None,
    }
}

fn checklist(trade: &Trade) -> Option<&[ChecklistItem]> {
    trade
        .pre_trade()
        .map(|p| p.checklist.as_slice())
        .filter(|items| !items.is_empty())
}

fn checklist_split<'a>(trades: &[&'a Trade]) -> Split<'a> {
    Split {
        axis: PsychAxis::Checklist,
        a: Cohort::collect("Checklist complete".to_string(), trades, |t| {
            checklist(t).is_some_and(|items| items.iter().all(|i| i.checked))
        }),
        b: Cohort::collect("Checklist incomplete".to_string(), trades, |t| {
            checklist(t).is_some_and(|items| items.iter().any(|i| !i.checked))
        }),
        middle: None,
    }
}

fn has_enough_samples(trades: &[Trade], config: &AnalyticsConfig) -> bool {
    let with_pre_trade = trades.iter().filter(|t| t.pre_trade().is_some()).count();
    if with_pre_trade < config.min_psychology_trades {
        log::debug!(
            "Psychology analysis needs {} trades with pre-trade data, have {}",
            config.min_psychology_trades,
            with_pre_trade
        );
        return false;
    }
    true
}

impl Split<'_> {
    fn comparable(&self, min: usize) -> bool {
        self.a.len() >= min && self.b.len() >= min
    }

    fn correlation(&self, min: usize) -> Option<Correlation> {
        if !self.comparable(min) {
            return None;
        }
        let mut cohorts = vec![self.a.stat()];
        if let Some(middle) = self.middle.as_ref().filter(|m| m.len() >= min) {
            cohorts.push(middle.stat());
        }
        cohorts.push(self.b.stat());

        Some(Correlation {
            axis: self.axis,
            title: self.axis.title().to_string(),
            cohorts,
        })
    }
}

/// Favored cohort must beat the compared one by strictly more than `threshold`.
fn verdict_if_gap(
    axis: PsychAxis,
    verdict: Verdict,
    favored: &Cohort,
    compared: &Cohort,
    threshold: f64,
    min: usize,
) -> Option<Insight> {
    if favored.len() < min || compared.len() < min {
        return None;
    }
    let favored = favored.stat();
    let compared = compared.stat();
    let gap = favored.win_rate - compared.win_rate;
    (gap > threshold).then(|| Insight {
        axis,
        verdict,
        gap,
        favored,
        compared,
    })
}

pub fn compute_correlations(trades: &[Trade]) -> Vec<Correlation> {
    compute_correlations_with(trades, &AnalyticsConfig::default())
}

pub fn compute_correlations_with(trades: &[Trade], config: &AnalyticsConfig) -> Vec<Correlation> {
    if !has_enough_samples(trades, config) {
        return Vec::new();
    }

    let all: Vec<&Trade> = trades.iter().collect();
    let min = config.min_cohort_size;

    [
        sleep_split(&all, config),
        confidence_split(&all, config),
        stress_split(&all, config),
        mood_split(&all),
        discipline_split(&all),
    ]
    .iter()
    .filter_map(|split| split.correlation(min))
    .collect()
}

pub fn compute_insights(trades: &[Trade]) -> Vec<Insight> {
    compute_insights_with(trades, &AnalyticsConfig::default())
}

pub fn compute_insights_with(trades: &[Trade], config: &AnalyticsConfig) -> Vec<Insight> {
    if !has_enough_samples(trades, config) {
        return Vec::new();
    }

    let all: Vec<&Trade> = trades.iter().collect();
    let min = config.min_cohort_size;
    let mut insights = Vec::new();

    let sleep = sleep_split(&all, config);
    insights.extend(verdict_if_gap(
        PsychAxis::Sleep,
        Verdict::RestHelps,
        &sleep.a,
        &sleep.b,
        config.sleep_gap,
        min,
    ));

    let confidence = confidence_split(&all, config);
    let overconfidence = confidence.middle.as_ref().and_then(|medium| {
        verdict_if_gap(
            PsychAxis::Confidence,
            Verdict::Overconfidence,
            medium,
            &confidence.a,
            config.confidence_gap,
            min,
        )
    });
    insights.extend(overconfidence.or_else(|| {
        verdict_if_gap(
            PsychAxis::Confidence,
            Verdict::ConfidenceHelps,
            &confidence.a,
            &confidence.b,
            config.confidence_gap,
            min,
        )
    }));

    let stress = stress_split(&all, config);
    insights.extend(verdict_if_gap(
        PsychAxis::Stress,
        Verdict::StressHurts,
        &stress.a,
        &stress.b,
        config.stress_gap,
        min,
    ));

    let discipline = discipline_split(&all);
    insights.extend(verdict_if_gap(
        PsychAxis::Discipline,
        Verdict::DisciplinePays,
        &discipline.a,
        &discipline.b,
        config.discipline_gap,
        min,
    ));

    let mood = mood_split(&all);
    insights.extend(verdict_if_gap(
        PsychAxis::Mood,
        Verdict::MoodMatters,
        &mood.a,
        &mood.b,
        config.mood_gap,
        min,
    ));

    let checklist = checklist_split(&all);
    insights.extend(verdict_if_gap(
        PsychAxis::Checklist,
        Verdict::ChecklistPays,
        &checklist.a,
        &checklist.b,
        config.checklist_gap,
        min,
    ));

    insights.truncate(config.max_insights);
    insights
}
