use serde::{Deserialize, Serialize};

/// Profit factor reported when there are winners but no losers yet.
pub const PROFIT_FACTOR_NO_LOSSES: f64 = 999.0;

pub const MIN_PSYCHOLOGY_TRADES: usize = 5;
pub const MIN_COHORT_SIZE: usize = 3;

pub const RESTED_SLEEP_HOURS: f64 = 7.0;
pub const TIRED_SLEEP_HOURS: f64 = 6.0;
pub const HIGH_CONFIDENCE: f64 = 8.0;
pub const LOW_CONFIDENCE: f64 = 4.0;
pub const LOW_STRESS: f64 = 3.0;
pub const HIGH_STRESS: f64 = 7.0;

pub const SLEEP_GAP: f64 = 10.0;
pub const CONFIDENCE_GAP: f64 = 10.0;
pub const STRESS_GAP: f64 = 15.0;
pub const DISCIPLINE_GAP: f64 = 10.0;
pub const MOOD_GAP: f64 = 10.0;
pub const CHECKLIST_GAP: f64 = 10.0;

pub const MAX_INSIGHTS: usize = 5;

pub const RR_LOW_BOUND: f64 = 1.0;
pub const RR_HIGH_BOUND: f64 = 2.0;

/// Tunable thresholds for the psychology and risk:reward breakdowns.
///
/// Persisted as JSON in the settings row; missing fields fall back to the
/// constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub min_psychology_trades: usize,
    pub min_cohort_size: usize,

    pub rested_sleep_hours: f64,
    pub tired_sleep_hours: f64,
    pub high_confidence: f64,
    pub low_confidence: f64,
    pub low_stress: f64,
    pub high_stress: f64,

    pub sleep_gap: f64,
    pub confidence_gap: f64,
    pub stress_gap: f64,
    pub discipline_gap: f64,
    pub mood_gap: f64,
    pub checklist_gap: f64,

    pub max_insights: usize,

    pub rr_low_bound: f64,
    pub rr_high_bound: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_psychology_trades: MIN_PSYCHOLOGY_TRADES,
            min_cohort_size: MIN_COHORT_SIZE,
            rested_sleep_hours: RESTED_SLEEP_HOURS,
            tired_sleep_hours: TIRED_SLEEP_HOURS,
            high_confidence: HIGH_CONFIDENCE,
            low_confidence: LOW_CONFIDENCE,
            low_stress: LOW_STRESS,
            high_stress: HIGH_STRESS,
            sleep_gap: SLEEP_GAP,
            confidence_gap: CONFIDENCE_GAP,
            stress_gap: STRESS_GAP,
            discipline_gap: DISCIPLINE_GAP,
            mood_gap: MOOD_GAP,
            checklist_gap: CHECKLIST_GAP,
            max_insights: MAX_INSIGHTS,
            rr_low_bound: RR_LOW_BOUND,
            rr_high_bound: RR_HIGH_BOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnalyticsConfig =
            serde_json::from_str(r#"{"sleep_gap": 20.0, "max_insights": 2}"#).unwrap();
        assert_eq!(config.sleep_gap, 20.0);
        assert_eq!(config.max_insights, 2);
        assert_eq!(config.stress_gap, STRESS_GAP);
        assert_eq!(config.min_cohort_size, MIN_COHORT_SIZE);
    }
}
