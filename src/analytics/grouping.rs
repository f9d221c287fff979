use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::AnalyticsConfig;
use super::stats::saturating_add;
use super::targets::planned_r;
use crate::models::{Account, Mistake, Outcome, Template, Trade};

pub const NO_TEMPLATE_KEY: &str = "none";
pub const NO_TEMPLATE_LABEL: &str = "No Template";
pub const UNASSIGNED_ACCOUNT_KEY: &str = "unassigned";
pub const UNASSIGNED_ACCOUNT_LABEL: &str = "Unassigned";

pub const RR_LOW_KEY: &str = "<=1";
pub const RR_MID_KEY: &str = "1-2";
pub const RR_HIGH_KEY: &str = ">2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub key: String,
    pub label: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub avg_pnl: f64,
}

#[derive(Default)]
struct Bucket {
    trades: usize,
    wins: usize,
    losses: usize,
    total_pnl: f64,
}

/// Group trades under every key `key_fn` yields for them.
///
/// A trade may land in several buckets (one per distinct key) or in none.
/// Buckets are ordered by trade count, largest first; equal counts keep the
/// order in which their key was first seen.
pub fn group_by<F, K>(
    trades: &[Trade],
    key_fn: F,
    labels: &HashMap<String, String>,
) -> Vec<GroupStat>
where
    F: Fn(&Trade) -> K,
    K: IntoIterator<Item = String>,
{
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Bucket> = HashMap::new();

    for trade in trades {
        let mut keys: Vec<String> = Vec::new();
        for key in key_fn(trade) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        for key in keys {
            let bucket = buckets.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                Bucket::default()
            });
            bucket.trades += 1;
            bucket.total_pnl = saturating_add(bucket.total_pnl, trade.pnl_value());
            match trade.outcome() {
                Outcome::Win => bucket.wins += 1,
                Outcome::Loss => bucket.losses += 1,
                Outcome::Breakeven => {}
            }
        }
    }

    let mut groups: Vec<GroupStat> = order
        .into_iter()
        .filter_map(|key| {
            let bucket = buckets.remove(&key)?;
            if bucket.trades == 0 {
                return None;
            }
            let count = bucket.trades as f64;
            Some(GroupStat {
                label: labels.get(&key).cloned().unwrap_or_else(|| key.clone()),
                key,
                trades: bucket.trades,
                wins: bucket.wins,
                losses: bucket.losses,
                total_pnl: bucket.total_pnl,
                win_rate: bucket.wins as f64 / count * 100.0,
                avg_pnl: bucket.total_pnl / count,
            })
        })
        .collect();

    groups.sort_by(|a, b| b.trades.cmp(&a.trades));
    groups
}

pub fn group_by_template(trades: &[Trade], templates: &[Template]) -> Vec<GroupStat> {
    let mut labels: HashMap<String, String> = templates
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    labels.insert(NO_TEMPLATE_KEY.to_string(), NO_TEMPLATE_LABEL.to_string());

    group_by(
        trades,
        |trade| {
            let key = match &trade.template_id {
                Some(id) if templates.iter().any(|t| &t.id == id) => id.clone(),
                _ => NO_TEMPLATE_KEY.to_string(),
            };
            Some(key)
        },
        &labels,
    )
}

pub fn group_by_mistake(trades: &[Trade], mistakes: &[Mistake]) -> Vec<GroupStat> {
    let labels: HashMap<String, String> = mistakes
        .iter()
        .map(|m| (m.id.clone(), m.label.clone()))
        .collect();

    group_by(trades, |trade| trade.mistake_ids().to_vec(), &labels)
}

pub fn group_by_profile_4h(trades: &[Trade]) -> Vec<GroupStat> {
    group_by(
        trades,
        |trade| {
            trade
                .pre_trade()
                .map(|pre| {
                    pre.profile_4h
                        .iter()
                        .filter(|item| item.checked && !item.text.trim().is_empty())
                        .map(|item| item.text.trim().to_string())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        },
        &HashMap::new(),
    )
}

pub fn rr_bucket(planned_r: f64, config: &AnalyticsConfig) -> &'static str {
    if planned_r <= config.rr_low_bound {
        RR_LOW_KEY
    } else if planned_r <= config.rr_high_bound {
        RR_MID_KEY
    } else {
        RR_HIGH_KEY
    }
}

/// Breakdown by planned reward:risk. Trades without a usable plan are left out.
pub fn group_by_risk_reward(trades: &[Trade], config: &AnalyticsConfig) -> Vec<GroupStat> {
    let labels: HashMap<String, String> = [
        (RR_LOW_KEY, format!("≤ {}:1", config.rr_low_bound)),
        (RR_MID_KEY, format!("{}:1 – {}:1", config.rr_low_bound, config.rr_high_bound)),
        (RR_HIGH_KEY, format!("> {}:1", config.rr_high_bound)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    group_by(
        trades,
        |trade| planned_r(trade).map(|r| rr_bucket(r, config).to_string()),
        &labels,
    )
}

pub fn group_by_account(trades: &[Trade], accounts: &[Account]) -> Vec<GroupStat> {
    let mut labels: HashMap<String, String> = accounts
        .iter()
        .map(|a| (a.id.clone(), a.name.clone()))
        .collect();
    labels.insert(
        UNASSIGNED_ACCOUNT_KEY.to_string(),
        UNASSIGNED_ACCOUNT_LABEL.to_string(),
    );

    group_by(
        trades,
        |trade| {
            Some(
                trade
                    .account_id
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED_ACCOUNT_KEY.to_string()),
            )
        },
        &labels,
    )
}

pub fn group_by_direction(trades: &[Trade]) -> Vec<GroupStat> {
    let labels: HashMap<String, String> = [("long", "Long"), ("short", "Short")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    group_by(trades, |trade| Some(trade.direction.as_str().to_string()), &labels)
}

pub fn group_by_emotion(trades: &[Trade]) -> Vec<GroupStat> {
    group_by(
        trades,
        |trade| {
            trade
                .post_trade()
                .map(|post| post.emotions.clone())
                .unwrap_or_default()
        },
        &HashMap::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChecklistItem, Direction, PostTrade, PreTrade, Psychology};

    fn trade(id: &str, pnl: f64) -> Trade {
        Trade {
            id: id.to_string(),
            date: "2024-01-01".to_string(),
            pnl: Some(pnl),
            ..Default::default()
        }
    }

    fn with_mistakes(mut t: Trade, ids: &[&str]) -> Trade {
        t.psychology = Some(Psychology {
            pre_trade: None,
            post_trade: Some(PostTrade {
                mistake_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
        });
        t
    }

    fn mistake(id: &str, label: &str) -> Mistake {
        Mistake {
            id: id.to_string(),
            label: label.to_string(),
            color: "#ff0000".to_string(),
        }
    }

    #[test]
    fn test_group_by_template_with_unknown_bucket() {
        let templates = vec![Template {
            id: "tpl-1".to_string(),
            name: "Breakout".to_string(),
            ..Default::default()
        }];
        let mut trades = vec![
            trade("a", 10.0),
            trade("b", -5.0),
            trade("c", 20.0),
            trade("d", 0.0),
        ];
        trades[0].template_id = Some("tpl-1".to_string());
        trades[1].template_id = Some("tpl-1".to_string());
        trades[2].template_id = Some("deleted-template".to_string());

        let groups = group_by_template(&trades, &templates);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].key, "tpl-1");
        assert_eq!(groups[0].label, "Breakout");
        assert_eq!(groups[0].trades, 2);
        assert_eq!(groups[0].wins, 1);
        assert_eq!(groups[0].losses, 1);
        assert_eq!(groups[0].win_rate, 50.0);
        assert_eq!(groups[0].avg_pnl, 2.5);

        assert_eq!(groups[1].key, NO_TEMPLATE_KEY);
        assert_eq!(groups[1].label, NO_TEMPLATE_LABEL);
        assert_eq!(groups[1].trades, 2);
        assert_eq!(groups[1].total_pnl, 20.0);
    }

    #[test]
    fn test_mistakes_are_multi_membership() {
        let mistakes = vec![
            mistake("fomo", "FOMO entry"),
            mistake("early", "Early exit"),
            mistake("unused", "Never happens"),
        ];
        let trades = vec![
            with_mistakes(trade("a", -50.0), &["fomo", "early"]),
            with_mistakes(trade("b", 30.0), &["fomo"]),
            with_mistakes(trade("c", -10.0), &["fomo", "fomo"]),
            trade("d", 100.0),
        ];

        let groups = group_by_mistake(&trades, &mistakes);
        assert_eq!(groups.len(), 2, "zero-count vocabulary entries are dropped");

        assert_eq!(groups[0].key, "fomo");
        assert_eq!(groups[0].label, "FOMO entry");
        assert_eq!(groups[0].trades, 3);
        assert_eq!(groups[0].total_pnl, -30.0);

        assert_eq!(groups[1].key, "early");
        assert_eq!(groups[1].trades, 1);
        assert_eq!(groups[1].win_rate, 0.0);

        let memberships: usize = groups.iter().map(|g| g.trades).sum();
        assert!(memberships > 3, "a trade can sit in several buckets");
    }

    #[test]
    fn test_unknown_mistake_falls_back_to_key() {
        let trades = vec![with_mistakes(trade("a", -5.0), &["ghost"])];
        let groups = group_by_mistake(&trades, &[]);
        assert_eq!(groups[0].label, "ghost");
    }

    #[test]
    fn test_profile_4h_counts_checked_items_only() {
        let mut t = trade("a", 40.0);
        t.psychology = Some(Psychology {
            pre_trade: Some(PreTrade {
                profile_4h: vec![
                    ChecklistItem { text: "Above 200 EMA".into(), checked: true },
                    ChecklistItem { text: "Range bound".into(), checked: false },
                    ChecklistItem { text: "HTF trend up".into(), checked: true },
                ],
                ..Default::default()
            }),
            post_trade: None,
        });
        let trades = vec![t, trade("b", -10.0)];

        let groups = group_by_profile_4h(&trades);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Above 200 EMA", "HTF trend up"]);
        assert!(groups.iter().all(|g| g.trades == 1 && g.win_rate == 100.0));
    }

    #[test]
    fn test_sorted_by_count_with_stable_ties() {
        let mut trades = vec![trade("a", 1.0), trade("b", 1.0), trade("c", 1.0), trade("d", 1.0)];
        trades[0].direction = Direction::Short;
        trades[1].direction = Direction::Long;
        trades[2].direction = Direction::Long;
        trades[3].direction = Direction::Short;

        let groups = group_by_direction(&trades);
        assert_eq!(groups[0].key, "short");
        assert_eq!(groups[1].key, "long");

        trades.push(trade("e", -1.0));
        let groups = group_by_direction(&trades);
        assert_eq!(groups[0].key, "long");
        assert_eq!(groups[0].label, "Long");
        assert_eq!(groups[0].trades, 3);
    }

    #[test]
    fn test_risk_reward_buckets() {
        let plan = |id: &str, target: f64, pnl: f64| Trade {
            entry: Some(100.0),
            stop: Some(90.0),
            target: Some(target),
            exit: Some(105.0),
            ..trade(id, pnl)
        };
        let trades = vec![
            plan("low", 110.0, 10.0),    // 1.0R
            plan("mid", 115.0, -10.0),   // 1.5R
            plan("mid2", 120.0, 5.0),    // 2.0R
            plan("high", 130.0, 50.0),   // 3.0R
            plan("inverted", 95.0, 1.0), // target below entry on a long
            trade("unplanned", 5.0),
        ];

        let groups = group_by_risk_reward(&trades, &AnalyticsConfig::default());
        let summary: Vec<(&str, usize)> =
            groups.iter().map(|g| (g.key.as_str(), g.trades)).collect();
        assert_eq!(summary, vec![(RR_MID_KEY, 2), (RR_LOW_KEY, 1), (RR_HIGH_KEY, 1)]);
        assert_eq!(groups[0].win_rate, 50.0);
        assert_eq!(groups[2].label, "> 2:1");
    }

    #[test]
    fn test_group_by_account_and_emotion() {
        let accounts = vec![Account {
            id: "acc-1".into(),
            name: "Main".into(),
            opening_balance: Some(5000.0),
            is_default: true,
        }];
        let mut trades = vec![trade("a", 10.0), trade("b", -10.0)];
        trades[0].account_id = Some("acc-1".into());
        trades[1].psychology = Some(Psychology {
            pre_trade: None,
            post_trade: Some(PostTrade {
                emotions: vec!["fear".into(), "greed".into()],
                ..Default::default()
            }),
        });

        let by_account = group_by_account(&trades, &accounts);
        assert_eq!(by_account[0].label, "Main");
        assert_eq!(by_account[1].label, UNASSIGNED_ACCOUNT_LABEL);

        let by_emotion = group_by_emotion(&trades);
        assert_eq!(by_emotion.len(), 2);
        assert!(by_emotion.iter().all(|g| g.losses == 1));
    }

    #[test]
    fn test_grouping_is_repeatable_and_leaves_input_alone() {
        let trades = vec![
            with_mistakes(trade("a", 10.0), &["late", "size"]),
            with_mistakes(trade("b", -5.0), &["size"]),
            trade("c", 1e308),
            with_mistakes(trade("d", 1e308), &["late"]),
        ];
        let before = trades.clone();
        let mistakes = [mistake("late", "Late entry"), mistake("size", "Oversized")];

        let first = group_by_mistake(&trades, &mistakes);
        assert_eq!(first, group_by_mistake(&trades, &mistakes));
        assert_eq!(group_by_template(&trades, &[]), group_by_template(&trades, &[]));
        assert_eq!(trades, before);
        assert!(first.iter().all(|g| g.total_pnl.is_finite() && g.avg_pnl.is_finite()));
    }

    #[test]
    fn test_empty_input_gives_no_groups() {
        assert!(group_by_mistake(&[], &[mistake("a", "A")]).is_empty());
        assert!(group_by_template(&[], &[]).is_empty());
    }
}
