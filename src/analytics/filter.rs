use chrono::{Duration, NaiveDate};

use crate::models::{Trade, TradeFilter};

fn date_bounds(filter: &TradeFilter, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let range_start = filter
        .date_range
        .days_back()
        .map(|days| today - Duration::days(days));

    let start = match (range_start, filter.start_date) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    (start, filter.end_date)
}

/// Select the trades a dashboard view covers.
///
/// Date windows are measured back from `today`; when any date bound is active,
/// trades without a readable date are left out.
pub fn filter_trades<'a>(
    trades: &'a [Trade],
    filter: &TradeFilter,
    today: NaiveDate,
) -> Vec<&'a Trade> {
    let (start, end) = date_bounds(filter, today);
    let dated = start.is_some() || end.is_some();

    trades
        .iter()
        .filter(|t| match &filter.account_id {
            Some(account) => t.account_id.as_ref() == Some(account),
            None => true,
        })
        .filter(|t| filter.direction.is_none_or(|d| t.direction == d))
        .filter(|t| {
            if !dated {
                return true;
            }
            let Some(day) = t.trade_date() else {
                return false;
            };
            start.is_none_or(|s| day >= s) && end.is_none_or(|e| day <= e)
        })
        .collect()
}
