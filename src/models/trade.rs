use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// Unknown values decode as long, matching how the entry form defaults.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("short") {
            Direction::Short
        } else {
            Direction::Long
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(Direction::from_label)
            .unwrap_or_default())
    }
}

/// Win/loss classification. Always derived from the sign of pnl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Breakeven => "breakeven",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Poor,
    Bad,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Poor => "poor",
            Mood::Bad => "bad",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "excellent" => Some(Mood::Excellent),
            "good" => Some(Mood::Good),
            "neutral" => Some(Mood::Neutral),
            "poor" => Some(Mood::Poor),
            "bad" => Some(Mood::Bad),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Mood::Excellent | Mood::Good)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Mood::Poor | Mood::Bad)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Yes,
    Partial,
    No,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Yes => "yes",
            Discipline::Partial => "partial",
            Discipline::No => "no",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Discipline::Yes),
            "partial" => Some(Discipline::Partial),
            "no" => Some(Discipline::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreTrade {
    #[serde(default, deserialize_with = "lenient::optional_mood")]
    pub mood: Option<Mood>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub stress: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub sleep: Option<f64>,
    #[serde(default, deserialize_with = "lenient::checklist")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "lenient::checklist")]
    pub profile_4h: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostTrade {
    #[serde(default, deserialize_with = "lenient::optional_discipline")]
    pub discipline: Option<Discipline>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub emotions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub mistake_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Psychology {
    #[serde(default)]
    pub pre_trade: Option<PreTrade>,
    #[serde(default)]
    pub post_trade: Option<PostTrade>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub symbol: String,
    #[serde(default)]
    pub direction: Direction,

    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub entry: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub exit: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub stop: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub size: Option<f64>,

    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub pnl: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub result: Option<String>, // stored label only, pnl decides classification
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub r_multiple: Option<f64>,

    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub psychology: Option<Psychology>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub notes: String,

    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: i64,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

impl Trade {
    pub fn pnl_value(&self) -> f64 {
        self.pnl.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    pub fn outcome(&self) -> Outcome {
        let pnl = self.pnl_value();
        if pnl > 0.0 {
            Outcome::Win
        } else if pnl < 0.0 {
            Outcome::Loss
        } else {
            Outcome::Breakeven
        }
    }

    pub fn is_win(&self) -> bool {
        self.outcome() == Outcome::Win
    }

    /// Calendar date of the trade. Accepts `YYYY-MM-DD` with any trailing time part.
    pub fn trade_date(&self) -> Option<NaiveDate> {
        let day = self.date.trim().get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn entry_price(&self) -> Option<f64> {
        positive(self.entry)
    }

    pub fn exit_price(&self) -> Option<f64> {
        positive(self.exit)
    }

    pub fn stop_price(&self) -> Option<f64> {
        positive(self.stop)
    }

    pub fn target_price(&self) -> Option<f64> {
        positive(self.target)
    }

    pub fn pre_trade(&self) -> Option<&PreTrade> {
        self.psychology.as_ref()?.pre_trade.as_ref()
    }

    pub fn post_trade(&self) -> Option<&PostTrade> {
        self.psychology.as_ref()?.post_trade.as_ref()
    }

    pub fn mistake_ids(&self) -> &[String] {
        self.post_trade().map(|p| p.mistake_ids.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "year")]
    Year,
}

impl DateRange {
    /// Number of days the window reaches back from today, `None` for all time.
    pub fn days_back(&self) -> Option<i64> {
        match self {
            DateRange::All => None,
            DateRange::Today => Some(0),
            DateRange::Week => Some(7),
            DateRange::Month => Some(30),
            DateRange::ThreeMonths => Some(90),
            DateRange::SixMonths => Some(180),
            DateRange::Year => Some(365),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFilter {
    pub account_id: Option<String>,
    pub direction: Option<Direction>,
    #[serde(default)]
    pub date_range: DateRange,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
