use serde::{Deserialize, Serialize};

use super::lenient;
use super::settings::Settings;
use super::trade::Trade;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub opening_balance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

/// Setup template: the checklist and 4H profile offered on the entry form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub checklist: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub profile_4h: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub drivers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mistake {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub color: String,
}

/// Everything the analytics need, read from the store in one go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalSnapshot {
    pub settings: Settings,
    pub accounts: Vec<Account>,
    pub templates: Vec<Template>,
    pub mistakes: Vec<Mistake>,
    pub trades: Vec<Trade>,
}

/// Entities that carry an `is_default` flag.
pub trait DefaultFlag {
    fn is_default(&self) -> bool;
    fn set_default(&mut self, value: bool);
}

impl DefaultFlag for Account {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

impl DefaultFlag for Template {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

/// Keep at most one default: the first flagged entry wins.
///
/// Returns how many extra flags were cleared.
pub fn normalize_default<T: DefaultFlag>(items: &mut [T]) -> usize {
    let mut seen = false;
    let mut cleared = 0;
    for item in items.iter_mut() {
        if item.is_default() {
            if seen {
                item.set_default(false);
                cleared += 1;
            } else {
                seen = true;
            }
        }
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, is_default: bool) -> Account {
        Account {
            id: id.to_string(),
            name: id.to_uppercase(),
            opening_balance: Some(1000.0),
            is_default,
        }
    }

    #[test]
    fn test_normalize_default_keeps_first() {
        let mut accounts = vec![account("a", false), account("b", true), account("c", true)];
        let cleared = normalize_default(&mut accounts);

        assert_eq!(cleared, 1);
        assert!(!accounts[0].is_default);
        assert!(accounts[1].is_default);
        assert!(!accounts[2].is_default);
    }

    #[test]
    fn test_normalize_default_without_flags() {
        let mut accounts = vec![account("a", false), account("b", false)];
        assert_eq!(normalize_default(&mut accounts), 0);
        assert!(accounts.iter().all(|a| !a.is_default));
    }

    #[test]
    fn test_template_decoding_tolerates_missing_lists() {
        let template: Template =
            serde_json::from_str(r#"{"id": 7, "name": "Breakout", "checklist": null}"#).unwrap();
        assert_eq!(template.id, "7");
        assert!(template.checklist.is_empty());
        assert!(template.profile_4h.is_empty());
    }
}
