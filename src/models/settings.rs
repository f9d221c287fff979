use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub currency: String,
    pub initial_capital: f64,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            initial_capital: 10000.0,
            analytics: AnalyticsConfig::default(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub currency: Option<String>,
    pub initial_capital: Option<f64>,
    pub analytics: Option<AnalyticsConfig>,
}
