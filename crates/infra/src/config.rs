use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Calendar bucket used when fingerprinting occurrences that have none
    pub default_calendar_id: String,
    /// How long a preferred scope picked in one interaction stays valid for
    /// the next interaction with the same occurrence.
    pub scope_hint_ttl_millis: i64,
    /// Minimum number of loaded series members before a rule is inferred.
    /// Values below 2 behave like 2 since a single occurrence has no gaps.
    pub inference_min_occurrences: usize,
    /// Zone used to read weekdays and days of month for labels, inference
    /// and series moves
    pub default_timezone: Tz,
}

impl Config {
    pub fn new() -> Self {
        Self {
            default_calendar_id: "default".into(),
            scope_hint_ttl_millis: 1500,
            inference_min_occurrences: 2,
            default_timezone: Tz::UTC,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
