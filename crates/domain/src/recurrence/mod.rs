mod codec;
mod expand;
mod preset;

pub use expand::SeriesSplit;
pub use preset::{DraftEnd, RecurrenceDraft, RecurrencePreset};

use chrono::{NaiveDate, Weekday};
use itertools::Itertools;
use serde::{de::Visitor, Deserialize, Serialize};
use std::fmt::Display;

/// Frequency of a decoded rule. Fields that only make sense for one
/// frequency live on that variant, so e.g. a month on a weekly rule cannot
/// be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    Daily,
    /// An empty set means "the weekday of the anchor occurrence".
    Weekly { weekdays: Vec<Weekday> },
    /// `None` means "the day of month of the anchor occurrence".
    Monthly { month_day: Option<u32> },
    Yearly {
        month: Option<u32>,
        month_day: Option<u32>,
    },
}

impl RecurrenceFrequency {
    /// Weekly frequency with the weekday set deduplicated and sorted Monday first
    pub fn weekly<I: IntoIterator<Item = Weekday>>(weekdays: I) -> Self {
        Self::Weekly {
            weekdays: normalize_weekdays(weekdays),
        }
    }

    pub fn kind(&self) -> FrequencyKind {
        match self {
            Self::Daily => FrequencyKind::Daily,
            Self::Weekly { .. } => FrequencyKind::Weekly,
            Self::Monthly { .. } => FrequencyKind::Monthly,
            Self::Yearly { .. } => FrequencyKind::Yearly,
        }
    }
}

/// Frequency without its frequency specific fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FrequencyKind {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Sub-daily frequencies are not supported and map to `None`
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Never,
    /// Last calendar date on which an occurrence may start
    Until(NaiveDate),
    Count(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    pub termination: Termination,
}

impl RecurrenceRule {
    pub fn new(frequency: RecurrenceFrequency, interval: u32, termination: Termination) -> Self {
        Self {
            frequency,
            interval: interval.max(1),
            termination,
        }
    }

    pub fn daily() -> Self {
        Self::new(RecurrenceFrequency::Daily, 1, Termination::Never)
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Decodes rule text. Missing or unsupported `FREQ` gives `None`,
    /// which callers treat as "does not repeat".
    pub fn decode(text: &str) -> Option<Self> {
        codec::decode(text)
    }

    /// Encodes a rule, `None` encodes to the empty string
    pub fn encode(rule: Option<&Self>) -> String {
        rule.map(codec::encode).unwrap_or_default()
    }
}

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", codec::encode(self))
    }
}

pub(crate) fn normalize_weekdays<I: IntoIterator<Item = Weekday>>(weekdays: I) -> Vec<Weekday> {
    weekdays
        .into_iter()
        .sorted_by_key(|d| d.num_days_from_monday())
        .dedup()
        .collect()
}

pub(crate) fn str_to_weekday(d: &str) -> Option<Weekday> {
    match d.trim().to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

pub(crate) fn weekday_to_str(wday: Weekday) -> &'static str {
    match wday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

impl Serialize for RecurrenceRule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecurrenceRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RecurrenceRuleVisitor;

        impl<'de> Visitor<'de> for RecurrenceRuleVisitor {
            type Value = RecurrenceRule;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("A valid recurrence rule string")
            }

            fn visit_str<E>(self, value: &str) -> Result<RecurrenceRule, E>
            where
                E: serde::de::Error,
            {
                RecurrenceRule::decode(value)
                    .ok_or_else(|| E::custom(format!("Unsupported recurrence rule: {}", value)))
            }
        }

        deserializer.deserialize_str(RecurrenceRuleVisitor)
    }
}
