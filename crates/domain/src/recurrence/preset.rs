use super::{normalize_weekdays, FrequencyKind, RecurrenceFrequency, RecurrenceRule, Termination};
use chrono::{prelude::*, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The quick choices offered next to a custom rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurrencePreset {
    DoesNotRepeat,
    Daily,
    /// Weekly on the anchor weekday
    Weekly,
    /// Monday to Friday
    Weekdays,
    /// Monthly on the anchor day of month
    Monthly,
    /// Yearly on the anchor month and day
    Yearly,
}

impl RecurrencePreset {
    pub fn all() -> [Self; 6] {
        [
            Self::DoesNotRepeat,
            Self::Daily,
            Self::Weekly,
            Self::Weekdays,
            Self::Monthly,
            Self::Yearly,
        ]
    }

    pub fn rule<T: TimeZone>(&self, anchor: &DateTime<T>) -> Option<RecurrenceRule> {
        let frequency = match self {
            Self::DoesNotRepeat => return None,
            Self::Daily => RecurrenceFrequency::Daily,
            Self::Weekly => RecurrenceFrequency::weekly(vec![anchor.weekday()]),
            Self::Weekdays => RecurrenceFrequency::weekly(vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
            Self::Monthly => RecurrenceFrequency::Monthly {
                month_day: Some(anchor.day()),
            },
            Self::Yearly => RecurrenceFrequency::Yearly {
                month: Some(anchor.month()),
                month_day: Some(anchor.day()),
            },
        };
        Some(RecurrenceRule::new(frequency, 1, Termination::Never))
    }

    /// The preset a rule corresponds to, if any
    pub fn matching<T: TimeZone>(rule: Option<&RecurrenceRule>, anchor: &DateTime<T>) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|preset| preset.rule(anchor).as_ref() == rule)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftEnd {
    Never,
    OnDate,
    AfterCount,
}

/// State of the custom recurrence editor. The editor keeps both `until` and
/// `count` around while the user switches `end`, only the one selected by
/// `end` makes it into the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceDraft {
    pub frequency: FrequencyKind,
    pub interval: u32,
    pub weekdays: Vec<Weekday>,
    pub end: DraftEnd,
    pub until: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl RecurrenceDraft {
    pub fn new(frequency: FrequencyKind) -> Self {
        Self {
            frequency,
            interval: 1,
            weekdays: Vec::new(),
            end: DraftEnd::Never,
            until: None,
            count: None,
        }
    }

    pub fn from_rule(rule: &RecurrenceRule) -> Self {
        let mut draft = Self::new(rule.frequency.kind());
        draft.interval = rule.interval;
        if let RecurrenceFrequency::Weekly { weekdays } = &rule.frequency {
            draft.weekdays = weekdays.clone();
        }
        match rule.termination {
            Termination::Never => {}
            Termination::Until(until) => {
                draft.end = DraftEnd::OnDate;
                draft.until = Some(until);
            }
            Termination::Count(count) => {
                draft.end = DraftEnd::AfterCount;
                draft.count = Some(count);
            }
        }
        draft
    }

    pub fn into_rule<T: TimeZone>(self, anchor: &DateTime<T>) -> RecurrenceRule {
        let frequency = match self.frequency {
            FrequencyKind::Daily => RecurrenceFrequency::Daily,
            FrequencyKind::Weekly => {
                let weekdays = normalize_weekdays(self.weekdays);
                if weekdays.is_empty() {
                    RecurrenceFrequency::weekly(vec![anchor.weekday()])
                } else {
                    RecurrenceFrequency::Weekly { weekdays }
                }
            }
            FrequencyKind::Monthly => RecurrenceFrequency::Monthly {
                month_day: Some(anchor.day()),
            },
            FrequencyKind::Yearly => RecurrenceFrequency::Yearly {
                month: Some(anchor.month()),
                month_day: Some(anchor.day()),
            },
        };

        let termination = match self.end {
            DraftEnd::Never => Termination::Never,
            DraftEnd::OnDate => self
                .until
                .map(|until| Termination::Until(encodable(until)))
                .unwrap_or(Termination::Never),
            DraftEnd::AfterCount => self
                .count
                .filter(|count| *count > 0)
                .map(Termination::Count)
                .unwrap_or(Termination::Never),
        };

        RecurrenceRule::new(frequency, self.interval, termination)
    }
}

/// Keeps an end date within the four digit years an UNTIL value is written with
fn encodable(date: NaiveDate) -> NaiveDate {
    let date = NaiveDate::from_ymd_opt(0, 1, 1).map_or(date, |first| date.max(first));
    NaiveDate::from_ymd_opt(9999, 12, 31).map_or(date, |last| date.min(last))
}
