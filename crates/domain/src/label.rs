use crate::recurrence::{RecurrenceFrequency, RecurrenceRule, Termination};
use chrono::{prelude::*, Month};

pub const DOES_NOT_REPEAT: &str = "Does not repeat";
pub const PART_OF_SERIES: &str = "Part of recurring series";

impl RecurrenceRule {
    /// Human readable description of the rule. Weekdays, days and months the
    /// rule leaves implicit are taken from `anchor`.
    pub fn describe<T: TimeZone>(&self, anchor: &DateTime<T>) -> String {
        let phrase = match &self.frequency {
            RecurrenceFrequency::Daily => every(self.interval, "day"),
            RecurrenceFrequency::Weekly { weekdays } => {
                let days = if weekdays.is_empty() {
                    weekday_name(anchor.weekday()).to_string()
                } else {
                    weekdays
                        .iter()
                        .map(|d| weekday_name(*d))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                format!("{} on {}", every(self.interval, "week"), days)
            }
            RecurrenceFrequency::Monthly { month_day } => format!(
                "{} on day {}",
                every(self.interval, "month"),
                month_day.unwrap_or_else(|| anchor.day())
            ),
            RecurrenceFrequency::Yearly { month, month_day } => format!(
                "{} on {} {}",
                every(self.interval, "year"),
                month_name(month.unwrap_or_else(|| anchor.month())),
                month_day.unwrap_or_else(|| anchor.day())
            ),
        };

        match self.termination {
            Termination::Never => phrase,
            Termination::Until(date) => format!(
                "{} until {} {}",
                phrase,
                month_name(date.month()),
                date.day()
            ),
            Termination::Count(count) => format!("{} ({} times)", phrase, count),
        }
    }
}

/// Display string for the rule text of an occurrence. Text that does not
/// decode is treated as no rule, `series_fallback` tells whether the
/// occurrence is known to belong to a series anyway.
pub fn label<T: TimeZone>(
    rule_text: Option<&str>,
    anchor: &DateTime<T>,
    series_fallback: bool,
) -> String {
    match rule_text.and_then(RecurrenceRule::decode) {
        Some(rule) => rule.describe(anchor),
        None if series_fallback => PART_OF_SERIES.into(),
        None => DOES_NOT_REPEAT.into(),
    }
}

fn every(interval: u32, unit: &str) -> String {
    if interval <= 1 {
        format!("Every {}", unit)
    } else {
        format!("Every {} {}s", interval, unit)
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| &m.name()[..3])
        .unwrap_or("?")
}
