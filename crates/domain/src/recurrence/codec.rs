use super::{
    normalize_weekdays, str_to_weekday, weekday_to_str, FrequencyKind, RecurrenceFrequency,
    RecurrenceRule, Termination,
};
use chrono::NaiveDate;
use std::collections::HashMap;

const RULE_PREFIX: &str = "RRULE:";

pub(super) fn decode(text: &str) -> Option<RecurrenceRule> {
    let fields = split_fields(strip_prefix(text.trim()));

    let kind = fields
        .get("FREQ")
        .and_then(|freq| FrequencyKind::from_token(freq))?;

    let interval = fields
        .get("INTERVAL")
        .and_then(|v| parse_leading_int(v))
        .map(|i| u32::try_from(i.max(1)).unwrap_or(u32::MAX))
        .unwrap_or(1);

    let month_day = fields
        .get("BYMONTHDAY")
        .and_then(|v| parse_leading_int(v))
        .filter(|d| (1..=31).contains(d))
        .map(|d| d as u32);

    let frequency = match kind {
        FrequencyKind::Daily => RecurrenceFrequency::Daily,
        FrequencyKind::Weekly => {
            let weekdays = fields
                .get("BYDAY")
                .map(|days| days.split(',').filter_map(str_to_weekday).collect::<Vec<_>>())
                .unwrap_or_default();
            RecurrenceFrequency::weekly(weekdays)
        }
        FrequencyKind::Monthly => RecurrenceFrequency::Monthly { month_day },
        FrequencyKind::Yearly => RecurrenceFrequency::Yearly {
            month: fields
                .get("BYMONTH")
                .and_then(|v| parse_leading_int(v))
                .filter(|m| (1..=12).contains(m))
                .map(|m| m as u32),
            month_day,
        },
    };

    let until = fields.get("UNTIL").and_then(|v| parse_until(v));
    let count = fields
        .get("COUNT")
        .and_then(|v| parse_leading_int(v))
        .filter(|c| *c >= 1)
        .and_then(|c| u32::try_from(c).ok());

    // RFC5545 forbids both, UNTIL takes precedence when a producer sends them anyway
    let termination = match (until, count) {
        (Some(until), _) => Termination::Until(until),
        (None, Some(count)) => Termination::Count(count),
        (None, None) => Termination::Never,
    };

    Some(RecurrenceRule {
        frequency,
        interval,
        termination,
    })
}

pub(super) fn encode(rule: &RecurrenceRule) -> String {
    let mut parts = vec![format!("FREQ={}", rule.frequency.kind().token())];

    if rule.interval > 1 {
        parts.push(format!("INTERVAL={}", rule.interval));
    }

    match &rule.frequency {
        RecurrenceFrequency::Daily => {}
        RecurrenceFrequency::Weekly { weekdays } => {
            if !weekdays.is_empty() {
                let days = normalize_weekdays(weekdays.iter().copied())
                    .into_iter()
                    .map(weekday_to_str)
                    .collect::<Vec<_>>()
                    .join(",");
                parts.push(format!("BYDAY={}", days));
            }
        }
        RecurrenceFrequency::Monthly { month_day } => {
            if let Some(day) = month_day {
                parts.push(format!("BYMONTHDAY={}", day));
            }
        }
        RecurrenceFrequency::Yearly { month, month_day } => {
            if let Some(month) = month {
                parts.push(format!("BYMONTH={}", month));
            }
            if let Some(day) = month_day {
                parts.push(format!("BYMONTHDAY={}", day));
            }
        }
    }

    match rule.termination {
        Termination::Never => {}
        // Widened to the end of the day so external calendars include the last date
        Termination::Until(date) => parts.push(format!("UNTIL={}T235959Z", date.format("%Y%m%d"))),
        Termination::Count(count) => parts.push(format!("COUNT={}", count)),
    }

    parts.join(";")
}

fn strip_prefix(text: &str) -> &str {
    match text.get(..RULE_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(RULE_PREFIX) => &text[RULE_PREFIX.len()..],
        _ => text,
    }
}

/// Upper-cased keys to trimmed values, a repeated key keeps its last value
fn split_fields(body: &str) -> HashMap<String, String> {
    body.split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim().to_string()))
        .collect()
}

/// Parses the leading integer of `value`, so `"3"` and `"3x"` both give 3
/// while `"x3"` and `""` give `None`.
fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// `UNTIL` may be a date or a date-time, only the calendar date is kept
fn parse_until(value: &str) -> Option<NaiveDate> {
    let date = value.trim().get(..8)?;
    NaiveDate::parse_from_str(date, "%Y%m%d").ok()
}
