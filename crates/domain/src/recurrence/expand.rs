use super::{RecurrenceFrequency, RecurrenceRule, Termination};
use crate::TimeSpan;
use chrono::{prelude::*, Duration};
use rrule::{RRuleSet, Tz};

/// The two halves of a series divided at a pivot occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSplit {
    /// Rule for the occurrences before the pivot, `None` when there are none
    pub head: Option<RecurrenceRule>,
    /// Rule for the pivot and everything after it, `None` when the series ends
    /// before the pivot
    pub tail: Option<RecurrenceRule>,
}

impl RecurrenceRule {
    fn rrule_set(&self, dtstart: DateTime<Utc>) -> Option<RRuleSet> {
        // rrule works on whole seconds
        let text = format!(
            "DTSTART:{}\nRRULE:{}",
            dtstart.format("%Y%m%dT%H%M%SZ"),
            self
        );
        text.parse::<RRuleSet>().ok()
    }

    /// Expands the rule anchored at `dtstart` in UTC. Rules the expander
    /// rejects (e.g. an `UNTIL` before `dtstart`) expand to nothing.
    pub fn occurrences(&self, dtstart: DateTime<Utc>, limit: u16) -> Vec<DateTime<Utc>> {
        match self.rrule_set(dtstart) {
            Some(set) => set
                .all(limit)
                .dates
                .into_iter()
                .map(|d| d.with_timezone(&Utc))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Occurrence starts inside `span`
    pub fn occurrences_between(&self, dtstart: DateTime<Utc>, span: &TimeSpan) -> Vec<DateTime<Utc>> {
        let Some((start, end)) = span.as_datetime() else {
            return Vec::new();
        };
        let Some(set) = self.rrule_set(dtstart) else {
            return Vec::new();
        };
        // `after` is exclusive
        set.after((start - Duration::seconds(1)).with_timezone(&Tz::UTC))
            .before(end.with_timezone(&Tz::UTC))
            .all(u16::MAX)
            .dates
            .into_iter()
            .map(|d| d.with_timezone(&Utc))
            .filter(|d| *d >= start && *d < end)
            .collect()
    }

    /// Number of occurrences strictly before `pivot`
    pub fn count_before(&self, dtstart: DateTime<Utc>, pivot: DateTime<Utc>) -> u32 {
        if pivot <= dtstart {
            return 0;
        }
        let Some(set) = self.rrule_set(dtstart) else {
            return 0;
        };
        let before = set
            .before(pivot.with_timezone(&Tz::UTC))
            .all(u16::MAX)
            .dates
            .into_iter()
            .filter(|d| d.with_timezone(&Utc) < pivot)
            .count();
        u32::try_from(before).unwrap_or(u32::MAX)
    }

    /// Divides the series anchored at `dtstart` so that the pivot occurrence
    /// starts a new series. The head keeps everything before the pivot.
    pub fn split_at(&self, dtstart: DateTime<Utc>, pivot: DateTime<Utc>) -> SeriesSplit {
        let before = self.count_before(dtstart, pivot);
        if before == 0 {
            return SeriesSplit {
                head: None,
                tail: Some(self.clone()),
            };
        }

        let pivot_date = pivot.date_naive();
        let head_until = pivot_date.pred_opt().unwrap_or(pivot_date);

        let (head, tail) = match self.termination {
            Termination::Never => (
                Termination::Until(head_until),
                Some(Termination::Never),
            ),
            Termination::Until(until) => (
                Termination::Until(until.min(head_until)),
                (until >= pivot_date).then_some(Termination::Until(until)),
            ),
            Termination::Count(count) => (
                Termination::Count(before.min(count)),
                count
                    .checked_sub(before)
                    .filter(|rest| *rest > 0)
                    .map(Termination::Count),
            ),
        };

        SeriesSplit {
            head: Some(self.clone().with_termination(head)),
            tail: tail.map(|t| self.clone().with_termination(t)),
        }
    }

    /// Re-anchors the rule after its series moved from `from` to `to`.
    /// Weekday tokens rotate by the number of days moved, explicit month days
    /// and months follow the new anchor.
    pub fn shifted<T: TimeZone>(&self, from: &DateTime<T>, to: &DateTime<T>) -> Self {
        let delta_days = (to.date_naive() - from.date_naive()).num_days();
        if delta_days == 0 {
            return self.clone();
        }

        let frequency = match &self.frequency {
            RecurrenceFrequency::Daily => RecurrenceFrequency::Daily,
            RecurrenceFrequency::Weekly { weekdays } => {
                let shift = delta_days.rem_euclid(7) as u32;
                RecurrenceFrequency::weekly(weekdays.iter().map(|day| {
                    (0..shift).fold(*day, |d, _| d.succ())
                }))
            }
            RecurrenceFrequency::Monthly { month_day } => RecurrenceFrequency::Monthly {
                month_day: month_day.map(|_| to.day()),
            },
            RecurrenceFrequency::Yearly { month, month_day } => RecurrenceFrequency::Yearly {
                month: month.map(|_| to.month()),
                month_day: month_day.map(|_| to.day()),
            },
        };

        Self {
            frequency,
            interval: self.interval,
            termination: self.termination,
        }
    }
}
