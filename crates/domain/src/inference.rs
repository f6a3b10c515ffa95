//! Reconstructs a recurrence rule from the loaded members of a series when
//! no exemplar with rule text is available. The result is a display and
//! editing default only.

use crate::{
    occurrence::Occurrence,
    recurrence::{RecurrenceFrequency, RecurrenceRule, Termination},
};
use chrono::prelude::*;
use std::collections::BTreeMap;

pub const MIN_OCCURRENCES: usize = 2;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Infers the rule of the series `target` belongs to from `series`. Records
/// of other series in `series` are ignored, calendar fields are read in `tz`.
pub fn infer_rule<T: TimeZone>(
    target: &Occurrence,
    series: &[Occurrence],
    tz: &T,
) -> Option<RecurrenceRule> {
    let series_id = target.series_id.as_ref()?;
    let mut members = series
        .iter()
        .filter(|o| o.in_series(series_id))
        .collect::<Vec<_>>();
    if members.len() < MIN_OCCURRENCES {
        return None;
    }
    members.sort_by_key(|o| o.start_ts);

    let gap = dominant_gap(&members)?;
    let frequency = match gap {
        1 => RecurrenceFrequency::Daily,
        6..=8 => RecurrenceFrequency::weekly(
            members
                .iter()
                .filter_map(|o| o.start_in(tz))
                .map(|start| start.weekday()),
        ),
        27..=31 => RecurrenceFrequency::Monthly {
            month_day: Some(target.start_in(tz)?.day()),
        },
        _ => return None,
    };

    Some(RecurrenceRule::new(frequency, 1, Termination::Never))
}

/// Encoded form of [`infer_rule`]
pub fn infer<T: TimeZone>(target: &Occurrence, series: &[Occurrence], tz: &T) -> Option<String> {
    infer_rule(target, series, tz).map(|rule| RecurrenceRule::encode(Some(&rule)))
}

/// The most frequent gap in whole days between successive starts. Equally
/// frequent gaps resolve to the smallest one. Same day gaps count as 0, which
/// no frequency accepts.
fn dominant_gap(sorted: &[&Occurrence]) -> Option<i64> {
    let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in sorted.windows(2) {
        let days = ((pair[1].start_ts - pair[0].start_ts) as f64 / MILLIS_PER_DAY).round() as i64;
        *histogram.entry(days).or_default() += 1;
    }

    // Ascending keys, so only a strictly larger count replaces the best gap
    histogram
        .into_iter()
        .fold(None, |best: Option<(i64, usize)>, (gap, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((gap, count)),
        })
        .map(|(gap, _)| gap)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{occurrence::Origin, ID};
    use chrono_tz::{Europe::Oslo, Tz, UTC};

    const HOUR: i64 = 60 * 60 * 1000;
    const DAY: i64 = 24 * HOUR;

    fn series_of(series_id: ID, starts: &[i64]) -> Vec<Occurrence> {
        starts
            .iter()
            .map(|start| {
                let mut o = Occurrence::new("Gym", *start, start + HOUR, Origin::ExternalSync);
                o.series_id = Some(series_id);
                o
            })
            .collect()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis()
    }

    #[test]
    fn infers_weekly_from_tuesdays() {
        let first = ts(2024, 3, 5, 9);
        let series = series_of(ID::new(), &[first, first + 7 * DAY, first + 14 * DAY]);
        assert_eq!(
            infer(&series[1], &series, &UTC).as_deref(),
            Some("FREQ=WEEKLY;BYDAY=TU")
        );
    }

    #[test]
    fn infers_daily() {
        let first = ts(2024, 3, 5, 9);
        let series = series_of(ID::new(), &[first, first + DAY]);
        assert_eq!(infer(&series[0], &series, &UTC).as_deref(), Some("FREQ=DAILY"));
    }

    #[test]
    fn infers_monthly_on_target_day() {
        let series = series_of(
            ID::new(),
            &[ts(2024, 1, 15, 9), ts(2024, 2, 15, 9), ts(2024, 3, 15, 9)],
        );
        assert_eq!(
            infer(&series[2], &series, &UTC).as_deref(),
            Some("FREQ=MONTHLY;BYMONTHDAY=15")
        );
    }

    #[test]
    fn weekdays_are_read_in_the_given_zone() {
        // 23:30 UTC on a Monday is Tuesday in Oslo
        let first = ts(2024, 3, 4, 23) + 30 * 60 * 1000;
        let series = series_of(ID::new(), &[first, first + 7 * DAY]);
        assert_eq!(
            infer(&series[0], &series, &UTC).as_deref(),
            Some("FREQ=WEEKLY;BYDAY=MO")
        );
        let oslo: Tz = Oslo;
        assert_eq!(
            infer(&series[0], &series, &oslo).as_deref(),
            Some("FREQ=WEEKLY;BYDAY=TU")
        );
    }

    #[test]
    fn collects_every_observed_weekday() {
        // Mon, Wed, Mon, Wed: gaps 2, 5, 2 so the dominant gap is 2 days
        let mon = ts(2024, 3, 4, 9);
        let series = series_of(ID::new(), &[mon, mon + 2 * DAY, mon + 7 * DAY, mon + 9 * DAY]);
        assert_eq!(infer(&series[0], &series, &UTC), None);

        // Mon, Mon, Wed, Wed a week apart
        let series = series_of(ID::new(), &[mon, mon + 7 * DAY, mon + 16 * DAY, mon + 23 * DAY]);
        assert_eq!(
            infer(&series[0], &series, &UTC).as_deref(),
            Some("FREQ=WEEKLY;BYDAY=MO,WE")
        );
    }

    #[test]
    fn needs_two_members_of_the_same_series() {
        let first = ts(2024, 3, 5, 9);
        let series = series_of(ID::new(), &[first]);
        assert_eq!(infer(&series[0], &series, &UTC), None);

        let mut mixed = series.clone();
        mixed.extend(series_of(ID::new(), &[first + DAY]));
        assert_eq!(infer(&mixed[0], &mixed, &UTC), None);

        let mut bare = series[0].clone();
        bare.series_id = None;
        assert_eq!(infer(&bare, &series, &UTC), None);
        assert_eq!(infer(&series[0], &[], &UTC), None);
    }

    #[test]
    fn irregular_gaps_fail() {
        let first = ts(2024, 3, 5, 9);
        let series = series_of(ID::new(), &[first, first + 3 * DAY, first + 6 * DAY]);
        assert_eq!(infer(&series[0], &series, &UTC), None);
    }

    #[test]
    fn ties_resolve_to_the_smallest_gap() {
        // gaps 7 and 1 once each
        let first = ts(2024, 3, 5, 9);
        let series = series_of(ID::new(), &[first, first + 7 * DAY, first + 8 * DAY]);
        assert_eq!(infer(&series[0], &series, &UTC).as_deref(), Some("FREQ=DAILY"));
    }

    #[test]
    fn several_starts_a_day_fail() {
        // 09:00 and 17:00 on three days: gaps 0, 1, 0, 1, 0
        let first = ts(2024, 3, 5, 9);
        let starts = [0, 1, 2]
            .iter()
            .flat_map(|d| [first + d * DAY, first + d * DAY + 8 * HOUR])
            .collect::<Vec<_>>();
        let series = series_of(ID::new(), &starts);
        assert_eq!(infer(&series[0], &series, &UTC), None);

        let series = series_of(ID::new(), &[first, first]);
        assert_eq!(infer(&series[0], &series, &UTC), None);
    }

    #[test]
    fn an_occasional_same_day_gap_does_not_dominate() {
        let first = ts(2024, 3, 5, 9);
        let series = series_of(
            ID::new(),
            &[first, first + DAY, first + DAY + HOUR, first + 2 * DAY, first + 3 * DAY],
        );
        assert_eq!(infer(&series[0], &series, &UTC).as_deref(), Some("FREQ=DAILY"));
    }

    #[test]
    fn input_order_does_not_matter() {
        let first = ts(2024, 3, 5, 9);
        let mut series = series_of(ID::new(), &[first + 14 * DAY, first, first + 7 * DAY]);
        series.reverse();
        assert_eq!(
            infer(&series[0], &series, &UTC).as_deref(),
            Some("FREQ=WEEKLY;BYDAY=TU")
        );
    }
}
