//! Recognizes records that describe the same real-world occurrence.
//!
//! Records for one occurrence can arrive several times: re-synced from the
//! external calendar, regenerated by the scheduler or edited locally. The
//! fingerprint groups them and the recency score picks the record to keep.

use crate::occurrence::{Occurrence, Origin};
use std::collections::HashMap;

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const NO_SOURCE: &str = "-";

/// How fresh a record is. Records that were never synced or updated score 0
/// and therefore lose against anything with a real timestamp.
pub fn recency_score(o: &Occurrence) -> i64 {
    o.last_synced_at.unwrap_or(0).max(o.updated.unwrap_or(0))
}

/// Dedupe key for an occurrence.
///
/// Synced records are keyed on their external identity and the minute of
/// their original start, so a recurring external appointment still collapses
/// with its re-synced copy after the user dragged it somewhere else.
pub fn fingerprint(o: &Occurrence, default_calendar_id: &str) -> String {
    match (&o.origin, &o.origin_id) {
        (Origin::ExternalSync, Some(origin_id)) => format!(
            "{}:{}:{}:{}",
            o.origin,
            o.calendar_id.as_deref().unwrap_or(default_calendar_id),
            origin_id,
            o.anchor_ts().div_euclid(MILLIS_PER_MINUTE)
        ),
        // Without an external identity two records with the same origin, time
        // and title are indistinguishable
        _ => format!(
            "{}:{}:{}:{}:{}",
            o.origin,
            o.source_id.as_deref().unwrap_or(NO_SOURCE),
            o.start_ts,
            o.end_ts,
            o.title
        ),
    }
}

/// Keeps the most recent record per fingerprint. Groups are returned in the
/// order their first record appeared, equally recent records keep the one
/// seen first.
pub fn dedupe(occurrences: Vec<Occurrence>, default_calendar_id: &str) -> Vec<Occurrence> {
    let mut kept: Vec<Occurrence> = Vec::with_capacity(occurrences.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::with_capacity(occurrences.len());

    for o in occurrences {
        let key = fingerprint(&o, default_calendar_id);
        match index_by_key.get(&key) {
            Some(&i) => {
                if recency_score(&o) > recency_score(&kept[i]) {
                    kept[i] = o;
                }
            }
            None => {
                index_by_key.insert(key, kept.len());
                kept.push(o);
            }
        }
    }

    kept
}
