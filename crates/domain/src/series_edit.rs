//! Turns a mutation of one occurrence into the concrete record changes for
//! the chosen [`EditScope`]. Planning is pure, persistence implementations
//! commit the resulting [`ScopedChange`] as one unit.

use crate::{
    edit_scope::EditScope,
    occurrence::{Occurrence, OccurrencePatch},
    recurrence::RecurrenceRule,
    shared::entity::ID,
};
use chrono::prelude::*;
use chrono_tz::Tz;

/// Records to write and record ids to delete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopedChange {
    pub upserts: Vec<Occurrence>,
    pub removals: Vec<ID>,
}

impl ScopedChange {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }

    /// The planned version of a record, if it is written
    pub fn upserted(&self, id: &ID) -> Option<&Occurrence> {
        self.upserts.iter().find(|o| o.id == *id)
    }
}

/// The scope a request actually gets. Records outside any series can only be
/// edited on their own, and a "following" edit on the first loaded member
/// covers the whole series.
pub fn effective_scope(target: &Occurrence, members: &[Occurrence], scope: EditScope) -> EditScope {
    let Some(series_id) = target.series_id.as_ref() else {
        return EditScope::Single;
    };
    match scope {
        EditScope::Following
            if !members
                .iter()
                .any(|o| o.in_series(series_id) && o.id != target.id && o.start_ts < target.start_ts) =>
        {
            EditScope::Series
        }
        scope => scope,
    }
}

/// Field, time and recurrence changes to `target` and the members of its
/// series within `scope`
pub fn plan_update(
    target: &Occurrence,
    members: &[Occurrence],
    patch: &OccurrencePatch,
    scope: EditScope,
    tz: &Tz,
) -> ScopedChange {
    let mut planner = Planner::new(target, members, scope);
    if patch.changes_time() {
        planner.reschedule(
            patch.start_ts.unwrap_or(target.start_ts),
            patch.end_ts.unwrap_or(target.end_ts),
            tz,
        );
    }
    planner.apply_fields(patch);
    if let Some(rule) = &patch.recurrence {
        planner.replace_rule(rule.as_ref());
    }
    planner.finish()
}

/// Moves or resizes `target` to `start_ts..end_ts`. Other members within
/// `scope` shift by the same start and end deltas.
pub fn plan_move(
    target: &Occurrence,
    members: &[Occurrence],
    start_ts: i64,
    end_ts: i64,
    scope: EditScope,
    tz: &Tz,
) -> ScopedChange {
    let mut planner = Planner::new(target, members, scope);
    planner.reschedule(start_ts, end_ts, tz);
    planner.finish()
}

pub fn plan_delete(target: &Occurrence, members: &[Occurrence], scope: EditScope) -> ScopedChange {
    let mut planner = Planner::new(target, members, scope);
    planner.remove_affected();
    planner.finish()
}

struct Planner {
    /// The target and the other loaded members of its series, by start
    records: Vec<Occurrence>,
    target: usize,
    scope: EditScope,
    /// Whether the series has members besides the target
    has_siblings: bool,
    affected: Vec<usize>,
    touched: Vec<bool>,
    removed: Vec<bool>,
}

impl Planner {
    fn new(target: &Occurrence, members: &[Occurrence], scope: EditScope) -> Self {
        let scope = effective_scope(target, members, scope);
        let has_siblings = target.series_id.map_or(false, |series_id| {
            members
                .iter()
                .any(|o| o.in_series(&series_id) && o.id != target.id)
        });

        let mut records = match &target.series_id {
            Some(series_id) if scope != EditScope::Single => members
                .iter()
                .filter(|o| o.in_series(series_id) && o.id != target.id)
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        records.push(target.clone());
        records.sort_by_key(|o| o.start_ts);
        let target_idx = records
            .iter()
            .position(|o| o.id == target.id)
            .unwrap_or_default();

        let affected = match scope {
            EditScope::Single => vec![target_idx],
            EditScope::Series => (0..records.len()).collect(),
            EditScope::Following => (0..records.len())
                .filter(|i| *i == target_idx || records[*i].start_ts >= target.start_ts)
                .collect(),
        };

        let len = records.len();
        let mut planner = Self {
            records,
            target: target_idx,
            scope,
            has_siblings,
            affected,
            touched: vec![false; len],
            removed: vec![false; len],
        };
        if scope == EditScope::Following {
            planner.split_following();
        }
        planner
    }

    /// Moves the target and everything after it into a new series. The old
    /// exemplar keeps the rule up to the target, the target becomes the
    /// exemplar of the rest.
    fn split_following(&mut self) {
        let exemplar = self.records.iter().position(|o| o.is_exemplar());
        let split = exemplar.and_then(|i| {
            let rule = self.records[i].rule()?;
            let dtstart = DateTime::from_timestamp_millis(self.records[i].anchor_ts())?;
            let pivot = self.records[self.target].start_utc()?;
            Some(rule.split_at(dtstart, pivot))
        });

        let tail_series = ID::new();
        for &i in &self.affected {
            self.records[i].series_id = Some(tail_series);
            self.records[i].recurrence = None;
            self.touched[i] = true;
        }

        let Some(split) = split else {
            return;
        };
        if let (Some(i), Some(head)) = (exemplar, &split.head) {
            if !self.affected.contains(&i) {
                self.records[i].recurrence = Some(head.to_string());
                self.touched[i] = true;
            }
        }
        self.records[self.target].recurrence = split.tail.map(|tail| tail.to_string());
    }

    fn reschedule(&mut self, start_ts: i64, end_ts: i64, tz: &Tz) {
        let target = &self.records[self.target];
        let start_delta = start_ts - target.start_ts;
        let end_delta = end_ts - target.end_ts;
        if start_delta == 0 && end_delta == 0 {
            return;
        }

        if self.scope == EditScope::Single {
            let target = &mut self.records[self.target];
            target.remember_original_start();
            target.start_ts = start_ts;
            target.end_ts = end_ts;
            self.touched[self.target] = true;
            return;
        }

        for &i in &self.affected {
            let o = &mut self.records[i];
            let from = o.start_in(tz);
            o.start_ts += start_delta;
            o.end_ts += end_delta;
            if let (Some(rule), Some(from), Some(to)) = (o.rule(), from, o.start_in(tz)) {
                o.recurrence = Some(rule.shifted(&from, &to).to_string());
            }
            self.touched[i] = true;
        }
    }

    fn apply_fields(&mut self, patch: &OccurrencePatch) {
        let fields_only = OccurrencePatch {
            start_ts: None,
            end_ts: None,
            recurrence: None,
            ..patch.clone()
        };
        if fields_only.is_empty() {
            return;
        }
        for &i in &self.affected {
            self.records[i].apply_fields(&fields_only);
            self.touched[i] = true;
        }
    }

    fn replace_rule(&mut self, rule: Option<&RecurrenceRule>) {
        let text = rule.map(|rule| rule.to_string());
        match (self.scope, text) {
            // The target leaves its series and carries the rule on its own
            (EditScope::Single, text) => {
                let has_siblings = self.has_siblings;
                let target = &mut self.records[self.target];
                target.series_id = match (&text, has_siblings) {
                    (None, _) => None,
                    (Some(_), false) => target.series_id.or_else(|| Some(ID::new())),
                    (Some(_), true) => Some(ID::new()),
                };
                target.recurrence = text;
                self.touched[self.target] = true;
            }
            (scope, Some(text)) => {
                let exemplar = match scope {
                    EditScope::Series => self
                        .records
                        .iter()
                        .position(|o| o.is_exemplar())
                        .unwrap_or(self.target),
                    _ => self.target,
                };
                self.records[exemplar].recurrence = Some(text);
                self.touched[exemplar] = true;
            }
            // The target stays as a plain occurrence, the rest of the scope
            // no longer exists
            (_, None) => {
                for i in self.affected.clone() {
                    if i == self.target {
                        self.records[i].series_id = None;
                        self.records[i].recurrence = None;
                        self.touched[i] = true;
                    } else {
                        self.removed[i] = true;
                    }
                }
            }
        }
    }

    fn remove_affected(&mut self) {
        for &i in &self.affected {
            self.removed[i] = true;
        }
    }

    fn finish(self) -> ScopedChange {
        let mut change = ScopedChange::default();
        for ((o, touched), removed) in self.records.into_iter().zip(self.touched).zip(self.removed) {
            if removed {
                change.removals.push(o.id);
            } else if touched {
                change.upserts.push(o);
            }
        }
        change
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{occurrence::Origin, recurrence::Termination};
    use chrono_tz::UTC;

    const HOUR: i64 = 60 * 60 * 1000;
    const DAY: i64 = 24 * HOUR;

    struct Series {
        members: Vec<Occurrence>,
    }

    impl Series {
        /// Daily 09:00-10:00 from 2024-03-04 (a Monday), the first record is the exemplar
        fn daily(len: usize, rule: &str) -> Self {
            let series_id = ID::new();
            let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap().timestamp_millis();
            let members = (0..len)
                .map(|i| {
                    let start = start + i as i64 * DAY;
                    let mut o = Occurrence::new("Standup", start, start + HOUR, Origin::Manual);
                    o.series_id = Some(series_id);
                    if i == 0 {
                        o.recurrence = Some(rule.into());
                    }
                    o
                })
                .collect();
            Self { members }
        }

        fn at(&self, i: usize) -> &Occurrence {
            &self.members[i]
        }
    }

    #[test]
    fn bare_records_are_always_single() {
        let o = Occurrence::new("Lunch", 0, HOUR, Origin::Manual);
        for scope in EditScope::all() {
            assert_eq!(effective_scope(&o, &[], scope), EditScope::Single);
        }
    }

    #[test]
    fn following_from_the_first_member_is_series() {
        let s = Series::daily(3, "FREQ=DAILY");
        assert_eq!(
            effective_scope(s.at(0), &s.members, EditScope::Following),
            EditScope::Series
        );
        assert_eq!(
            effective_scope(s.at(1), &s.members, EditScope::Following),
            EditScope::Following
        );
    }

    #[test]
    fn single_move_remembers_the_original_start() {
        let s = Series::daily(3, "FREQ=DAILY");
        let target = s.at(1);
        let change = plan_move(
            target,
            &s.members,
            target.start_ts + HOUR,
            target.end_ts + HOUR,
            EditScope::Single,
            &UTC,
        );
        assert!(change.removals.is_empty());
        assert_eq!(change.upserts.len(), 1);
        let moved = &change.upserts[0];
        assert_eq!(moved.start_ts, target.start_ts + HOUR);
        assert_eq!(moved.original_start_ts, Some(target.start_ts));
        assert_eq!(moved.series_id, target.series_id);
    }

    #[test]
    fn series_move_shifts_members_and_rule() {
        let s = Series::daily(3, "FREQ=WEEKLY;BYDAY=MO");
        let target = s.at(2);
        let change = plan_move(
            target,
            &s.members,
            target.start_ts + DAY,
            target.end_ts + DAY + HOUR,
            EditScope::Series,
            &UTC,
        );
        assert_eq!(change.upserts.len(), 3);
        for (before, after) in s.members.iter().zip(&change.upserts) {
            assert_eq!(after.start_ts, before.start_ts + DAY);
            assert_eq!(after.end_ts, before.end_ts + DAY + HOUR);
            assert_eq!(after.original_start_ts, None);
        }
        assert_eq!(
            change.upserted(&s.at(0).id).unwrap().recurrence.as_deref(),
            Some("FREQ=WEEKLY;BYDAY=TU")
        );
    }

    #[test]
    fn following_move_splits_the_series() {
        let s = Series::daily(5, "FREQ=DAILY;COUNT=5");
        let target = s.at(2);
        let change = plan_move(
            target,
            &s.members,
            target.start_ts + HOUR,
            target.end_ts + HOUR,
            EditScope::Following,
            &UTC,
        );

        let head = change.upserted(&s.at(0).id).unwrap();
        assert_eq!(head.recurrence.as_deref(), Some("FREQ=DAILY;COUNT=2"));
        assert_eq!(head.series_id, s.at(0).series_id);
        assert!(change.upserted(&s.at(1).id).is_none());

        let new_exemplar = change.upserted(&target.id).unwrap();
        assert_eq!(new_exemplar.recurrence.as_deref(), Some("FREQ=DAILY;COUNT=3"));
        assert_ne!(new_exemplar.series_id, s.at(0).series_id);
        assert_eq!(new_exemplar.start_ts, target.start_ts + HOUR);

        for i in 3..5 {
            let moved = change.upserted(&s.at(i).id).unwrap();
            assert_eq!(moved.series_id, new_exemplar.series_id);
            assert_eq!(moved.recurrence, None);
            assert_eq!(moved.start_ts, s.at(i).start_ts + HOUR);
        }
    }

    #[test]
    fn following_split_of_an_unbounded_rule_ends_the_head() {
        let s = Series::daily(4, "FREQ=DAILY");
        let change = plan_update(
            s.at(2),
            &s.members,
            &OccurrencePatch::title("Retro"),
            EditScope::Following,
            &UTC,
        );
        let head = change.upserted(&s.at(0).id).unwrap();
        assert_eq!(
            head.rule().unwrap().termination,
            Termination::Until(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert_eq!(head.title, "Standup");
        let tail = change.upserted(&s.at(2).id).unwrap();
        assert_eq!(tail.recurrence.as_deref(), Some("FREQ=DAILY"));
        assert_eq!(tail.title, "Retro");
        assert_eq!(change.upserted(&s.at(3).id).unwrap().title, "Retro");
    }

    #[test]
    fn series_update_patches_every_member() {
        let s = Series::daily(3, "FREQ=DAILY");
        let mut patch = OccurrencePatch::title("Sync");
        patch.color = Some("blue".into());
        let change = plan_update(s.at(1), &s.members, &patch, EditScope::Series, &UTC);
        assert_eq!(change.upserts.len(), 3);
        assert!(change
            .upserts
            .iter()
            .all(|o| o.title == "Sync" && o.color.as_deref() == Some("blue")));
        assert_eq!(change.upserts[0].recurrence.as_deref(), Some("FREQ=DAILY"));
    }

    #[test]
    fn setting_a_rule_on_a_bare_record_starts_a_series() {
        let o = Occurrence::new("Gym", 0, HOUR, Origin::Manual);
        let rule = RecurrenceRule::decode("FREQ=WEEKLY;BYDAY=TH").unwrap();
        let change = plan_update(
            &o,
            &[],
            &OccurrencePatch::recurrence(Some(rule)),
            EditScope::Series,
            &UTC,
        );
        let updated = &change.upserts[0];
        assert!(updated.series_id.is_some());
        assert_eq!(updated.recurrence.as_deref(), Some("FREQ=WEEKLY;BYDAY=TH"));
    }

    #[test]
    fn changing_the_series_rule_replaces_the_exemplar_text() {
        let s = Series::daily(3, "FREQ=DAILY");
        let rule = RecurrenceRule::daily().with_interval(2);
        let change = plan_update(
            s.at(2),
            &s.members,
            &OccurrencePatch::recurrence(Some(rule)),
            EditScope::Series,
            &UTC,
        );
        assert_eq!(change.upserts.len(), 1);
        assert_eq!(change.upserts[0].id, s.at(0).id);
        assert_eq!(change.upserts[0].recurrence.as_deref(), Some("FREQ=DAILY;INTERVAL=2"));
    }

    #[test]
    fn removing_the_series_rule_keeps_only_the_target() {
        let s = Series::daily(3, "FREQ=DAILY");
        let change = plan_update(
            s.at(1),
            &s.members,
            &OccurrencePatch::recurrence(None),
            EditScope::Series,
            &UTC,
        );
        assert_eq!(change.removals, vec![s.at(0).id, s.at(2).id]);
        let kept = &change.upserts[0];
        assert_eq!(kept.id, s.at(1).id);
        assert_eq!(kept.series_id, None);
        assert_eq!(kept.recurrence, None);
    }

    #[test]
    fn single_rule_change_detaches_the_target() {
        let s = Series::daily(3, "FREQ=DAILY");
        let rule = RecurrenceRule::decode("FREQ=MONTHLY").unwrap();
        let change = plan_update(
            s.at(1),
            &s.members,
            &OccurrencePatch::recurrence(Some(rule)),
            EditScope::Single,
            &UTC,
        );
        assert_eq!(change.upserts.len(), 1);
        let detached = &change.upserts[0];
        assert!(detached.series_id.is_some());
        assert_ne!(detached.series_id, s.at(1).series_id);
        assert_eq!(detached.recurrence.as_deref(), Some("FREQ=MONTHLY"));
    }

    #[test]
    fn deletes_by_scope() {
        let s = Series::daily(4, "FREQ=DAILY;COUNT=4");

        let single = plan_delete(s.at(0), &s.members, EditScope::Single);
        assert_eq!(single.removals, vec![s.at(0).id]);
        assert!(single.upserts.is_empty());

        let series = plan_delete(s.at(2), &s.members, EditScope::Series);
        assert_eq!(series.removals.len(), 4);
        assert!(series.upserts.is_empty());

        let following = plan_delete(s.at(2), &s.members, EditScope::Following);
        assert_eq!(following.removals, vec![s.at(2).id, s.at(3).id]);
        assert_eq!(following.upserts.len(), 1);
        assert_eq!(
            following.upserts[0].recurrence.as_deref(),
            Some("FREQ=DAILY;COUNT=2")
        );
    }

    #[test]
    fn unchanged_time_is_not_a_move() {
        let s = Series::daily(2, "FREQ=DAILY");
        let target = s.at(1);
        let change = plan_move(
            target,
            &s.members,
            target.start_ts,
            target.end_ts,
            EditScope::Series,
            &UTC,
        );
        assert!(change.is_empty());
    }

    #[test]
    fn members_of_other_series_are_left_alone() {
        let s = Series::daily(2, "FREQ=DAILY");
        let other = Series::daily(2, "FREQ=DAILY");
        let mut all = s.members.clone();
        all.extend(other.members.clone());
        let change = plan_delete(s.at(1), &all, EditScope::Series);
        assert_eq!(change.removals, vec![s.at(0).id, s.at(1).id]);
    }
}
