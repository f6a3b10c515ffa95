use super::IOccurrenceRepo;
use crate::{repos::shared::inmemory_repo::*, system::ISys};
use anyhow::{anyhow, bail};
use chrono_tz::Tz;
use series_reconciler_domain::{
    plan_delete, plan_move, plan_update, EditScope, Occurrence, OccurrencePatch, ScopedChange,
    TimeSpan, ID,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tracing::debug;

pub struct InMemoryOccurrenceRepo {
    occurrences: Mutex<Vec<Occurrence>>,
    tz: Tz,
    sys: Arc<dyn ISys>,
    failing: AtomicBool,
}

impl InMemoryOccurrenceRepo {
    /// `tz` is the zone series moves re-anchor their rules in
    pub fn new(tz: Tz, sys: Arc<dyn ISys>) -> Self {
        Self {
            occurrences: Mutex::new(Vec::new()),
            tz,
            sys,
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every following mutation fail before touching any record
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Occurrence store is unavailable");
        }
        Ok(())
    }

    /// Plans and commits a change to the target and its series while holding
    /// the lock, so concurrent mutations never interleave.
    fn commit<F>(&self, occurrence_id: &ID, plan: F) -> anyhow::Result<ScopedChange>
    where
        F: FnOnce(&Occurrence, &[Occurrence]) -> ScopedChange,
    {
        self.check_available()?;
        let mut occurrences = lock(&self.occurrences);
        let target = occurrences
            .iter()
            .find(|o| o.id == *occurrence_id)
            .cloned()
            .ok_or_else(|| anyhow!("Occurrence with id: {} was not found", occurrence_id))?;
        let members = match &target.series_id {
            Some(series_id) => occurrences
                .iter()
                .filter(|o| o.in_series(series_id))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let mut change = plan(&target, &members);
        let now = self.sys.get_timestamp_millis();
        for o in change.upserts.iter_mut() {
            o.updated = Some(now);
        }
        apply_change(&change, &mut occurrences);
        debug!(
            "Committed change to {}: {} upserts, {} removals",
            occurrence_id,
            change.upserts.len(),
            change.removals.len()
        );
        Ok(change)
    }
}

#[async_trait::async_trait]
impl IOccurrenceRepo for InMemoryOccurrenceRepo {
    async fn create(&self, o: &Occurrence) -> anyhow::Result<()> {
        self.check_available()?;
        let mut occurrences = lock(&self.occurrences);
        if occurrences.iter().any(|existing| existing.id == o.id) {
            bail!("Occurrence with id: {} already exists", o.id);
        }
        occurrences.push(o.clone());
        Ok(())
    }

    async fn update(
        &self,
        occurrence_id: &ID,
        patch: &OccurrencePatch,
        scope: EditScope,
    ) -> anyhow::Result<ScopedChange> {
        self.commit(occurrence_id, |target, members| {
            plan_update(target, members, patch, scope, &self.tz)
        })
    }

    async fn move_or_resize(
        &self,
        occurrence_id: &ID,
        start_ts: i64,
        end_ts: i64,
        scope: EditScope,
    ) -> anyhow::Result<ScopedChange> {
        self.commit(occurrence_id, |target, members| {
            plan_move(target, members, start_ts, end_ts, scope, &self.tz)
        })
    }

    async fn delete(&self, occurrence_id: &ID, scope: EditScope) -> anyhow::Result<ScopedChange> {
        self.commit(occurrence_id, |target, members| {
            plan_delete(target, members, scope)
        })
    }

    async fn find(&self, occurrence_id: &ID) -> Option<Occurrence> {
        find(occurrence_id, &self.occurrences)
    }

    async fn find_by_series(&self, series_id: &ID) -> anyhow::Result<Vec<Occurrence>> {
        Ok(find_by(&self.occurrences, |o| o.in_series(series_id)))
    }

    async fn find_by_timespan(&self, timespan: &TimeSpan) -> anyhow::Result<Vec<Occurrence>> {
        Ok(find_by(&self.occurrences, |o| {
            timespan.overlaps(o.start_ts, o.end_ts)
        }))
    }
}
