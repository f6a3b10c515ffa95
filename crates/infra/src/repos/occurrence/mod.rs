mod inmemory;

pub use inmemory::InMemoryOccurrenceRepo;
use series_reconciler_domain::{EditScope, Occurrence, OccurrencePatch, ScopedChange, TimeSpan, ID};

/// Scope aware persistence of occurrence records. Every mutation either
/// commits completely or not at all, and returns what it committed.
#[async_trait::async_trait]
pub trait IOccurrenceRepo: Send + Sync {
    async fn create(&self, o: &Occurrence) -> anyhow::Result<()>;
    async fn update(
        &self,
        occurrence_id: &ID,
        patch: &OccurrencePatch,
        scope: EditScope,
    ) -> anyhow::Result<ScopedChange>;
    async fn move_or_resize(
        &self,
        occurrence_id: &ID,
        start_ts: i64,
        end_ts: i64,
        scope: EditScope,
    ) -> anyhow::Result<ScopedChange>;
    async fn delete(&self, occurrence_id: &ID, scope: EditScope) -> anyhow::Result<ScopedChange>;
    async fn find(&self, occurrence_id: &ID) -> Option<Occurrence>;
    async fn find_by_series(&self, series_id: &ID) -> anyhow::Result<Vec<Occurrence>>;
    async fn find_by_timespan(&self, timespan: &TimeSpan) -> anyhow::Result<Vec<Occurrence>>;
}
