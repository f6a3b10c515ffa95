mod inmemory;

pub use inmemory::{InMemoryPropagator, PropagatedOperation};
use series_reconciler_domain::{EditScope, Occurrence, OccurrencePatch};

/// Mirrors committed mutations to the external read/write calendar. Failures
/// are reported to the caller, who decides whether they are fatal.
#[async_trait::async_trait]
pub trait ICalendarPropagator: Send + Sync {
    async fn create(&self, o: &Occurrence) -> anyhow::Result<()>;
    async fn update(
        &self,
        o: &Occurrence,
        patch: &OccurrencePatch,
        scope: EditScope,
    ) -> anyhow::Result<()>;
    async fn move_or_resize(
        &self,
        o: &Occurrence,
        start_ts: i64,
        end_ts: i64,
        scope: EditScope,
    ) -> anyhow::Result<()>;
    async fn delete(&self, o: &Occurrence, scope: EditScope) -> anyhow::Result<()>;
}
