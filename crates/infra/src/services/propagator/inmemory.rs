use super::ICalendarPropagator;
use anyhow::bail;
use series_reconciler_domain::{EditScope, Occurrence, OccurrencePatch, ID};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum PropagatedOperation {
    Create {
        occurrence_id: ID,
    },
    Update {
        occurrence_id: ID,
        patch: OccurrencePatch,
        scope: EditScope,
    },
    MoveOrResize {
        occurrence_id: ID,
        start_ts: i64,
        end_ts: i64,
        scope: EditScope,
    },
    Delete {
        occurrence_id: ID,
        scope: EditScope,
    },
}

/// Records what would have been sent to the external calendar
pub struct InMemoryPropagator {
    operations: Mutex<Vec<PropagatedOperation>>,
    failing: AtomicBool,
}

impl InMemoryPropagator {
    pub fn new() -> Self {
        Self {
            operations: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every following operation fail without being recorded
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn operations(&self) -> Vec<PropagatedOperation> {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, operation: PropagatedOperation) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("External calendar rejected {:?}", operation);
        }
        debug!("Propagating {:?}", operation);
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(operation);
        Ok(())
    }
}

impl Default for InMemoryPropagator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ICalendarPropagator for InMemoryPropagator {
    async fn create(&self, o: &Occurrence) -> anyhow::Result<()> {
        self.record(PropagatedOperation::Create { occurrence_id: o.id })
    }

    async fn update(
        &self,
        o: &Occurrence,
        patch: &OccurrencePatch,
        scope: EditScope,
    ) -> anyhow::Result<()> {
        self.record(PropagatedOperation::Update {
            occurrence_id: o.id,
            patch: patch.clone(),
            scope,
        })
    }

    async fn move_or_resize(
        &self,
        o: &Occurrence,
        start_ts: i64,
        end_ts: i64,
        scope: EditScope,
    ) -> anyhow::Result<()> {
        self.record(PropagatedOperation::MoveOrResize {
            occurrence_id: o.id,
            start_ts,
            end_ts,
            scope,
        })
    }

    async fn delete(&self, o: &Occurrence, scope: EditScope) -> anyhow::Result<()> {
        self.record(PropagatedOperation::Delete {
            occurrence_id: o.id,
            scope,
        })
    }
}
