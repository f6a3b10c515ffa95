use series_reconciler::infra::{
    Config, FixedSys, ISys, InMemoryOccurrenceRepo, InMemoryPropagator, ReconcilerContext, Repos,
};
use std::sync::Arc;

/// 2024-03-04T09:00:00Z, a Monday
pub const MONDAY_9AM: i64 = 1_709_542_800_000;
pub const HOUR: i64 = 60 * 60 * 1000;
pub const DAY: i64 = 24 * HOUR;

pub struct TestApp {
    pub ctx: ReconcilerContext,
    pub repo: Arc<InMemoryOccurrenceRepo>,
    pub propagator: Arc<InMemoryPropagator>,
    pub sys: Arc<FixedSys>,
}

// Wire the in-memory collaborators with a clock that only moves when told
pub fn spawn_app(config: Config) -> TestApp {
    let sys = Arc::new(FixedSys::new(MONDAY_9AM - 7 * DAY));
    let repo = Arc::new(InMemoryOccurrenceRepo::new(
        config.default_timezone,
        sys.clone(),
    ));
    let propagator = Arc::new(InMemoryPropagator::new());
    let ctx = ReconcilerContext {
        repos: Repos {
            occurrences: repo.clone(),
        },
        propagator: propagator.clone(),
        config,
        sys: sys.clone() as Arc<dyn ISys>,
    };

    TestApp {
        ctx,
        repo,
        propagator,
        sys,
    }
}
