use series_reconciler_domain::{Occurrence, Origin, ID};
use series_reconciler_infra::{
    Config, FixedSys, IOccurrenceRepo, ISys, InMemoryOccurrenceRepo, InMemoryPropagator,
    ReconcilerContext, Repos,
};
use std::sync::Arc;

pub const NOW: i64 = 1_710_000_000_000;
pub const HOUR: i64 = 60 * 60 * 1000;
pub const DAY: i64 = 24 * HOUR;
/// 2024-03-04T09:00:00Z, a Monday
pub const MONDAY_9AM: i64 = 1_709_542_800_000;

pub struct TestContext {
    pub ctx: ReconcilerContext,
    pub repo: Arc<InMemoryOccurrenceRepo>,
    pub propagator: Arc<InMemoryPropagator>,
    pub sys: Arc<FixedSys>,
}

pub fn setup() -> TestContext {
    let config = Config::default();
    let sys = Arc::new(FixedSys::new(NOW));
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
    TestContext {
        ctx,
        repo,
        propagator,
        sys,
    }
}

/// Stores a daily series whose first member carries `rule`
pub async fn insert_series(ctx: &TestContext, len: usize, rule: Option<&str>) -> Vec<Occurrence> {
    let series_id = ID::new();
    let mut members = Vec::with_capacity(len);
    for i in 0..len {
        let start = MONDAY_9AM + i as i64 * DAY;
        let mut o = Occurrence::new("Standup", start, start + HOUR, Origin::ExternalSync);
        o.series_id = Some(series_id);
        o.origin_id = Some(format!("{}-{}", series_id, i));
        if i == 0 {
            o.recurrence = rule.map(String::from);
        }
        ctx.repo.create(&o).await.expect("To create occurrence");
        members.push(o);
    }
    members
}

pub async fn insert_single(ctx: &TestContext, title: &str, start_ts: i64) -> Occurrence {
    let o = Occurrence::new(title, start_ts, start_ts + HOUR, Origin::Manual);
    ctx.repo.create(&o).await.expect("To create occurrence");
    o
}
