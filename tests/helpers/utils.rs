use super::setup::{TestApp, DAY, HOUR, MONDAY_9AM};
use series_reconciler::domain::{Occurrence, Origin, ID};
use series_reconciler::infra::IOccurrenceRepo;

/// Stores `len` daily standups from `MONDAY_9AM` in one series, the first
/// carrying `rule`
pub async fn create_daily_series(app: &TestApp, len: usize, rule: &str) -> Vec<Occurrence> {
    let series_id = ID::new();
    let mut members = Vec::with_capacity(len);
    for i in 0..len {
        let start = MONDAY_9AM + i as i64 * DAY;
        let mut o = Occurrence::new("Standup", start, start + HOUR, Origin::Manual);
        o.series_id = Some(series_id);
        if i == 0 {
            o.recurrence = Some(rule.into());
        }
        app.repo.create(&o).await.expect("Expected to create occurrence");
        members.push(o);
    }
    members
}

pub async fn find(app: &TestApp, o: &Occurrence) -> Option<Occurrence> {
    app.ctx.repos.occurrences.find(&o.id).await
}

/// Starts of the stored members of a series, in order
pub async fn series_starts(app: &TestApp, series_id: &ID) -> Vec<i64> {
    let mut starts = app
        .ctx
        .repos
        .occurrences
        .find_by_series(series_id)
        .await
        .expect("Expected to find series")
        .iter()
        .map(|o| o.start_ts)
        .collect::<Vec<_>>();
    starts.sort();
    starts
}
