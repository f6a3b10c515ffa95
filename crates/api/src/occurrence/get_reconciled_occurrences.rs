use super::{label_for, resolve_rule_text, RuleSource};
use crate::shared::usecase::UseCase;
use chrono_tz::Tz;
use serde::Serialize;
use series_reconciler_domain::{dedupe, Occurrence, RecurrenceRule, TimeSpan};
use series_reconciler_infra::ReconcilerContext;
use tracing::debug;

/// Loads the occurrences in a window and turns them into one consistent
/// view: duplicates collapsed, a rule and label for every occurrence.
/// Nothing is written back, callers replace their previous result wholesale.
#[derive(Debug)]
pub struct GetReconciledOccurrencesUseCase {
    pub timespan: TimeSpan,
    /// Zone for labels and inference, the configured default when absent
    pub timezone: Option<Tz>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledOccurrence {
    pub occurrence: Occurrence,
    pub rule: Option<RecurrenceRule>,
    pub rule_source: Option<RuleSource>,
    pub label: String,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError(anyhow::Error),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetReconciledOccurrencesUseCase {
    type Response = Vec<ReconciledOccurrence>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetReconciledOccurrences";

    async fn execute(&mut self, ctx: &ReconcilerContext) -> Result<Self::Response, Self::Error> {
        let tz = self.timezone.unwrap_or(ctx.config.default_timezone);
        let loaded = ctx
            .repos
            .occurrences
            .find_by_timespan(&self.timespan)
            .await
            .map_err(UseCaseError::StorageError)?;

        let loaded_count = loaded.len();
        let mut kept = dedupe(loaded, &ctx.config.default_calendar_id);
        debug!(
            "Reconciled {} loaded occurrences into {}",
            loaded_count,
            kept.len()
        );
        kept.sort_by_key(|o| o.start_ts);

        let reconciled = kept
            .iter()
            .map(|o| {
                let resolved =
                    resolve_rule_text(o, &kept, ctx.config.inference_min_occurrences, &tz);
                let rule_text = resolved.as_ref().map(|(text, _)| text.as_str());
                ReconciledOccurrence {
                    occurrence: o.clone(),
                    rule: rule_text.and_then(RecurrenceRule::decode),
                    rule_source: resolved.as_ref().map(|(_, source)| *source),
                    label: label_for(o, rule_text, &tz),
                }
            })
            .collect();

        Ok(reconciled)
    }
}
