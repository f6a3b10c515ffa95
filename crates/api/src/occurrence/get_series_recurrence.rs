use super::{label_for, resolve_rule_text, RuleSource};
use crate::shared::usecase::UseCase;
use chrono::prelude::*;
use chrono_tz::Tz;
use serde::Serialize;
use series_reconciler_domain::{RecurrenceDraft, RecurrencePreset, RecurrenceRule, ID};
use series_reconciler_infra::ReconcilerContext;

/// The recurrence shown when the edit view of an occurrence opens
#[derive(Debug)]
pub struct GetSeriesRecurrenceUseCase {
    pub occurrence_id: ID,
    pub timezone: Option<Tz>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecurrence {
    pub rule: Option<RecurrenceRule>,
    pub rule_text: Option<String>,
    pub source: Option<RuleSource>,
    pub label: String,
    /// Preselected quick choice, `None` when only the custom editor fits
    pub preset: Option<RecurrencePreset>,
    pub draft: Option<RecurrenceDraft>,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError(anyhow::Error),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetSeriesRecurrenceUseCase {
    type Response = SeriesRecurrence;

    type Error = UseCaseError;

    const NAME: &'static str = "GetSeriesRecurrence";

    async fn execute(&mut self, ctx: &ReconcilerContext) -> Result<Self::Response, Self::Error> {
        let tz = self.timezone.unwrap_or(ctx.config.default_timezone);
        let occurrence = ctx
            .repos
            .occurrences
            .find(&self.occurrence_id)
            .await
            .ok_or(UseCaseError::NotFound(self.occurrence_id))?;

        let members = match &occurrence.series_id {
            Some(series_id) => ctx
                .repos
                .occurrences
                .find_by_series(series_id)
                .await
                .map_err(UseCaseError::StorageError)?,
            None => vec![occurrence.clone()],
        };

        let resolved = resolve_rule_text(
            &occurrence,
            &members,
            ctx.config.inference_min_occurrences,
            &tz,
        );
        let rule_text = resolved.as_ref().map(|(text, _)| text.clone());
        let rule = rule_text.as_deref().and_then(RecurrenceRule::decode);
        let anchor = occurrence
            .start_in(&tz)
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(&tz));

        Ok(SeriesRecurrence {
            label: label_for(&occurrence, rule_text.as_deref(), &tz),
            preset: RecurrencePreset::matching(rule.as_ref(), &anchor),
            draft: rule.as_ref().map(RecurrenceDraft::from_rule),
            source: resolved.map(|(_, source)| source),
            rule,
            rule_text,
        })
    }
}
