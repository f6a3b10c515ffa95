use super::resolver::{ConfirmedEdit, Mutation};
use crate::shared::usecase::UseCase;
use serde::Serialize;
use series_reconciler_domain::{EditScope, Occurrence, OccurrencePatch, ScopedChange, ID};
use series_reconciler_infra::ReconcilerContext;
use thiserror::Error;
use tracing::{info, warn};

/// Persists a confirmed edit and mirrors it to the external calendar.
///
/// Creates, updates and moves are persisted first. If the external calendar
/// then rejects them, the local change stays and the outcome carries a
/// warning. Deletes go the other way: the external calendar is told first
/// and a rejection leaves the local record in place.
#[derive(Debug)]
pub struct ApplyEditUseCase {
    pub edit: ConfirmedEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationWarning {
    pub occurrence_id: ID,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub occurrence_id: ID,
    pub scope: EditScope,
    /// What was committed locally
    pub change: ScopedChange,
    pub warning: Option<PropagationWarning>,
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("The occurrence with id: {0}, was not found.")]
    NotFound(ID),
    #[error("Unable to persist the edit, nothing was changed")]
    Persist(#[source] anyhow::Error),
    #[error("The external calendar rejected the deletion, the occurrence was kept")]
    Propagation(#[source] anyhow::Error),
}

#[async_trait::async_trait(?Send)]
impl UseCase for ApplyEditUseCase {
    type Response = EditOutcome;

    type Error = ApplyError;

    const NAME: &'static str = "ApplyEdit";

    async fn execute(&mut self, ctx: &ReconcilerContext) -> Result<Self::Response, Self::Error> {
        let scope = self.edit.scope();
        let occurrence = self.edit.occurrence();
        let repo = &ctx.repos.occurrences;
        let propagator = &ctx.propagator;

        let (current, change, propagated) = match self.edit.mutation() {
            Mutation::Create => return create(occurrence, scope, ctx).await,
            Mutation::Update(patch) => {
                let current = find_current(occurrence, ctx).await?;
                let change = repo
                    .update(&current.id, patch, scope)
                    .await
                    .map_err(ApplyError::Persist)?;
                let res = propagator
                    .update(committed(&change, &current), patch, scope)
                    .await;
                (current, change, res)
            }
            Mutation::ChangeRecurrence(rule) => {
                let current = find_current(occurrence, ctx).await?;
                let patch = OccurrencePatch::recurrence(rule.clone());
                let change = repo
                    .update(&current.id, &patch, scope)
                    .await
                    .map_err(ApplyError::Persist)?;
                let res = propagator
                    .update(committed(&change, &current), &patch, scope)
                    .await;
                (current, change, res)
            }
            Mutation::MoveOrResize { start_ts, end_ts } => {
                let current = find_current(occurrence, ctx).await?;
                let change = repo
                    .move_or_resize(&current.id, *start_ts, *end_ts, scope)
                    .await
                    .map_err(ApplyError::Persist)?;
                let res = propagator
                    .move_or_resize(committed(&change, &current), *start_ts, *end_ts, scope)
                    .await;
                (current, change, res)
            }
            Mutation::Delete => {
                let current = find_current(occurrence, ctx).await?;
                propagator
                    .delete(&current, scope)
                    .await
                    .map_err(ApplyError::Propagation)?;
                let change = repo
                    .delete(&current.id, scope)
                    .await
                    .map_err(ApplyError::Persist)?;
                (current, change, Ok(()))
            }
        };

        info!(
            "Applied edit to {} with scope {}: {} written, {} removed",
            current.id,
            scope,
            change.upserts.len(),
            change.removals.len()
        );

        Ok(EditOutcome {
            occurrence_id: current.id,
            scope,
            change,
            warning: warn_on_failure(&current.id, propagated),
        })
    }
}

async fn create(
    occurrence: &Occurrence,
    scope: EditScope,
    ctx: &ReconcilerContext,
) -> Result<EditOutcome, ApplyError> {
    let mut o = occurrence.clone();
    if o.recurrence.is_some() && o.series_id.is_none() {
        o.series_id = Some(ID::new());
    }
    o.updated = Some(ctx.sys.get_timestamp_millis());
    ctx.repos
        .occurrences
        .create(&o)
        .await
        .map_err(ApplyError::Persist)?;
    let warning = warn_on_failure(&o.id, ctx.propagator.create(&o).await);
    info!("Created occurrence {}", o.id);

    Ok(EditOutcome {
        occurrence_id: o.id,
        scope,
        change: ScopedChange {
            upserts: vec![o],
            removals: Vec::new(),
        },
        warning,
    })
}

/// The stored version of the occurrence, the caller's copy may be stale
async fn find_current(
    occurrence: &Occurrence,
    ctx: &ReconcilerContext,
) -> Result<Occurrence, ApplyError> {
    ctx.repos
        .occurrences
        .find(&occurrence.id)
        .await
        .ok_or(ApplyError::NotFound(occurrence.id))
}

/// The target as it was committed, or as it was before if the change did
/// not rewrite it
fn committed<'a>(change: &'a ScopedChange, current: &'a Occurrence) -> &'a Occurrence {
    change.upserted(&current.id).unwrap_or(current)
}

fn warn_on_failure(occurrence_id: &ID, res: anyhow::Result<()>) -> Option<PropagationWarning> {
    let e = res.err()?;
    warn!(
        "Occurrence {} was saved but not propagated to the external calendar: {:?}",
        occurrence_id, e
    );
    Some(PropagationWarning {
        occurrence_id: *occurrence_id,
        message: e.to_string(),
    })
}
