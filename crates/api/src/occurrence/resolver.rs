use super::apply_edit::{ApplyEditUseCase, ApplyError, EditOutcome};
use crate::shared::usecase::execute;
use series_reconciler_domain::{
    EditScope, Occurrence, OccurrencePatch, RecurrenceRule, ScopeHint, ID,
};
use series_reconciler_infra::ReconcilerContext;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tracing::{debug, info};

/// A change a caller wants to make to one occurrence
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Store the occurrence as a new record
    Create,
    Update(OccurrencePatch),
    MoveOrResize { start_ts: i64, end_ts: i64 },
    /// Replace the recurrence rule, `None` stops the repetition
    ChangeRecurrence(Option<RecurrenceRule>),
    Delete,
}

impl Mutation {
    fn is_move(&self) -> bool {
        matches!(self, Self::MoveOrResize { .. })
    }
}

/// How the mutation was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditIntent {
    /// Drag, resize or another direct gesture. Recurring occurrences need a
    /// scope confirmation first.
    Gesture,
    /// An explicit edit view where the scope was chosen up front
    EditView(EditScope),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    PendingConfirmation,
    Applying,
}

/// A mutation with a settled scope. Only the resolver hands these out, so an
/// edit cannot be applied without going through it. The occurrence stays
/// `Applying` while the edit is alive and is `Idle` again once it is dropped,
/// applied or not.
#[derive(Debug)]
pub struct ConfirmedEdit {
    occurrence: Occurrence,
    mutation: Mutation,
    scope: EditScope,
    _release: ApplyingGuard,
}

impl ConfirmedEdit {
    pub fn occurrence(&self) -> &Occurrence {
        &self.occurrence
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub fn scope(&self) -> EditScope {
        self.scope
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub occurrence_id: ID,
    pub choices: Vec<EditScope>,
}

#[derive(Debug)]
pub enum Resolution {
    /// The scope is settled, apply the edit
    Apply(ConfirmedEdit),
    /// Ask the user for one of the offered scopes, then call `confirm`
    Confirm(ConfirmationRequest),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolverError {
    #[error("No edit is waiting for confirmation on occurrence: {0}")]
    NothingPending(ID),
    #[error("The scope: {1} was not offered for occurrence: {0}")]
    ScopeNotOffered(ID, EditScope),
    #[error("An edit is already being applied to occurrence: {0}")]
    Busy(ID),
    #[error("Occurrence can not end at {1} when it starts at {0}")]
    InvalidTimespan(i64, i64),
}

#[derive(Debug)]
struct PendingEdit {
    occurrence: Occurrence,
    mutation: Mutation,
    choices: Vec<EditScope>,
}

#[derive(Debug)]
enum Slot {
    Pending(PendingEdit),
    Applying,
}

type Slots = Arc<Mutex<HashMap<ID, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<ID, Slot>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the `Applying` slot of an occurrence when dropped
#[derive(Debug)]
struct ApplyingGuard {
    slots: Slots,
    occurrence_id: ID,
}

impl Drop for ApplyingGuard {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        if matches!(slots.get(&self.occurrence_id), Some(Slot::Applying)) {
            slots.remove(&self.occurrence_id);
            debug!("Occurrence {} is idle again", self.occurrence_id);
        }
    }
}

/// Decides how far a mutation of one occurrence reaches. Each occurrence is
/// independently `Idle`, waiting for a scope confirmation or being applied,
/// and at most one confirmation per occurrence is outstanding.
#[derive(Debug, Default)]
pub struct EditScopeResolver {
    slots: Slots,
}

impl EditScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, occurrence_id: &ID) -> ResolverState {
        match lock(&self.slots).get(occurrence_id) {
            None => ResolverState::Idle,
            Some(Slot::Pending(_)) => ResolverState::PendingConfirmation,
            Some(Slot::Applying) => ResolverState::Applying,
        }
    }

    pub fn request(
        &mut self,
        occurrence: &Occurrence,
        mutation: Mutation,
        intent: EditIntent,
    ) -> Result<Resolution, ResolverError> {
        let occurrence_id = occurrence.id;
        if self.state(&occurrence_id) == ResolverState::Applying {
            return Err(ResolverError::Busy(occurrence_id));
        }
        if let Mutation::MoveOrResize { start_ts, end_ts } = mutation {
            if end_ts <= start_ts {
                return Err(ResolverError::InvalidTimespan(start_ts, end_ts));
            }
        }

        let scope = match (&mutation, intent) {
            (Mutation::Create, _) => Some(EditScope::Single),
            _ if !occurrence.is_recurring() => Some(EditScope::Single),
            (_, EditIntent::EditView(scope)) => Some(scope),
            (_, EditIntent::Gesture) => None,
        };

        if let Some(scope) = scope {
            debug!("Applying {:?} to {} with scope {}", mutation, occurrence_id, scope);
            return Ok(Resolution::Apply(self.start_applying(
                occurrence.clone(),
                mutation,
                scope,
            )));
        }

        // "following" is not offered for moves, dragging one occurrence of a
        // series either moves it alone or shifts the whole pattern
        let choices = if mutation.is_move() {
            vec![EditScope::Single, EditScope::Series]
        } else {
            EditScope::all().to_vec()
        };
        let replaced = lock(&self.slots)
            .insert(
                occurrence_id,
                Slot::Pending(PendingEdit {
                    occurrence: occurrence.clone(),
                    mutation,
                    choices: choices.clone(),
                }),
            )
            .is_some();
        info!(
            "Waiting for scope confirmation on {} (replaced pending: {})",
            occurrence_id, replaced
        );

        Ok(Resolution::Confirm(ConfirmationRequest {
            occurrence_id,
            choices,
        }))
    }

    /// Settles the pending edit on `occurrence_id` with one of the offered
    /// scopes. An unoffered scope leaves the edit pending.
    pub fn confirm(
        &mut self,
        occurrence_id: &ID,
        scope: EditScope,
    ) -> Result<ConfirmedEdit, ResolverError> {
        let pending = {
            let mut slots = lock(&self.slots);
            let pending = match slots.remove(occurrence_id) {
                Some(Slot::Pending(pending)) => pending,
                Some(Slot::Applying) => {
                    slots.insert(*occurrence_id, Slot::Applying);
                    return Err(ResolverError::NothingPending(*occurrence_id));
                }
                None => return Err(ResolverError::NothingPending(*occurrence_id)),
            };
            if !pending.choices.contains(&scope) {
                slots.insert(*occurrence_id, Slot::Pending(pending));
                return Err(ResolverError::ScopeNotOffered(*occurrence_id, scope));
            }
            pending
        };

        info!("Scope {} confirmed for {}", scope, occurrence_id);
        Ok(self.start_applying(pending.occurrence, pending.mutation, scope))
    }

    /// Discards the pending edit on `occurrence_id`. Returns whether there was one.
    pub fn cancel(&mut self, occurrence_id: &ID) -> bool {
        let mut slots = lock(&self.slots);
        match slots.remove(occurrence_id) {
            Some(Slot::Pending(_)) => {
                info!("Discarded pending edit on {}", occurrence_id);
                true
            }
            Some(Slot::Applying) => {
                slots.insert(*occurrence_id, Slot::Applying);
                false
            }
            None => false,
        }
    }

    /// Persists and propagates a confirmed edit. The occurrence is `Idle`
    /// again afterwards, whether the edit succeeded, failed or the returned
    /// future was dropped before completing.
    pub async fn apply(
        &self,
        edit: ConfirmedEdit,
        ctx: &ReconcilerContext,
    ) -> Result<EditOutcome, ApplyError> {
        execute(ApplyEditUseCase { edit }, ctx).await
    }

    /// Scope an edit view for `occurrence` opens with. A live hint for the
    /// same occurrence wins over the default of editing just this one.
    pub fn open_edit_view(
        &self,
        occurrence: &Occurrence,
        hint: Option<&ScopeHint>,
        now: i64,
    ) -> EditScope {
        if !occurrence.is_recurring() {
            return EditScope::Single;
        }
        hint.and_then(|hint| hint.scope_for(&occurrence.id, now))
            .unwrap_or(EditScope::Single)
    }

    /// Hint token remembering `scope` for the next interaction with the
    /// occurrence, valid for the configured time window
    pub fn remember_scope(
        &self,
        occurrence_id: &ID,
        scope: EditScope,
        ctx: &ReconcilerContext,
    ) -> ScopeHint {
        ScopeHint::new(
            *occurrence_id,
            scope,
            ctx.sys.get_timestamp_millis(),
            ctx.config.scope_hint_ttl_millis,
        )
    }

    fn start_applying(
        &mut self,
        occurrence: Occurrence,
        mutation: Mutation,
        scope: EditScope,
    ) -> ConfirmedEdit {
        lock(&self.slots).insert(occurrence.id, Slot::Applying);
        ConfirmedEdit {
            _release: ApplyingGuard {
                slots: self.slots.clone(),
                occurrence_id: occurrence.id,
            },
            occurrence,
            mutation,
            scope,
        }
    }
}
