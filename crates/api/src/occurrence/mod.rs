mod apply_edit;
mod get_reconciled_occurrences;
mod get_series_recurrence;
mod resolver;

pub use apply_edit::{ApplyEditUseCase, ApplyError, EditOutcome, PropagationWarning};
pub use get_reconciled_occurrences::{
    GetReconciledOccurrencesUseCase, ReconciledOccurrence, UseCaseError as GetReconciledOccurrencesError,
};
pub use get_series_recurrence::{
    GetSeriesRecurrenceUseCase, SeriesRecurrence, UseCaseError as GetSeriesRecurrenceError,
};
pub use resolver::{
    ConfirmationRequest, ConfirmedEdit, EditIntent, EditScopeResolver, Mutation, Resolution,
    ResolverError, ResolverState,
};

use chrono::prelude::*;
use chrono_tz::Tz;
use serde::Serialize;
use series_reconciler_domain::{infer, label, Occurrence};

/// Where the rule shown for an occurrence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleSource {
    /// The occurrence carries the rule text itself
    Explicit,
    /// Another loaded member of the series carries it
    Exemplar,
    /// Reconstructed from the loaded members of the series
    Inferred,
}

/// Rule text for `o`: its own, its exemplar's among `loaded`, or one inferred
/// from `loaded` when the series has enough members there. Text that does not
/// decode is skipped.
fn resolve_rule_text(
    o: &Occurrence,
    loaded: &[Occurrence],
    min_occurrences: usize,
    tz: &Tz,
) -> Option<(String, RuleSource)> {
    if let Some(text) = o.recurrence.as_ref().filter(|_| o.rule().is_some()) {
        return Some((text.clone(), RuleSource::Explicit));
    }
    let series_id = o.series_id.as_ref()?;

    let members = loaded
        .iter()
        .filter(|member| member.in_series(series_id))
        .cloned()
        .collect::<Vec<_>>();
    if let Some(text) = members
        .iter()
        .find(|member| member.rule().is_some())
        .and_then(|exemplar| exemplar.recurrence.clone())
    {
        return Some((text, RuleSource::Exemplar));
    }

    if members.len() < min_occurrences {
        return None;
    }
    infer(o, &members, tz).map(|text| (text, RuleSource::Inferred))
}

/// Label for `o` given its resolved rule text
fn label_for(o: &Occurrence, rule_text: Option<&str>, tz: &Tz) -> String {
    let anchor = o
        .start_in(tz)
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(tz));
    label(rule_text, &anchor, o.series_id.is_some())
}
