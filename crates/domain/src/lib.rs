mod edit_scope;
mod fingerprint;
mod inference;
mod label;
mod occurrence;
pub mod recurrence;
mod series_edit;
mod shared;
mod timespan;

pub use edit_scope::{EditScope, ScopeHint};
pub use fingerprint::{dedupe, fingerprint, recency_score};
pub use inference::{infer, infer_rule, MIN_OCCURRENCES};
pub use label::{label, DOES_NOT_REPEAT, PART_OF_SERIES};
pub use occurrence::{Occurrence, OccurrencePatch, Origin};
pub use recurrence::{
    DraftEnd, FrequencyKind, RecurrenceDraft, RecurrenceFrequency, RecurrencePreset,
    RecurrenceRule, Termination,
};
pub use series_edit::{effective_scope, plan_delete, plan_move, plan_update, ScopedChange};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use timespan::{InvalidTimeSpanError, TimeSpan};
