use crate::{
    recurrence::RecurrenceRule,
    shared::entity::{Entity, ID},
};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Where an occurrence record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    /// Entered by the user
    Manual,
    /// Synced from an external read/write calendar
    ExternalSync,
    /// Task or habit block placed by the scheduler
    Generated,
}

impl Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match self {
            Self::Manual => "manual",
            Self::ExternalSync => "external",
            Self::Generated => "generated",
        };
        write!(f, "{}", origin)
    }
}

/// One concrete time block. Timestamps are epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: ID,
    /// Present when the occurrence belongs to a recurring series
    pub series_id: Option<ID>,
    pub origin: Origin,
    /// Identifier of the occurrence in the external calendar
    pub origin_id: Option<String>,
    /// Internal identifier of whatever generated the block, e.g. a task or habit
    pub source_id: Option<String>,
    pub start_ts: i64,
    pub end_ts: i64,
    /// Start before the user first moved the occurrence
    pub original_start_ts: Option<i64>,
    pub title: String,
    /// Verbatim rule text, only set on the exemplar of a series
    pub recurrence: Option<String>,
    pub last_synced_at: Option<i64>,
    pub updated: Option<i64>,
    pub calendar_id: Option<String>,
    pub color: Option<String>,
}

impl Entity for Occurrence {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Occurrence {
    pub fn new(title: impl Into<String>, start_ts: i64, end_ts: i64, origin: Origin) -> Self {
        Self {
            id: Default::default(),
            series_id: None,
            origin,
            origin_id: None,
            source_id: None,
            start_ts,
            end_ts,
            original_start_ts: None,
            title: title.into(),
            recurrence: None,
            last_synced_at: None,
            updated: None,
            calendar_id: None,
            color: None,
        }
    }

    /// Length in millis, inverted records count as zero length
    pub fn duration(&self) -> i64 {
        (self.end_ts - self.start_ts).max(0)
    }

    pub fn is_recurring(&self) -> bool {
        self.series_id.is_some() || self.recurrence.is_some()
    }

    /// Whether this record carries the rule text of its series
    pub fn is_exemplar(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The start the occurrence had before any user move
    pub fn anchor_ts(&self) -> i64 {
        self.original_start_ts.unwrap_or(self.start_ts)
    }

    pub fn rule(&self) -> Option<RecurrenceRule> {
        self.recurrence.as_deref().and_then(RecurrenceRule::decode)
    }

    pub fn start_in<T: TimeZone>(&self, tz: &T) -> Option<DateTime<T>> {
        tz.timestamp_millis_opt(self.start_ts).single()
    }

    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_ts)
    }

    pub fn in_series(&self, series_id: &ID) -> bool {
        self.series_id.as_ref() == Some(series_id)
    }

    /// Records the current start as the original one, once
    pub(crate) fn remember_original_start(&mut self) {
        if self.original_start_ts.is_none() {
            self.original_start_ts = Some(self.start_ts);
        }
    }

    /// Applies every field of the patch except the recurrence, which needs
    /// the rest of the series to be resolved.
    pub(crate) fn apply_fields(&mut self, patch: &OccurrencePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(calendar_id) = &patch.calendar_id {
            self.calendar_id = Some(calendar_id.clone());
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
    }
}

/// Field updates for an occurrence. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePatch {
    pub title: Option<String>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub calendar_id: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` removes the recurrence, `Some(Some(rule))` replaces it
    pub recurrence: Option<Option<RecurrenceRule>>,
}

impl OccurrencePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn recurrence(rule: Option<RecurrenceRule>) -> Self {
        Self {
            recurrence: Some(rule),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn changes_time(&self) -> bool {
        self.start_ts.is_some() || self.end_ts.is_some()
    }
}
