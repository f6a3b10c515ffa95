use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How far a mutation to one occurrence of a series reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    /// Only the occurrence itself
    Single,
    /// The occurrence and every later one
    Following,
    /// Every occurrence of the series
    Series,
}

impl EditScope {
    pub fn all() -> [Self; 3] {
        [Self::Single, Self::Following, Self::Series]
    }
}

impl Display for EditScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = match self {
            Self::Single => "single",
            Self::Following => "following",
            Self::Series => "series",
        };
        write!(f, "{}", scope)
    }
}

/// Preferred scope for the next interaction with one occurrence, e.g. the
/// scope picked in a preview that is immediately followed by opening the
/// full editor. Callers hold on to the token and hand it back, it is never
/// stored globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeHint {
    pub occurrence_id: ID,
    pub scope: EditScope,
    pub expires_at: i64,
}

impl ScopeHint {
    pub fn new(occurrence_id: ID, scope: EditScope, now: i64, ttl_millis: i64) -> Self {
        Self {
            occurrence_id,
            scope,
            expires_at: now + ttl_millis.max(0),
        }
    }

    /// The hinted scope, if the hint is for `occurrence_id` and still alive
    pub fn scope_for(&self, occurrence_id: &ID, now: i64) -> Option<EditScope> {
        (self.occurrence_id == *occurrence_id && now < self.expires_at).then_some(self.scope)
    }
}
