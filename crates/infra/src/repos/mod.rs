mod occurrence;
mod shared;

use crate::system::ISys;
use chrono_tz::Tz;
pub use occurrence::{IOccurrenceRepo, InMemoryOccurrenceRepo};
use std::sync::Arc;

#[derive(Clone)]
pub struct Repos {
    pub occurrences: Arc<dyn IOccurrenceRepo>,
}

impl Repos {
    pub fn create_inmemory(tz: Tz, sys: Arc<dyn ISys>) -> Self {
        Self {
            occurrences: Arc::new(InMemoryOccurrenceRepo::new(tz, sys)),
        }
    }
}
