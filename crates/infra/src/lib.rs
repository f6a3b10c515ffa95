mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::{IOccurrenceRepo, InMemoryOccurrenceRepo, Repos};
pub use services::*;
use std::sync::Arc;
pub use system::{FixedSys, ISys, RealSys};

#[derive(Clone)]
pub struct ReconcilerContext {
    pub repos: Repos,
    pub propagator: Arc<dyn ICalendarPropagator>,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

impl ReconcilerContext {
    /// Context backed by in-memory collaborators and the real clock
    pub fn create_inmemory(config: Config) -> Self {
        let sys: Arc<dyn ISys> = Arc::new(RealSys {});
        Self {
            repos: Repos::create_inmemory(config.default_timezone, sys.clone()),
            propagator: Arc::new(InMemoryPropagator::new()),
            config,
            sys,
        }
    }
}

/// Will setup the infrastructure context with the default configuration.
/// Embedding apps with their own persistence build a `ReconcilerContext`
/// from their collaborators instead.
pub fn setup_context() -> ReconcilerContext {
    ReconcilerContext::create_inmemory(Config::default())
}
