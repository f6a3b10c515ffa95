mod propagator;

pub use propagator::{ICalendarPropagator, InMemoryPropagator, PropagatedOperation};
