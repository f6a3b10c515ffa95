//! Reconciles calendar occurrences gathered from several origins into one
//! consistent view, and routes edits of recurring occurrences through an
//! explicit scope decision.

pub mod telemetry;

pub use series_reconciler_api as api;
pub use series_reconciler_domain as domain;
pub use series_reconciler_infra as infra;
