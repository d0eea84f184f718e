//! Run services
//!
//! The pipeline for one center run: group the input listing, detect
//! changes, invoke format validators, reconcile duplicates, diff and
//! persist, notify uploaders. `run` ties the stages together.

pub mod change_detector;
pub mod duplicate_resolver;
pub mod grouping;
pub mod invoker;
pub mod notification;
pub mod reconciler;
pub mod run;

pub use run::{run_center_validation, RunSummary, ValidFile};
