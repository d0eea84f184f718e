//! Batch incremental validation-state reconciler for center-uploaded
//! files.
//!
//! Each run takes a center's current file listing, skips groups whose
//! content and name are unchanged since the last run, dispatches the
//! rest to pluggable format validators, applies the duplicate-filename
//! policy, and reconciles the results into two persisted tables
//! (validation status and error tracking) by writing only row-level
//! diffs. Uploaders of newly failing files get one message per user
//! per run.
//!
//! External collaborators sit behind traits: [`db::StatusStore`] for
//! persistence, [`validators::FormatValidator`] for per-format content
//! checks, and [`services::notification::Notifier`] for delivery. The
//! entry point is [`services::run_center_validation`].

pub mod db;
pub mod services;
pub mod types;
pub mod validators;

pub use intake_common::{Error, Result};
