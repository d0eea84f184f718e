//! Center run orchestration
//!
//! One call = one center's full cycle: load prior snapshots, validate
//! every file group, reconcile duplicates, persist the row-level
//! diffs, and flush queued notifications.

use crate::db::StatusStore;
use crate::services::duplicate_resolver::append_duplicate_notifications;
use crate::services::invoker::validate_group;
use crate::services::notification::{flush, NotificationAccumulator, Notifier};
use crate::services::reconciler::reconcile;
use crate::types::{
    ErrorSnapshot, FileEntity, FileGroup, FileStatus, RunOptions, ValidationSnapshot,
};
use crate::validators::FormatRegistry;
use intake_common::{diff_rows, Result};
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A file that came out of the run with status VALIDATED, in the shape
/// downstream processing consumes
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFile {
    pub id: String,
    pub path: String,
    pub name: String,
    pub file_type: Option<String>,
}

/// Outcome of one center run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub center: String,
    /// Number of file groups processed
    pub groups: usize,
    /// Ids flagged by the duplicate policy this run
    pub duplicate_count: usize,
    /// Distinct users a notification was sent to
    pub notified_users: usize,
    /// Row operations applied to the validation status table
    pub status_rows_written: usize,
    /// Row operations applied to the error tracking table
    pub error_rows_written: usize,
    /// Files downstream processing may consume, in ascending id order
    pub valid_files: Vec<ValidFile>,
}

impl RunSummary {
    fn empty(run_id: Uuid, center: &str) -> Self {
        Self {
            run_id,
            center: center.to_string(),
            groups: 0,
            duplicate_count: 0,
            notified_users: 0,
            status_rows_written: 0,
            error_rows_written: 0,
            valid_files: Vec::new(),
        }
    }
}

/// Run the full validation cycle for one center.
///
/// The error tracking diff is applied before the validation status
/// diff, and the two are not covered by one transaction. A crash
/// between the writes leaves orphaned error rows; the next run's
/// reconciliation prunes them back to INVALID ids.
pub async fn run_center_validation(
    store: &dyn StatusStore,
    registry: &FormatRegistry,
    notifier: &dyn Notifier,
    options: &RunOptions,
    groups: Vec<FileGroup>,
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    info!(
        run_id = %run_id,
        center = %options.center,
        processing = %options.processing.as_str(),
        groups = groups.len(),
        "Starting center validation run"
    );

    if groups.is_empty() {
        warn!(center = %options.center, "No files to validate, skipping run");
        return Ok(RunSummary::empty(run_id, &options.center));
    }

    let prior_validation = store
        .load_validation_snapshot(&options.center, options.processing)
        .await?;
    let prior_errors = store
        .load_error_snapshot(&options.center, options.processing)
        .await?;

    // Persisted rows carry no user ids, so duplicate notifications
    // resolve recipients through this run's entity listing.
    let entity_index: HashMap<String, FileEntity> = groups
        .iter()
        .flat_map(|g| g.entities().iter().cloned())
        .map(|e| (e.id.clone(), e))
        .collect();

    let mut accumulator = NotificationAccumulator::new();
    let mut run_validation = ValidationSnapshot::default();
    let mut run_errors = ErrorSnapshot::default();
    let group_count = groups.len();

    for group in &groups {
        let result = validate_group(
            group,
            &prior_validation,
            &prior_errors,
            registry,
            options,
            &mut accumulator,
        )
        .await?;
        for record in result.statuses {
            run_validation.insert(record);
        }
        for record in result.errors {
            run_errors.insert(record);
        }
    }

    let outcome = reconcile(run_validation, run_errors);
    append_duplicate_notifications(
        &outcome.duplicate_ids,
        &outcome.validation,
        &entity_index,
        &mut accumulator,
    );

    let notified_users = flush(accumulator, notifier, &options.subject_prefix).await?;

    let error_diff = diff_rows(&prior_errors.rows(), &outcome.errors.rows(), true);
    let validation_diff = diff_rows(&prior_validation.rows(), &outcome.validation.rows(), true);
    let error_rows_written = error_diff.len();
    let status_rows_written = validation_diff.len();

    // Error rows land first. If the status write below fails the
    // tables disagree until the next run reconciles them.
    store.apply_error_diff(&error_diff).await?;
    if let Err(e) = store.apply_validation_diff(&validation_diff).await {
        error!(
            run_id = %run_id,
            center = %options.center,
            "Validation status write failed after error rows were written; \
             tables are inconsistent until the next run"
        );
        return Err(e);
    }

    let valid_files: Vec<ValidFile> = outcome
        .validation
        .iter()
        .filter(|r| r.status == FileStatus::Validated)
        .map(|r| ValidFile {
            id: r.id.clone(),
            path: r.path.clone(),
            name: r.name.clone(),
            file_type: r.file_type.clone(),
        })
        .collect();

    info!(
        run_id = %run_id,
        center = %options.center,
        duplicates = outcome.duplicate_ids.len(),
        notified = notified_users,
        valid = valid_files.len(),
        "Center validation run complete"
    );

    Ok(RunSummary {
        run_id,
        center: options.center.clone(),
        groups: group_count,
        duplicate_count: outcome.duplicate_ids.len(),
        notified_users,
        status_rows_written,
        error_rows_written,
        valid_files,
    })
}
