//! State reconciliation
//!
//! Merges the run's fresh per-group results with the duplicate
//! resolver's overrides into the authoritative snapshots, then
//! restores the coupled-table invariant: an error row exists iff the
//! matching validation status is INVALID.

use crate::services::duplicate_resolver::{find_duplicates, DUPLICATED_FILE_MESSAGE};
use crate::types::{ErrorRecord, ErrorSnapshot, FileStatus, ValidationSnapshot};
use tracing::{debug, info};

/// Reconciled snapshots, ready for diffing, plus the run's duplicate
/// set (needed for notification routing)
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub validation: ValidationSnapshot,
    pub errors: ErrorSnapshot,
    pub duplicate_ids: Vec<String>,
}

/// Reconcile the run's snapshots.
///
/// 1. Force status INVALID and the fixed duplicate message onto every
///    id in this run's duplicate set.
/// 2. Ids still carrying the duplicate message from an earlier run
///    but no longer duplicated are deleted from both snapshots
///    entirely. The next run sees them as brand-new ids and forces
///    revalidation; this delete-then-rediscover convergence is how
///    resolved duplicates self-heal.
/// 3. Append duplicate rows projected to error columns, one row per
///    id (an existing error row for the id is kept, already carrying
///    the forced message).
/// 4. Prune error rows whose validation status is not INVALID
///    (centers fix their files; stale errors must not linger).
pub fn reconcile(
    mut validation: ValidationSnapshot,
    mut errors: ErrorSnapshot,
) -> ReconcileOutcome {
    let duplicate_ids = find_duplicates(&validation);

    for id in &duplicate_ids {
        if let Some(record) = validation.get_mut(id) {
            record.status = FileStatus::Invalid;
        }
        if let Some(error) = errors.get_mut(id) {
            error.errors = DUPLICATED_FILE_MESSAGE.to_string();
        }
    }

    // Stale residue: rows that carried the duplicate message into this
    // run but are no longer duplicated.
    let resolved: Vec<String> = errors
        .iter()
        .filter(|e| e.errors == DUPLICATED_FILE_MESSAGE && !duplicate_ids.contains(&e.id))
        .map(|e| e.id.clone())
        .collect();
    for id in &resolved {
        debug!(id = %id, "Duplicate resolved, deleting row for rediscovery next run");
        validation.remove(id);
        errors.remove(id);
    }

    for id in &duplicate_ids {
        if !errors.contains(id) {
            if let Some(record) = validation.get(id) {
                errors.insert(ErrorRecord {
                    id: record.id.clone(),
                    errors: DUPLICATED_FILE_MESSAGE.to_string(),
                    name: record.name.clone(),
                    file_type: record.file_type.clone(),
                    center: record.center.clone(),
                });
            }
        }
    }

    let invalid_ids: Vec<String> = validation
        .iter()
        .filter(|r| r.status == FileStatus::Invalid)
        .map(|r| r.id.clone())
        .collect();
    errors.retain(|e| invalid_ids.contains(&e.id));

    info!(
        duplicates = duplicate_ids.len(),
        resolved = resolved.len(),
        invalid = invalid_ids.len(),
        "Run snapshots reconciled"
    );

    ReconcileOutcome {
        validation,
        errors,
        duplicate_ids,
    }
}
