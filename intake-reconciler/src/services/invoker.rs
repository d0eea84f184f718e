//! Validator invocation
//!
//! Dispatches each file group to its format validator and normalizes
//! the outcome into per-entity validation and error rows. Groups the
//! change detector cleared are skipped and their prior statuses and
//! error texts reused. First-time validation failures queue a
//! notification bundle for the group's modifying and creating users.

use crate::services::change_detector::{check_group, GroupCheck};
use crate::services::notification::NotificationAccumulator;
use crate::types::{
    ErrorRecord, ErrorSnapshot, FileGroup, FileStatus, RunOptions, ValidationRecord,
    ValidationSnapshot,
};
use crate::validators::{
    collate_errors_and_warnings, FormatRegistry, ValidationContext, FILENAME_INCORRECT_MESSAGE,
};
use intake_common::Result;
use tracing::info;

/// Per-entity rows produced for one file group
#[derive(Debug, Clone, Default)]
pub struct GroupResult {
    pub statuses: Vec<ValidationRecord>,
    pub errors: Vec<ErrorRecord>,
}

/// Validate one file group.
///
/// File type resolution happens regardless of whether the content
/// validator runs, so reused rows carry the resolved type too. An
/// unresolvable type is not fatal: it becomes an explicit invalid
/// outcome with the incorrect-filename message, routed to the same
/// notification path as any other validation failure.
pub async fn validate_group(
    group: &FileGroup,
    prior_validation: &ValidationSnapshot,
    prior_errors: &ErrorSnapshot,
    registry: &FormatRegistry,
    options: &RunOptions,
    accumulator: &mut NotificationAccumulator,
) -> Result<GroupResult> {
    let filenames = group.names();
    info!(files = %filenames.join(", "), center = %options.center, "Validating file group");

    // Notification recipients follow the group's first entity
    let file_users: Vec<String> = group
        .entities()
        .first()
        .map(|e| vec![e.modified_by.clone(), e.created_by.clone()])
        .unwrap_or_default();

    let check = check_group(group, prior_validation, prior_errors, options.policy)?;

    let validator = registry.resolve(
        &filenames,
        &options.center,
        options.file_type_override.as_deref(),
    );
    let file_type = validator.as_ref().map(|v| v.file_type().to_string());

    let mut result = GroupResult::default();

    if check.needs_validation {
        let (valid, message) = match &validator {
            Some(validator) => {
                let ctx = ValidationContext {
                    center: options.center.clone(),
                    processing: options.processing,
                    options: options.validator_options.clone(),
                };
                let outcome = validator.validate(&group.paths(), &ctx).await?;
                let message = collate_errors_and_warnings(&outcome.errors, &outcome.warnings);
                (outcome.valid, message)
            }
            None => (
                false,
                collate_errors_and_warnings(FILENAME_INCORRECT_MESSAGE, ""),
            ),
        };
        info!(valid, "Validation complete");

        let status = if valid {
            FileStatus::Validated
        } else {
            FileStatus::Invalid
        };
        for entity in group.entities() {
            result
                .statuses
                .push(ValidationRecord::from_entity(entity, status, file_type.clone()));
            if !valid {
                result.errors.push(ErrorRecord::from_entity(
                    entity,
                    message.clone(),
                    file_type.clone(),
                ));
            }
        }

        // Uploaders hear about a failure the first time it is seen;
        // skipped groups reuse prior rows without re-notifying.
        if !valid {
            accumulator.add_bundle(&file_users, filenames, message);
        }
    } else {
        reuse_prior_rows(group, &check, file_type, &mut result);
    }

    Ok(result)
}

/// Reuse prior statuses and error texts for a skipped group.
///
/// Entities are zipped against the collected prior lists; when the
/// overwrite policy let an unchanged entity clear the flag for a
/// group containing a brand-new entity, the new entity has no prior
/// row and the zip drops it for this run. The next run sees it as
/// missing again.
fn reuse_prior_rows(
    group: &FileGroup,
    check: &GroupCheck,
    file_type: Option<String>,
    result: &mut GroupResult,
) {
    for (entity, status) in group.entities().iter().zip(check.statuses.iter()) {
        result
            .statuses
            .push(ValidationRecord::from_entity(entity, *status, file_type.clone()));
    }
    for (entity, errors) in group.entities().iter().zip(check.errors.iter()) {
        result.errors.push(ErrorRecord::from_entity(
            entity,
            errors.clone(),
            file_type.clone(),
        ));
    }
}
