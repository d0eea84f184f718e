//! Change detection
//!
//! Decides, per file group, whether (re)validation is required by
//! comparing the group's entities against the prior persisted
//! snapshots. Files whose hash and name are unchanged and whose prior
//! status is clean are skipped; their prior statuses and error texts
//! are collected for reuse.

use crate::types::{
    FileGroup, FileStatus, ErrorSnapshot, RevalidationPolicy, ValidationSnapshot, MAX_GROUP_SIZE,
};
use intake_common::{Error, Result};
use tracing::info;

/// Outcome of checking one file group against the prior snapshots
#[derive(Debug, Clone, Default)]
pub struct GroupCheck {
    /// Prior statuses of entities that already have a record, in
    /// entity order
    pub statuses: Vec<FileStatus>,
    /// Prior error texts of entities that have an error row, in
    /// entity order
    pub errors: Vec<String>,
    /// Whether the group must be handed to its format validator
    pub needs_validation: bool,
}

/// Check one group against the prior snapshots.
///
/// Per-entity rules, applied in entity order:
/// 1. No prior validation record: the flag becomes true.
/// 2. Otherwise collect the prior status. With no prior error row the
///    flag is *assigned* from `prior status == INVALID` under the
///    default [`RevalidationPolicy::Overwrite`], so a later unchanged
///    entity can reset the flag a new earlier entity raised;
///    `Accumulate` ORs instead. With a prior error row, collect the
///    error text (a prior-INVALID id with no error row is absorbed as
///    "no error text available").
/// 3. A changed content hash or display name forces the flag to true.
///
/// A group of more than two entities is a structural error and aborts
/// the center's run.
pub fn check_group(
    group: &FileGroup,
    prior_validation: &ValidationSnapshot,
    prior_errors: &ErrorSnapshot,
    policy: RevalidationPolicy,
) -> Result<GroupCheck> {
    if group.len() > MAX_GROUP_SIZE {
        return Err(Error::Structural(format!(
            "There should never be more than {} files being validated, got {}",
            MAX_GROUP_SIZE,
            group.len()
        )));
    }

    let mut check = GroupCheck::default();

    for entity in group.entities() {
        let prior_record = prior_validation.get(&entity.id);
        let prior_error = prior_errors.get(&entity.id);

        match prior_record {
            None => check.needs_validation = true,
            Some(record) => {
                check.statuses.push(record.status);
                match prior_error {
                    None => {
                        let invalid = record.status == FileStatus::Invalid;
                        check.needs_validation = match policy {
                            RevalidationPolicy::Overwrite => invalid,
                            RevalidationPolicy::Accumulate => check.needs_validation || invalid,
                        };
                    }
                    Some(error) => check.errors.push(error.errors.clone()),
                }

                if record.content_hash != entity.content_hash || record.name != entity.name {
                    check.needs_validation = true;
                } else {
                    info!(
                        file = %entity.name,
                        id = %entity.id,
                        status = record.status.as_str(),
                        "File unchanged since prior run"
                    );
                }
            }
        }
    }

    Ok(check)
}
