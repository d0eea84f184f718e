//! Duplicate filename policy
//!
//! Centers must upload files as new versions rather than renaming or
//! scattering copies across folders, so a run-set may never contain
//! two rows with the same display name. Two category rules tighten
//! this further: the cbs/seg family tolerates one file total, and the
//! clinical prefix tolerates at most a sample+patient pair.
//! Duplicates are recomputed every run and override validator
//! outcomes; they are never persisted as their own table.

use crate::services::notification::NotificationAccumulator;
use crate::types::{FileEntity, ValidationSnapshot};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Fixed error text recorded for every duplicated file
pub const DUPLICATED_FILE_MESSAGE: &str =
    "Duplicated filename! Files should be uploaded as new versions \
     and the entire dataset should be uploaded.";

/// Filename suffixes of the copy-number family; these file types must
/// never coexist
const CBS_SEG_SUFFIXES: [&str; 2] = ["cbs", "seg"];

/// Filename prefix of the clinical pair
const CLINICAL_PREFIX: &str = "data_clinical_supp";

/// Scan the run-set for filename collisions.
///
/// A record id qualifies when any rule matches:
/// - its display name is shared with at least one other record,
/// - its name carries a cbs/seg suffix and more than one such record
///   exists,
/// - its name carries the clinical prefix and more than two such
///   records exist.
///
/// Ids are deduplicated (a record hit by several rules counts once)
/// and returned in ascending order.
pub fn find_duplicates(snapshot: &ValidationSnapshot) -> Vec<String> {
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for record in snapshot.iter() {
        *name_counts.entry(record.name.as_str()).or_insert(0) += 1;
    }

    let mut duplicate_ids: BTreeSet<String> = BTreeSet::new();

    for record in snapshot.iter() {
        if name_counts[record.name.as_str()] > 1 {
            duplicate_ids.insert(record.id.clone());
        }
    }

    let cbs_seg: Vec<&str> = snapshot
        .iter()
        .filter(|r| CBS_SEG_SUFFIXES.iter().any(|s| r.name.ends_with(s)))
        .map(|r| r.id.as_str())
        .collect();
    if cbs_seg.len() > 1 {
        duplicate_ids.extend(cbs_seg.into_iter().map(String::from));
    }

    let clinical: Vec<&str> = snapshot
        .iter()
        .filter(|r| r.name.starts_with(CLINICAL_PREFIX))
        .map(|r| r.id.as_str())
        .collect();
    if clinical.len() > 2 {
        duplicate_ids.extend(clinical.into_iter().map(String::from));
    }

    info!(count = duplicate_ids.len(), "Checked run-set for duplicated files");
    duplicate_ids.into_iter().collect()
}

/// Queue one duplicate-filename bundle naming every duplicated file,
/// for the deduplicated union of modifying and creating users across
/// the duplicated entities. Sent every run the duplicate persists,
/// not only on first detection.
pub fn append_duplicate_notifications(
    duplicate_ids: &[String],
    snapshot: &ValidationSnapshot,
    entities: &HashMap<String, FileEntity>,
    accumulator: &mut NotificationAccumulator,
) {
    if duplicate_ids.is_empty() {
        return;
    }

    let mut filenames = Vec::new();
    let mut users = Vec::new();
    for id in duplicate_ids {
        if let Some(record) = snapshot.get(id) {
            filenames.push(record.name.clone());
        }
        if let Some(entity) = entities.get(id) {
            users.push(entity.modified_by.clone());
            users.push(entity.created_by.clone());
        }
    }

    accumulator.add_bundle(&users, filenames, DUPLICATED_FILE_MESSAGE);
}
