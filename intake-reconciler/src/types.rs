//! Core types for the intake reconciler
//!
//! One center run materializes two coupled snapshots: validation
//! status and error tracking. Records are keyed by the platform
//! entity id; error rows exist only for ids whose status is INVALID.

use chrono::{DateTime, Utc};
use intake_common::TableRow;
use intake_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of entities validated as one unit (a clinical
/// sample/patient pair)
pub const MAX_GROUP_SIZE: usize = 2;

/// Immutable snapshot of one uploaded file entity, taken once per run
/// from the external listing collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntity {
    /// Platform entity id
    pub id: String,
    /// Display name (validation and duplicate policy key on this, not
    /// on the physical path)
    pub name: String,
    /// Content path on the local filesystem
    pub path: String,
    /// Content hash reported by the platform
    pub content_hash: String,
    /// Last-modified timestamp
    pub modified_on: DateTime<Utc>,
    /// Id of the user who last modified the entity
    pub modified_by: String,
    /// Id of the user who created the entity
    pub created_by: String,
    /// Owning center
    pub center: String,
}

/// An ordered sequence of one or two entities validated as one unit.
///
/// Size is checked by the change detector, not here, so that an
/// oversized group aborts the run with a structural error instead of
/// being silently dropped at construction.
#[derive(Debug, Clone, Default)]
pub struct FileGroup {
    entities: Vec<FileEntity>,
}

impl FileGroup {
    pub fn new(entities: Vec<FileEntity>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[FileEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Display names of the grouped entities, in entity order
    pub fn names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }

    /// Content paths of the grouped entities, in entity order
    pub fn paths(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.path.clone()).collect()
    }
}

/// Persisted validation outcome for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Validated,
    Invalid,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Validated => "VALIDATED",
            FileStatus::Invalid => "INVALID",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "VALIDATED" => Ok(FileStatus::Validated),
            "INVALID" => Ok(FileStatus::Invalid),
            other => Err(Error::Internal(format!(
                "Unknown file status in table: {}",
                other
            ))),
        }
    }
}

/// One row of the validation status table, keyed by entity id
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    pub id: String,
    pub path: String,
    pub content_hash: String,
    pub status: FileStatus,
    pub name: String,
    /// Unix epoch milliseconds of the entity's last modification
    pub modified_on: i64,
    /// Resolved file type; None when no format matched the filename
    pub file_type: Option<String>,
    pub center: String,
}

impl ValidationRecord {
    /// Build a record from a run entity plus the validation outcome
    pub fn from_entity(
        entity: &FileEntity,
        status: FileStatus,
        file_type: Option<String>,
    ) -> Self {
        Self {
            id: entity.id.clone(),
            path: entity.path.clone(),
            content_hash: entity.content_hash.clone(),
            status,
            name: entity.name.clone(),
            modified_on: entity.modified_on.timestamp_millis(),
            file_type,
            center: entity.center.clone(),
        }
    }
}

impl TableRow for ValidationRecord {
    fn primary_key(&self) -> &str {
        &self.id
    }
}

/// One row of the error tracking table, keyed by entity id.
///
/// Invariant: a row exists iff the matching validation record has
/// status INVALID. The reconciler enforces this at the end of every
/// run.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub id: String,
    pub errors: String,
    pub name: String,
    pub file_type: Option<String>,
    pub center: String,
}

impl ErrorRecord {
    pub fn from_entity(entity: &FileEntity, errors: String, file_type: Option<String>) -> Self {
        Self {
            id: entity.id.clone(),
            errors,
            name: entity.name.clone(),
            file_type,
            center: entity.center.clone(),
        }
    }
}

impl TableRow for ErrorRecord {
    fn primary_key(&self) -> &str {
        &self.id
    }
}

/// Full in-memory materialization of the validation status table for
/// one center. BTreeMap keying gives one row per id and a
/// deterministic diff order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSnapshot {
    records: BTreeMap<String, ValidationRecord>,
}

impl ValidationSnapshot {
    pub fn from_rows(rows: Vec<ValidationRecord>) -> Self {
        let records = rows.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { records }
    }

    pub fn insert(&mut self, record: ValidationRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<&ValidationRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ValidationRecord> {
        self.records.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ValidationRecord> {
        self.records.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationRecord> {
        self.records.values()
    }

    /// Rows in ascending id order
    pub fn rows(&self) -> Vec<ValidationRecord> {
        self.records.values().cloned().collect()
    }
}

/// Full in-memory materialization of the error tracking table for one
/// center
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSnapshot {
    records: BTreeMap<String, ErrorRecord>,
}

impl ErrorSnapshot {
    pub fn from_rows(rows: Vec<ErrorRecord>) -> Self {
        let records = rows.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { records }
    }

    pub fn insert(&mut self, record: ErrorRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<&ErrorRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ErrorRecord> {
        self.records.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ErrorRecord> {
        self.records.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.values()
    }

    pub fn rows(&self) -> Vec<ErrorRecord> {
        self.records.values().cloned().collect()
    }

    /// Keep only rows the predicate accepts
    pub fn retain<F: FnMut(&ErrorRecord) -> bool>(&mut self, mut keep: F) {
        self.records.retain(|_, record| keep(record));
    }
}

/// Processing mode resolved by the external orchestrator.
///
/// Non-VCF runs never see `.vcf` entities, so prior VCF statuses must
/// not be treated as deleted when loading and diffing snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    Main,
    Vcf,
    Maf,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Main => "main",
            ProcessingMode::Vcf => "vcf",
            ProcessingMode::Maf => "maf",
        }
    }
}

/// How `needs_validation` combines across the entities of one group.
///
/// `Overwrite` reproduces the historical behavior: each entity with a
/// prior status and no prior error row *assigns* the flag, so an
/// unchanged later entity can mask an earlier entity's "new" signal.
/// `Accumulate` ORs the per-entity signals instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevalidationPolicy {
    #[default]
    Overwrite,
    Accumulate,
}

/// Options for one center run, resolved by the external orchestrator
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub center: String,
    pub processing: ProcessingMode,
    pub policy: RevalidationPolicy,
    /// Subject prefix for outbound notifications
    pub subject_prefix: String,
    /// Explicit file type override; skips filename pattern resolution
    pub file_type_override: Option<String>,
    /// Opaque options handed through to format validators
    pub validator_options: serde_json::Value,
}

impl RunOptions {
    pub fn new(center: impl Into<String>, processing: ProcessingMode) -> Self {
        Self {
            center: center.into(),
            processing,
            policy: RevalidationPolicy::default(),
            subject_prefix: "Center Intake Validation Error".to_string(),
            file_type_override: None,
            validator_options: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity(id: &str, name: &str) -> FileEntity {
        FileEntity {
            id: id.to_string(),
            name: name.to_string(),
            path: format!("/input/{}", name),
            content_hash: "abc123".to_string(),
            modified_on: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            modified_by: "user-1".to_string(),
            created_by: "user-2".to_string(),
            center: "SAGE".to_string(),
        }
    }

    #[test]
    fn test_file_status_round_trip() {
        assert_eq!(FileStatus::parse("VALIDATED").unwrap(), FileStatus::Validated);
        assert_eq!(FileStatus::parse("INVALID").unwrap(), FileStatus::Invalid);
        assert!(FileStatus::parse("PENDING").is_err());
    }

    #[test]
    fn test_validation_record_from_entity() {
        let ent = entity("id-1", "data_cna_SAGE.txt");
        let record =
            ValidationRecord::from_entity(&ent, FileStatus::Validated, Some("cna".to_string()));

        assert_eq!(record.id, "id-1");
        assert_eq!(record.status, FileStatus::Validated);
        assert_eq!(record.modified_on, ent.modified_on.timestamp_millis());
        assert_eq!(record.file_type.as_deref(), Some("cna"));
        assert_eq!(record.center, "SAGE");
    }

    #[test]
    fn test_snapshot_keeps_one_row_per_id() {
        let ent = entity("id-1", "a.txt");
        let mut snapshot = ValidationSnapshot::default();
        snapshot.insert(ValidationRecord::from_entity(&ent, FileStatus::Validated, None));
        snapshot.insert(ValidationRecord::from_entity(&ent, FileStatus::Invalid, None));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("id-1").unwrap().status, FileStatus::Invalid);
    }

    #[test]
    fn test_snapshot_rows_sorted_by_id() {
        let mut snapshot = ValidationSnapshot::default();
        for id in ["z", "a", "m"] {
            snapshot.insert(ValidationRecord::from_entity(
                &entity(id, "f.txt"),
                FileStatus::Validated,
                None,
            ));
        }

        let ids: Vec<String> = snapshot.rows().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_group_names_and_paths_in_entity_order() {
        let group = FileGroup::new(vec![
            entity("id-1", "sample.txt"),
            entity("id-2", "patient.txt"),
        ]);
        assert_eq!(group.names(), vec!["sample.txt", "patient.txt"]);
        assert_eq!(
            group.paths(),
            vec!["/input/sample.txt", "/input/patient.txt"]
        );
    }
}
