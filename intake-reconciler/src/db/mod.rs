//! Persisted table access
//!
//! The remote table platform is an external collaborator; the core
//! only needs the [`StatusStore`] seam: load both center-scoped
//! snapshots at the start of a run, apply each table's diff at the
//! end. A SQLite-backed reference implementation is bundled for
//! embedders and tests.

pub mod sqlite;

pub use sqlite::{init_database, load_table_mapping, SqliteStatusStore, TableMapping};

use crate::types::{ErrorRecord, ErrorSnapshot, ProcessingMode, ValidationRecord, ValidationSnapshot};
use async_trait::async_trait;
use intake_common::{Result, TableDiff};

/// External storage collaborator for the two persisted tables.
///
/// Contract: within one run the error diff is applied before the
/// validation diff, and there is no cross-table transaction. A
/// failure between the two writes must surface to the operator as a
/// persistence error naming the table; it is never retried here.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Load the prior validation status snapshot for a center.
    ///
    /// Outside VCF processing runs, `.vcf` rows are excluded so their
    /// statuses are not wiped by the diff.
    async fn load_validation_snapshot(
        &self,
        center: &str,
        processing: ProcessingMode,
    ) -> Result<ValidationSnapshot>;

    /// Load the prior error tracking snapshot for a center
    async fn load_error_snapshot(
        &self,
        center: &str,
        processing: ProcessingMode,
    ) -> Result<ErrorSnapshot>;

    /// Apply a diff against the validation status table
    async fn apply_validation_diff(&self, diff: &TableDiff<ValidationRecord>) -> Result<()>;

    /// Apply a diff against the error tracking table
    async fn apply_error_diff(&self, diff: &TableDiff<ErrorRecord>) -> Result<()>;
}
