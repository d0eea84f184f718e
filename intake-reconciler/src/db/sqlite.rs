//! SQLite-backed status store
//!
//! Reference implementation of [`StatusStore`](super::StatusStore).
//! Physical table names are resolved through a logical-name mapping
//! table, mirroring how the remote platform locates its tables, so
//! embedders can repoint either table without code changes.

use super::StatusStore;
use crate::types::{
    ErrorRecord, ErrorSnapshot, FileStatus, ProcessingMode, ValidationRecord, ValidationSnapshot,
};
use async_trait::async_trait;
use intake_common::{Error, Result, TableDiff};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Logical name of the validation status table in the mapping
pub const LOGICAL_VALIDATION_STATUS: &str = "validationStatus";
/// Logical name of the error tracking table in the mapping
pub const LOGICAL_ERROR_TRACKER: &str = "errorTracker";

/// Physical table names resolved from the logical-name mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub validation_status: String,
    pub error_tracking: String,
}

impl Default for TableMapping {
    fn default() -> Self {
        Self {
            validation_status: "validation_status".to_string(),
            error_tracking: "error_tracking".to_string(),
        }
    }
}

/// Initialize the database: mapping table, default mapping rows, and
/// the two status tables. Returns the resolved mapping.
pub async fn init_database(pool: &SqlitePool) -> Result<TableMapping> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_mapping (
            logical_name TEXT PRIMARY KEY,
            table_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let defaults = TableMapping::default();
    for (logical, physical) in [
        (LOGICAL_VALIDATION_STATUS, defaults.validation_status.as_str()),
        (LOGICAL_ERROR_TRACKER, defaults.error_tracking.as_str()),
    ] {
        sqlx::query(
            "INSERT OR IGNORE INTO table_mapping (logical_name, table_name) VALUES (?, ?)",
        )
        .bind(logical)
        .bind(physical)
        .execute(pool)
        .await?;
    }

    let mapping = load_table_mapping(pool).await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            status TEXT NOT NULL,
            name TEXT NOT NULL,
            modified_on INTEGER NOT NULL,
            file_type TEXT,
            center TEXT NOT NULL
        )
        "#,
        mapping.validation_status
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY,
            errors TEXT NOT NULL,
            name TEXT NOT NULL,
            file_type TEXT,
            center TEXT NOT NULL
        )
        "#,
        mapping.error_tracking
    ))
    .execute(pool)
    .await?;

    info!(
        validation_status = %mapping.validation_status,
        error_tracking = %mapping.error_tracking,
        "Status tables initialized"
    );
    Ok(mapping)
}

/// Resolve physical table names from the mapping table
pub async fn load_table_mapping(pool: &SqlitePool) -> Result<TableMapping> {
    let lookup = |logical: &'static str| async move {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT table_name FROM table_mapping WHERE logical_name = ?")
                .bind(logical)
                .fetch_optional(pool)
                .await?;
        row.map(|(name,)| name).ok_or_else(|| {
            Error::Config(format!("No table mapping entry for '{}'", logical))
        })
    };

    Ok(TableMapping {
        validation_status: lookup(LOGICAL_VALIDATION_STATUS).await?,
        error_tracking: lookup(LOGICAL_ERROR_TRACKER).await?,
    })
}

/// SQLite status store
pub struct SqliteStatusStore {
    pool: SqlitePool,
    mapping: TableMapping,
}

impl SqliteStatusStore {
    pub fn new(pool: SqlitePool, mapping: TableMapping) -> Self {
        Self { pool, mapping }
    }

    /// Open against an initialized database, resolving the mapping
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        let mapping = load_table_mapping(&pool).await?;
        Ok(Self::new(pool, mapping))
    }

    fn vcf_filter(processing: ProcessingMode) -> &'static str {
        // Non-VCF runs never list .vcf entities; excluding their rows
        // here keeps the diff from deleting their statuses.
        if processing == ProcessingMode::Vcf {
            ""
        } else {
            "AND name NOT LIKE '%.vcf'"
        }
    }

    async fn apply_validation_rows(
        &self,
        diff: &TableDiff<ValidationRecord>,
    ) -> std::result::Result<(), sqlx::Error> {
        let table = &self.mapping.validation_status;
        let mut tx = self.pool.begin().await?;

        for record in &diff.inserts {
            sqlx::query(&format!(
                "INSERT INTO {} (id, path, content_hash, status, name, modified_on, file_type, center) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                table
            ))
            .bind(&record.id)
            .bind(&record.path)
            .bind(&record.content_hash)
            .bind(record.status.as_str())
            .bind(&record.name)
            .bind(record.modified_on)
            .bind(&record.file_type)
            .bind(&record.center)
            .execute(&mut *tx)
            .await?;
        }

        for record in &diff.updates {
            sqlx::query(&format!(
                "UPDATE {} SET path = ?, content_hash = ?, status = ?, name = ?, \
                 modified_on = ?, file_type = ?, center = ? WHERE id = ?",
                table
            ))
            .bind(&record.path)
            .bind(&record.content_hash)
            .bind(record.status.as_str())
            .bind(&record.name)
            .bind(record.modified_on)
            .bind(&record.file_type)
            .bind(&record.center)
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;
        }

        for id in &diff.deletes {
            sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }

    async fn apply_error_rows(
        &self,
        diff: &TableDiff<ErrorRecord>,
    ) -> std::result::Result<(), sqlx::Error> {
        let table = &self.mapping.error_tracking;
        let mut tx = self.pool.begin().await?;

        for record in &diff.inserts {
            sqlx::query(&format!(
                "INSERT INTO {} (id, errors, name, file_type, center) VALUES (?, ?, ?, ?, ?)",
                table
            ))
            .bind(&record.id)
            .bind(&record.errors)
            .bind(&record.name)
            .bind(&record.file_type)
            .bind(&record.center)
            .execute(&mut *tx)
            .await?;
        }

        for record in &diff.updates {
            sqlx::query(&format!(
                "UPDATE {} SET errors = ?, name = ?, file_type = ?, center = ? WHERE id = ?",
                table
            ))
            .bind(&record.errors)
            .bind(&record.name)
            .bind(&record.file_type)
            .bind(&record.center)
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;
        }

        for id in &diff.deletes {
            sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn load_validation_snapshot(
        &self,
        center: &str,
        processing: ProcessingMode,
    ) -> Result<ValidationSnapshot> {
        let rows = sqlx::query(&format!(
            "SELECT id, path, content_hash, status, name, modified_on, file_type, center \
             FROM {} WHERE center = ? {}",
            self.mapping.validation_status,
            Self::vcf_filter(processing)
        ))
        .bind(center)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            records.push(ValidationRecord {
                id: row.try_get("id")?,
                path: row.try_get("path")?,
                content_hash: row.try_get("content_hash")?,
                status: FileStatus::parse(&status)?,
                name: row.try_get("name")?,
                modified_on: row.try_get("modified_on")?,
                file_type: row.try_get("file_type")?,
                center: row.try_get("center")?,
            });
        }

        debug!(center = %center, rows = records.len(), "Loaded validation status snapshot");
        Ok(ValidationSnapshot::from_rows(records))
    }

    async fn load_error_snapshot(
        &self,
        center: &str,
        processing: ProcessingMode,
    ) -> Result<ErrorSnapshot> {
        let rows = sqlx::query(&format!(
            "SELECT id, errors, name, file_type, center FROM {} WHERE center = ? {}",
            self.mapping.error_tracking,
            Self::vcf_filter(processing)
        ))
        .bind(center)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(ErrorRecord {
                id: row.try_get("id")?,
                errors: row.try_get("errors")?,
                name: row.try_get("name")?,
                file_type: row.try_get("file_type")?,
                center: row.try_get("center")?,
            });
        }

        debug!(center = %center, rows = records.len(), "Loaded error tracking snapshot");
        Ok(ErrorSnapshot::from_rows(records))
    }

    async fn apply_validation_diff(&self, diff: &TableDiff<ValidationRecord>) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        self.apply_validation_rows(diff)
            .await
            .map_err(|source| Error::Persistence {
                table: self.mapping.validation_status.clone(),
                source,
            })?;
        info!(
            table = %self.mapping.validation_status,
            inserts = diff.inserts.len(),
            updates = diff.updates.len(),
            deletes = diff.deletes.len(),
            "Validation status diff applied"
        );
        Ok(())
    }

    async fn apply_error_diff(&self, diff: &TableDiff<ErrorRecord>) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        self.apply_error_rows(diff)
            .await
            .map_err(|source| Error::Persistence {
                table: self.mapping.error_tracking.clone(),
                source,
            })?;
        info!(
            table = %self.mapping.error_tracking,
            inserts = diff.inserts.len(),
            updates = diff.updates.len(),
            deletes = diff.deletes.len(),
            "Error tracking diff applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_common::diff_rows;

    async fn setup() -> SqliteStatusStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let mapping = init_database(&pool).await.unwrap();
        SqliteStatusStore::new(pool, mapping)
    }

    fn validation_row(id: &str, name: &str, center: &str) -> ValidationRecord {
        ValidationRecord {
            id: id.to_string(),
            path: format!("/input/{}", name),
            content_hash: "hash-a".to_string(),
            status: FileStatus::Validated,
            name: name.to_string(),
            modified_on: 1_714_500_000_000,
            file_type: Some("cna".to_string()),
            center: center.to_string(),
        }
    }

    fn error_row(id: &str, name: &str, center: &str) -> ErrorRecord {
        ErrorRecord {
            id: id.to_string(),
            errors: "bad column".to_string(),
            name: name.to_string(),
            file_type: Some("cna".to_string()),
            center: center.to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_mapping_seeded() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let mapping = init_database(&pool).await.unwrap();
        assert_eq!(mapping, TableMapping::default());
    }

    #[tokio::test]
    async fn test_custom_mapping_respected() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE table_mapping (logical_name TEXT PRIMARY KEY, table_name TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO table_mapping VALUES ('validationStatus', 'vs_custom')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO table_mapping VALUES ('errorTracker', 'et_custom')")
            .execute(&pool)
            .await
            .unwrap();

        let mapping = init_database(&pool).await.unwrap();
        assert_eq!(mapping.validation_status, "vs_custom");
        assert_eq!(mapping.error_tracking, "et_custom");

        // Tables created under the custom names are usable
        let store = SqliteStatusStore::new(pool, mapping);
        let snapshot = store
            .load_validation_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_validation_rows() {
        let store = setup().await;
        let rows = vec![
            validation_row("1", "a.txt", "SAGE"),
            validation_row("2", "b.txt", "SAGE"),
        ];
        let diff = diff_rows(&[], &rows, true);
        store.apply_validation_diff(&diff).await.unwrap();

        let snapshot = store
            .load_validation_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("1").unwrap().name, "a.txt");
    }

    #[tokio::test]
    async fn test_update_and_delete_applied() {
        let store = setup().await;
        let prior = vec![
            validation_row("1", "a.txt", "SAGE"),
            validation_row("2", "b.txt", "SAGE"),
        ];
        store
            .apply_validation_diff(&diff_rows(&[], &prior, true))
            .await
            .unwrap();

        let mut changed = validation_row("1", "a.txt", "SAGE");
        changed.status = FileStatus::Invalid;
        let new = vec![changed.clone()];
        store
            .apply_validation_diff(&diff_rows(&prior, &new, true))
            .await
            .unwrap();

        let snapshot = store
            .load_validation_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("1").unwrap().status, FileStatus::Invalid);
        assert!(!snapshot.contains("2"));
    }

    #[tokio::test]
    async fn test_center_scoping() {
        let store = setup().await;
        let rows = vec![
            validation_row("1", "a.txt", "SAGE"),
            validation_row("2", "b.txt", "OTHER"),
        ];
        store
            .apply_validation_diff(&diff_rows(&[], &rows, true))
            .await
            .unwrap();

        let snapshot = store
            .load_validation_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("1"));
    }

    #[tokio::test]
    async fn test_vcf_rows_hidden_outside_vcf_mode() {
        let store = setup().await;
        let rows = vec![
            validation_row("1", "a.txt", "SAGE"),
            validation_row("2", "sample.vcf", "SAGE"),
        ];
        store
            .apply_validation_diff(&diff_rows(&[], &rows, true))
            .await
            .unwrap();

        let main = store
            .load_validation_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert!(!main.contains("2"));

        let vcf = store
            .load_validation_snapshot("SAGE", ProcessingMode::Vcf)
            .await
            .unwrap();
        assert!(vcf.contains("2"));
    }

    #[tokio::test]
    async fn test_error_rows_round_trip() {
        let store = setup().await;
        let rows = vec![error_row("1", "a.txt", "SAGE")];
        store
            .apply_error_diff(&diff_rows(&[], &rows, true))
            .await
            .unwrap();

        let snapshot = store
            .load_error_snapshot("SAGE", ProcessingMode::Main)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("1").unwrap().errors, "bad column");
    }

    #[tokio::test]
    async fn test_empty_diff_is_noop() {
        let store = setup().await;
        let diff = TableDiff::<ValidationRecord>::default();
        store.apply_validation_diff(&diff).await.unwrap();
    }
}
