//! Package storage repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, warn};

use super::model::{PackageRecord, PackageStats};
use crate::{Error, Result};
use crate::status::PackageStatus;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = r"
    SELECT id, tracking_number, carrier, status, estimated_delivery, item_description,
           email_subject, email_date, tracking_url, email_account, delivered_at,
           created_at, updated_at
    FROM packages
";

/// Repository for package storage and retrieval.
pub struct PackageRepository {
    pool: SqlitePool,
}

impl PackageRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS packages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tracking_number TEXT NOT NULL UNIQUE,
                carrier TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'In Transit',
                estimated_delivery TEXT,
                item_description TEXT NOT NULL DEFAULT '',
                email_subject TEXT NOT NULL DEFAULT '',
                email_date TEXT NOT NULL,
                tracking_url TEXT,
                email_account TEXT,
                delivered_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_packages_carrier ON packages(carrier)",
            "CREATE INDEX IF NOT EXISTS idx_packages_status ON packages(status)",
            "CREATE INDEX IF NOT EXISTS idx_packages_estimated_delivery ON packages(estimated_delivery)",
        ] {
            sqlx::query(index).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Get a package by tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, tracking_number: &str) -> Result<Option<PackageRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE tracking_number = ?"))
            .bind(tracking_number)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Insert a package or overwrite the stored one with the same tracking number.
    ///
    /// The record is written as given; merge policy belongs to
    /// [`reconcile`](crate::reconcile). `id` and `created_at` of an existing row
    /// are preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, record: &PackageRecord) -> Result<PackageRecord> {
        sqlx::query(
            r"
            INSERT INTO packages
                (tracking_number, carrier, status, estimated_delivery, item_description,
                 email_subject, email_date, tracking_url, email_account, delivered_at,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tracking_number) DO UPDATE SET
                carrier = excluded.carrier,
                status = excluded.status,
                estimated_delivery = excluded.estimated_delivery,
                item_description = excluded.item_description,
                email_subject = excluded.email_subject,
                email_date = excluded.email_date,
                tracking_url = excluded.tracking_url,
                email_account = excluded.email_account,
                delivered_at = excluded.delivered_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&record.tracking_number)
        .bind(&record.carrier)
        .bind(record.status.as_str())
        .bind(record.estimated_delivery.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(&record.item_description)
        .bind(&record.email_subject)
        .bind(record.email_date.to_rfc3339())
        .bind(&record.tracking_url)
        .bind(&record.source_account)
        .bind(record.delivered_at.map(|t| t.to_rfc3339()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Upserted {} [{}]", record.tracking_number, record.status);

        self.get(&record.tracking_number)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// All packages, latest estimate first, undated last.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<PackageRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY estimated_delivery IS NULL, estimated_delivery DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(&rows))
    }

    /// Packages that are neither delivered nor cancelled, soonest estimate first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<PackageRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE status NOT IN (?, ?)
             ORDER BY estimated_delivery IS NULL, estimated_delivery ASC"
        ))
        .bind(PackageStatus::Delivered.as_str())
        .bind(PackageStatus::Cancelled.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(&rows))
    }

    /// Packages from one carrier, latest estimate first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_carrier(&self, carrier: &str) -> Result<Vec<PackageRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE carrier = ?
             ORDER BY estimated_delivery IS NULL, estimated_delivery DESC"
        ))
        .bind(carrier)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(&rows))
    }

    /// Search tracking numbers, descriptions and subjects.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<PackageRecord>> {
        let pattern = format!("%{}%", query.replace('%', ""));

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS}
             WHERE tracking_number LIKE ?1 OR item_description LIKE ?1 OR email_subject LIKE ?1
             ORDER BY estimated_delivery IS NULL, estimated_delivery DESC"
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(&rows))
    }

    /// Manually set a package's status.
    ///
    /// Setting `Delivered` stamps `delivered_at` with `now` unless already set.
    /// Returns `None` if no package has this tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn set_status(
        &self,
        tracking_number: &str,
        status: PackageStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<PackageRecord>> {
        let stamp = now.to_rfc3339();

        let updated = sqlx::query(
            r"
            UPDATE packages
            SET status = ?1,
                delivered_at = CASE WHEN ?1 = ?2 THEN COALESCE(delivered_at, ?3) ELSE delivered_at END,
                updated_at = ?3
            WHERE tracking_number = ?4
            ",
        )
        .bind(status.as_str())
        .bind(PackageStatus::Delivered.as_str())
        .bind(&stamp)
        .bind(tracking_number)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(tracking_number).await
    }

    /// Delete a package by id. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM packages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }

    /// Distinct carrier names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn carriers(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT carrier FROM packages ORDER BY carrier")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("carrier")).collect())
    }

    /// Get statistics about stored packages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self) -> Result<PackageStats> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN status NOT IN (?1, ?2) THEN 1 ELSE 0 END), 0) as active,
                COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0) as delivered
            FROM packages
            ",
        )
        .bind(PackageStatus::Delivered.as_str())
        .bind(PackageStatus::Cancelled.as_str())
        .fetch_one(&self.pool)
        .await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(PackageStats {
            total: row.get::<i64, _>("total") as u32,
            active: row.get::<i64, _>("active") as u32,
            delivered: row.get::<i64, _>("delivered") as u32,
        })
    }
}

/// Decode listing rows, skipping any that fail to decode.
fn decode_rows(rows: &[SqliteRow]) -> Vec<PackageRecord> {
    rows.iter()
        .filter_map(|row| {
            row_to_record(row)
                .map_err(|e| warn!("Skipping unreadable package row: {e}"))
                .ok()
        })
        .collect()
}

/// Decode one row. Unparseable stored timestamps or dates are errors, not `None`.
fn row_to_record(row: &SqliteRow) -> Result<PackageRecord> {
    let email_date = DateTime::parse_from_rfc3339(&row.try_get::<String, _>("email_date")?)
        .map_err(|e| column_error("email_date", e))?;

    Ok(PackageRecord {
        id: Some(row.try_get("id")?),
        tracking_number: row.try_get("tracking_number")?,
        carrier: row.try_get("carrier")?,
        status: PackageStatus::parse(row.try_get("status")?),
        estimated_delivery: row
            .try_get::<Option<String>, _>("estimated_delivery")?
            .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
            .transpose()
            .map_err(|e| column_error("estimated_delivery", e))?,
        item_description: row.try_get("item_description")?,
        email_subject: row.try_get("email_subject")?,
        email_date,
        tracking_url: row.try_get("tracking_url")?,
        source_account: row.try_get("email_account")?,
        delivered_at: row
            .try_get::<Option<String>, _>("delivered_at")?
            .map(|s| parse_utc("delivered_at", &s))
            .transpose()?,
        created_at: parse_utc("created_at", &row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_utc("updated_at", &row.try_get::<String, _>("updated_at")?)?,
    })
}

fn parse_utc(column: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| column_error(column, e))
}

fn column_error(column: &str, source: chrono::ParseError) -> Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
    .into()
}
