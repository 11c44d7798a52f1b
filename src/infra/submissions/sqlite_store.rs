// SQLite-backed submission store.
//
// Tables:
// - submissions: every submission ever received, never deleted
//
// Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
// so lexical order matches chronological order. `rowid` breaks ties.

use crate::core::submissions::{
    SortOrder, Submission, SubmissionError, SubmissionId, SubmissionStatus, SubmissionStore,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub struct SqliteSubmissionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSubmissionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and run
    /// migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create the table and its indexes.
    pub async fn migrate(&self) -> Result<(), SubmissionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                lang TEXT NOT NULL DEFAULT 'en',
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_submissions_status_created
                ON submissions(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_submissions_created
                ON submissions(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> SubmissionError {
    SubmissionError::StorageError(e.to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_submission(row: &SqliteRow) -> Result<Submission, SubmissionError> {
    let id_str: String = row.get("id");
    let id = SubmissionId::parse(&id_str).ok_or_else(|| {
        SubmissionError::StorageError(format!("corrupt submission id `{}`", id_str))
    })?;

    let status_str: String = row.get("status");
    let status = SubmissionStatus::from_str(&status_str)
        .map_err(|e| SubmissionError::StorageError(e.to_string()))?;

    let created_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SubmissionError::StorageError(e.to_string()))?;

    Ok(Submission {
        id,
        text: row.get("text"),
        lang: row.get("lang"),
        status,
        created_at,
    })
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn insert(&self, text: &str, lang: &str) -> Result<SubmissionId, SubmissionError> {
        let id = SubmissionId::new();

        sqlx::query(
            r#"
            INSERT INTO submissions (id, text, lang, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(text)
        .bind(lang)
        .bind(SubmissionStatus::Pending.as_str())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(id)
    }

    async fn find_by_status(
        &self,
        status: Option<SubmissionStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Submission>, SubmissionError> {
        let direction = match order {
            SortOrder::OldestFirst => "ASC",
            SortOrder::NewestFirst => "DESC",
        };

        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT id, text, lang, status, created_at FROM submissions \
                     WHERE status = ? ORDER BY created_at {direction}, rowid {direction} LIMIT ?"
                );
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT id, text, lang, status, created_at FROM submissions \
                     ORDER BY created_at {direction}, rowid {direction} LIMIT ?"
                );
                sqlx::query(&sql)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage_error)?;

        rows.iter().map(row_to_submission).collect()
    }

    async fn find_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, SubmissionError> {
        let row = sqlx::query(
            "SELECT id, text, lang, status, created_at FROM submissions WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(row_to_submission).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: SubmissionId,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<bool, SubmissionError> {
        let result = sqlx::query("UPDATE submissions SET status = ? WHERE id = ? AND status = ?")
            .bind(new.as_str())
            .bind(id.to_string())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), SubmissionError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
