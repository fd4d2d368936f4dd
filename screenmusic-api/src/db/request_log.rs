//! Persistent request log
//!
//! Each dispatched request gets one `api_requests` row: written when the
//! dispatcher starts (its guid is the correlation id) and completed with the
//! response status when the dispatcher concludes.

use async_trait::async_trait;
use chrono::Utc;
use screenmusic_common::{CorrelationId, RequestLog, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Request log backed by the `api_requests` table
#[derive(Debug, Clone)]
pub struct SqliteRequestLog {
    pool: SqlitePool,
}

impl SqliteRequestLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLog for SqliteRequestLog {
    async fn begin_request(&self, method: &str, path: &str) -> Result<CorrelationId> {
        let correlation_id = CorrelationId::generate();

        sqlx::query(
            r#"
            INSERT INTO api_requests (guid, method, path, started_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(correlation_id.to_string())
        .bind(method)
        .bind(path)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(correlation_id)
    }

    async fn finish_request(&self, correlation_id: CorrelationId, status: u16) -> Result<()> {
        sqlx::query("UPDATE api_requests SET status = ?, finished_at = ? WHERE guid = ?")
            .bind(i64::from(status))
            .bind(Utc::now().to_rfc3339())
            .bind(correlation_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// One `api_requests` row
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub correlation_id: CorrelationId,
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// Load the log entry for a correlation id
pub async fn load_request(
    pool: &SqlitePool,
    correlation_id: CorrelationId,
) -> Result<Option<RequestRecord>> {
    let row = sqlx::query(
        r#"
        SELECT guid, method, path, status, started_at, finished_at
        FROM api_requests
        WHERE guid = ?
        "#,
    )
    .bind(correlation_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let guid: String = row.get("guid");
    let guid = Uuid::parse_str(&guid).map_err(|e| {
        screenmusic_common::Error::Internal(format!("Corrupt request guid {}: {}", guid, e))
    })?;
    let status: Option<i64> = row.get("status");

    Ok(Some(RequestRecord {
        correlation_id: CorrelationId::from(guid),
        method: row.get("method"),
        path: row.get("path"),
        status: status.and_then(|s| u16::try_from(s).ok()),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    }))
}

/// Number of logged requests
pub async fn count_requests(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM api_requests")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
