//! Persistence for EmbeddingJob, including the atomic claim protocol that
//! makes concurrent workers safe (spec §4.3, §9: "non-negotiable").

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{EmbeddingJob, JobStatus};

use super::error::DatabaseError;

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    knowledge_id: Option<Uuid>,
    asset_id: Option<Uuid>,
    status: String,
    retries: i32,
    error: String,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for EmbeddingJob {
    type Error = DatabaseError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => return Err(DatabaseError::decode_failed(format!("unknown job status {other}"))),
        };
        Ok(EmbeddingJob {
            id: row.id,
            knowledge_id: row.knowledge_id,
            asset_id: row.asset_id,
            status,
            retries: row.retries,
            error: row.error,
            created_at: row.created_at,
            processed_at: row.processed_at,
        })
    }
}

pub async fn enqueue_for_knowledge<'e, E>(executor: E, id: Uuid, knowledge_id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO embedding_jobs (id, knowledge_id, asset_id, status) VALUES ($1, $2, NULL, 'pending')",
    )
    .bind(id)
    .bind(knowledge_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn enqueue_for_asset<'e, E>(executor: E, id: Uuid, asset_id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO embedding_jobs (id, knowledge_id, asset_id, status) VALUES ($1, NULL, $2, 'pending')",
    )
    .bind(id)
    .bind(asset_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Atomically select up to `limit` pending jobs FIFO by `created_at`, skipping
/// rows already locked by another worker, and transition each to
/// `processing` in the same statement. No two callers can ever claim the same
/// job (spec §4.3, testable property "claim exclusivity").
pub async fn claim_pending<'e, E>(executor: E, limit: i64) -> Result<Vec<EmbeddingJob>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<JobRow> = sqlx::query_as(
        r#"
        WITH claimed AS (
            SELECT id FROM embedding_jobs
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE embedding_jobs
        SET status = 'processing', error = '', processed_at = NULL, updated_at = now()
        WHERE id IN (SELECT id FROM claimed)
        RETURNING id, knowledge_id, asset_id, status, retries, error, created_at, processed_at
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Recover jobs stuck in `processing` whose last update is older than
/// `stall_threshold`, returning them to `pending` without touching `retries`
/// (the failure mode is worker death, not embedding failure). Uses the same
/// skip-locked claim pattern so it never fights a live worker.
pub async fn reap_stalled<'e, E>(executor: E, stall_threshold_seconds: i64) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        WITH stalled AS (
            SELECT id FROM embedding_jobs
            WHERE status = 'processing'
              AND updated_at < now() - make_interval(secs => $1)
            FOR UPDATE SKIP LOCKED
        )
        UPDATE embedding_jobs
        SET status = 'pending'
        WHERE id IN (SELECT id FROM stalled)
        "#,
    )
    .bind(stall_threshold_seconds as f64)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Mark a job completed; `processed_at = now()`. Idempotent: running this
/// twice on an already-completed job is a no-op at the caller level (the
/// worker never re-processes a job it doesn't hold, per the claim protocol).
pub async fn mark_completed<'e, E>(executor: E, id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE embedding_jobs SET status = 'completed', processed_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Re-queue a job after a transient failure, incrementing `retries`.
pub async fn requeue_with_error<'e, E>(executor: E, id: Uuid, error: &str) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE embedding_jobs SET status = 'pending', retries = retries + 1, error = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(error)
    .execute(executor)
    .await?;
    Ok(())
}

/// Mark a job permanently failed after exhausting retries.
pub async fn mark_failed<'e, E>(executor: E, id: Uuid, error: &str) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE embedding_jobs
        SET status = 'failed', retries = retries + 1, error = $2, processed_at = now(), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(error)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<EmbeddingJob>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<JobRow> = sqlx::query_as(
        "SELECT id, knowledge_id, asset_id, status, retries, error, created_at, processed_at FROM embedding_jobs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

pub async fn count_by_status<'e, E>(executor: E, status: JobStatus) -> Result<i64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM embedding_jobs WHERE status = $1")
        .bind(status.as_str())
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}
