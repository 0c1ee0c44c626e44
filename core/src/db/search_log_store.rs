//! Persistence for SearchLogEntry, the optional click-through observability record.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{SearchLogEntry, SearchLogResult};

use super::error::DatabaseError;

pub async fn insert<'e, E>(
    executor: E,
    id: Uuid,
    org_id: Uuid,
    project_id: Option<Uuid>,
    query: &str,
    filters: &Value,
    mode: &str,
    limit: i32,
    results: &[SearchLogResult],
    duration_ms: i64,
) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    let results_json = serde_json::to_value(results).map_err(|e| DatabaseError::decode_failed(e.to_string()))?;
    sqlx::query(
        r#"
        INSERT INTO search_logs (id, org_id, project_id, query, filters, mode, "limit", results, duration_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(org_id)
    .bind(project_id)
    .bind(query)
    .bind(filters)
    .bind(mode)
    .bind(limit)
    .bind(results_json)
    .bind(duration_ms)
    .execute(executor)
    .await?;
    Ok(())
}

/// Record which result a client ultimately used, for offline evaluation.
pub async fn record_choice<'e, E>(
    executor: E,
    org_id: Uuid,
    search_id: Uuid,
    chosen_id: Uuid,
    chosen_source: &str,
) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE search_logs SET chosen_id = $3, chosen_source = $4 WHERE id = $1 AND org_id = $2",
    )
    .bind(search_id)
    .bind(org_id)
    .bind(chosen_id)
    .bind(chosen_source)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_by_id<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<Option<SearchLogEntry>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
        org_id: Uuid,
        project_id: Option<Uuid>,
        query: String,
        filters: Value,
        mode: String,
        limit: i32,
        results: Value,
        duration_ms: i64,
        created_at: DateTime<Utc>,
        chosen_id: Option<Uuid>,
        chosen_source: Option<String>,
    }

    let row: Option<Row> = sqlx::query_as(
        r#"
        SELECT id, org_id, project_id, query, filters, mode, "limit", results, duration_ms,
               created_at, chosen_id, chosen_source
        FROM search_logs WHERE id = $1 AND org_id = $2
        "#,
    )
    .bind(id)
    .bind(org_id)
    .fetch_optional(executor)
    .await?;

    row.map(|r| {
        let results: Vec<SearchLogResult> =
            serde_json::from_value(r.results).map_err(|e| DatabaseError::decode_failed(e.to_string()))?;
        Ok(SearchLogEntry {
            id: r.id,
            org_id: r.org_id,
            project_id: r.project_id,
            query: r.query,
            filters: r.filters,
            mode: r.mode,
            limit: r.limit,
            results,
            duration_ms: r.duration_ms,
            created_at: r.created_at,
            chosen_id: r.chosen_id,
            chosen_source: r.chosen_source,
        })
    })
    .transpose()
}
