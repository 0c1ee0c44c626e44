//! Persistence for ApiKey issuance, lookup, and revocation.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::ApiKey;

use super::error::DatabaseError;

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    key_hash: String,
    created_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        ApiKey {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            key_hash: row.key_hash,
            created_at: row.created_at,
            revoked_at: row.revoked_at,
        }
    }
}

pub async fn insert<'e, E>(
    executor: E,
    id: Uuid,
    org_id: Uuid,
    name: &str,
    key_hash: &str,
) -> Result<ApiKey, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: ApiKeyRow = sqlx::query_as(
        r#"
        INSERT INTO api_keys (id, org_id, name, key_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, org_id, name, key_hash, created_at, revoked_at
        "#,
    )
    .bind(id)
    .bind(org_id)
    .bind(name)
    .bind(key_hash)
    .fetch_one(executor)
    .await?;
    Ok(row.into())
}

pub async fn get_by_hash<'e, E>(executor: E, key_hash: &str) -> Result<Option<ApiKey>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<ApiKeyRow> = sqlx::query_as(
        "SELECT id, org_id, name, key_hash, created_at, revoked_at FROM api_keys WHERE key_hash = $1",
    )
    .bind(key_hash)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(Into::into))
}

/// Monotonic revocation: sets `revoked_at` only if it isn't already set.
pub async fn revoke<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE api_keys SET revoked_at = now() WHERE id = $1 AND org_id = $2 AND revoked_at IS NULL",
    )
    .bind(id)
    .bind(org_id)
    .execute(executor)
    .await?;
    Ok(())
}
