//! Persistence for Asset metadata and the weak Knowledge<->Asset link.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Asset, NewAsset};

use super::error::DatabaseError;

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    org_id: Uuid,
    project_id: Option<Uuid>,
    filename: String,
    mime_type: String,
    sha256: String,
    storage_key: String,
    keywords: Vec<String>,
    description: String,
    embedding: Option<Vector>,
    created_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            org_id: row.org_id,
            project_id: row.project_id,
            filename: row.filename,
            mime_type: row.mime_type,
            sha256: row.sha256,
            storage_key: row.storage_key,
            keywords: row.keywords,
            description: row.description,
            embedding: row.embedding.map(|v| v.to_vec()),
            created_at: row.created_at,
        }
    }
}

const ASSET_COLUMNS: &str = "id, org_id, project_id, filename, mime_type, sha256, storage_key, keywords, description, embedding, created_at";

pub async fn insert<'e, E>(executor: E, id: Uuid, new: &NewAsset) -> Result<Asset, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO assets (id, org_id, project_id, filename, mime_type, sha256, storage_key, keywords, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ASSET_COLUMNS}
        "#
    );
    let row: AssetRow = sqlx::query_as(&sql)
        .bind(id)
        .bind(new.org_id)
        .bind(new.project_id)
        .bind(&new.filename)
        .bind(&new.mime_type)
        .bind(&new.sha256)
        .bind(&new.storage_key)
        .bind(&new.keywords)
        .bind(&new.description)
        .fetch_one(executor)
        .await?;
    Ok(row.into())
}

pub async fn get_by_id<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<Option<Asset>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 AND org_id = $2");
    let row: Option<AssetRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(org_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(Into::into))
}

/// Load by id alone, with no org filter. Used only by the embedding worker
/// (see [`crate::db::knowledge_store::get_by_id_any_org`] for the rationale).
pub async fn get_by_id_any_org<'e, E>(executor: E, id: Uuid) -> Result<Option<Asset>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1");
    let row: Option<AssetRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(Into::into))
}

pub async fn store_embedding<'e, E>(executor: E, id: Uuid, embedding: &[f32]) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE assets SET embedding = $2 WHERE id = $1")
        .bind(id)
        .bind(Vector::from(embedding.to_vec()))
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("DELETE FROM assets WHERE id = $1 AND org_id = $2")
        .bind(id)
        .bind(org_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn link_to_knowledge<'e, E>(executor: E, knowledge_id: Uuid, asset_id: Uuid) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO knowledge_assets (knowledge_id, asset_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(knowledge_id)
    .bind(asset_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// A chunk-shaped hit over assets for the search engine's RRF fusion (assets
/// have no sub-chunks, so each asset contributes at most one hit per list).
#[derive(Debug, Clone)]
pub struct AssetHit {
    pub asset_id: Uuid,
    pub filename: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub raw_score: f32,
}

pub async fn semantic_search<'e, E>(
    executor: E,
    org_id: Uuid,
    project_id: Option<Uuid>,
    query_embedding: &[f32],
    limit: i64,
) -> Result<Vec<AssetHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        "SELECT id, filename, description, created_at, 1.0 - (embedding <=> ",
    );
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(") AS score FROM assets WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND embedding IS NOT NULL");
    if let Some(project_id) = project_id {
        builder.push(" AND project_id = ");
        builder.push_bind(project_id);
    }
    builder.push(" ORDER BY embedding <=> ");
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(" ASC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| AssetHit {
            asset_id: r.0,
            filename: r.1,
            description: r.2,
            created_at: r.3,
            raw_score: r.4 as f32,
        })
        .collect())
}

pub async fn lexical_search<'e, E>(
    executor: E,
    org_id: Uuid,
    project_id: Option<Uuid>,
    query: &str,
    limit: i64,
) -> Result<Vec<AssetHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT id, filename, description, created_at,
               ts_rank(search_index, websearch_to_tsquery('english', "#,
    );
    builder.push_bind(query);
    builder.push(")) AS score FROM assets WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND search_index @@ websearch_to_tsquery('english', ");
    builder.push_bind(query);
    builder.push(")");
    if let Some(project_id) = project_id {
        builder.push(" AND project_id = ");
        builder.push_bind(project_id);
    }
    builder.push(" ORDER BY score DESC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| AssetHit {
            asset_id: r.0,
            filename: r.1,
            description: r.2,
            created_at: r.3,
            raw_score: r.4 as f32,
        })
        .collect())
}
