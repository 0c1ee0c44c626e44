//! Persistence for Knowledge and its immutable KnowledgeVersion history.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Knowledge, KnowledgeStatus, KnowledgeType, KnowledgeVersion, NewKnowledge};

use super::error::DatabaseError;

#[derive(sqlx::FromRow)]
struct KnowledgeRow {
    id: Uuid,
    org_id: Uuid,
    project_id: Option<Uuid>,
    knowledge_type: String,
    status: String,
    title: String,
    summary: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    scope: Option<String>,
    embedding: Option<Vector>,
}

impl TryFrom<KnowledgeRow> for Knowledge {
    type Error = DatabaseError;

    fn try_from(row: KnowledgeRow) -> Result<Self, Self::Error> {
        Ok(Knowledge {
            id: row.id,
            org_id: row.org_id,
            project_id: row.project_id,
            knowledge_type: row
                .knowledge_type
                .parse::<KnowledgeType>()
                .map_err(|e| DatabaseError::decode_failed(e.to_string()))?,
            status: row
                .status
                .parse::<KnowledgeStatus>()
                .map_err(|e| DatabaseError::decode_failed(e.to_string()))?,
            title: row.title,
            summary: row.summary,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
            scope: row.scope,
            embedding: row.embedding.map(|v| v.to_vec()),
        })
    }
}

/// Insert a brand-new Knowledge row with `status = draft`. Part of the
/// single-transaction `Create` path (spec §4.1); callers pass a
/// `&mut Transaction` alongside the version and job inserts.
#[allow(clippy::too_many_arguments)]
pub async fn insert<'e, E>(executor: E, id: Uuid, new: &NewKnowledge) -> Result<Knowledge, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: KnowledgeRow = sqlx::query_as(
        r#"
        INSERT INTO knowledge (id, org_id, project_id, knowledge_type, status, title, summary, body, scope)
        VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8)
        RETURNING id, org_id, project_id, knowledge_type, status, title, summary, body,
                  created_at, updated_at, scope, embedding
        "#,
    )
    .bind(id)
    .bind(new.org_id)
    .bind(new.project_id)
    .bind(new.knowledge_type.as_str())
    .bind(&new.title)
    .bind(&new.summary)
    .bind(&new.body)
    .bind(&new.scope)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

pub async fn get_by_id<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<Option<Knowledge>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<KnowledgeRow> = sqlx::query_as(
        r#"
        SELECT id, org_id, project_id, knowledge_type, status, title, summary, body,
               created_at, updated_at, scope, embedding
        FROM knowledge
        WHERE id = $1 AND org_id = $2
        "#,
    )
    .bind(id)
    .bind(org_id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Overwrite the mutable fields of a Knowledge row, bumping `updated_at`.
/// Never called once `status = deprecated` — enforced by the service layer,
/// which checks status before starting the transaction.
pub async fn update_fields<'e, E>(
    executor: E,
    org_id: Uuid,
    id: Uuid,
    title: &str,
    summary: &str,
    body: &str,
    scope: &Option<String>,
) -> Result<Knowledge, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: KnowledgeRow = sqlx::query_as(
        r#"
        UPDATE knowledge
        SET title = $3, summary = $4, body = $5, scope = $6, updated_at = now()
        WHERE id = $1 AND org_id = $2
        RETURNING id, org_id, project_id, knowledge_type, status, title, summary, body,
                  created_at, updated_at, scope, embedding
        "#,
    )
    .bind(id)
    .bind(org_id)
    .bind(title)
    .bind(summary)
    .bind(body)
    .bind(scope)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Transition to `deprecated`, bumping `updated_at`. Terminal — the only
/// supported removal path (spec §4.1).
pub async fn deprecate<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<Knowledge, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: KnowledgeRow = sqlx::query_as(
        r#"
        UPDATE knowledge
        SET status = 'deprecated', updated_at = now()
        WHERE id = $1 AND org_id = $2
        RETURNING id, org_id, project_id, knowledge_type, status, title, summary, body,
                  created_at, updated_at, scope, embedding
        "#,
    )
    .bind(id)
    .bind(org_id)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Load by id alone, with no org filter. Used only by the embedding worker,
/// which already knows the target was enqueued under the correct org at
/// write time and never receives caller-supplied org_id to check against.
pub async fn get_by_id_any_org<'e, E>(executor: E, id: Uuid) -> Result<Option<Knowledge>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<KnowledgeRow> = sqlx::query_as(
        r#"
        SELECT id, org_id, project_id, knowledge_type, status, title, summary, body,
               created_at, updated_at, scope, embedding
        FROM knowledge
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Store the document-level embedding produced by the pipeline.
pub async fn store_embedding<'e, E>(executor: E, id: Uuid, embedding: &[f32]) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE knowledge SET embedding = $2 WHERE id = $1")
        .bind(id)
        .bind(Vector::from(embedding.to_vec()))
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn insert_version<'e, E>(
    executor: E,
    id: Uuid,
    knowledge_id: Uuid,
    version_number: i32,
    title: &str,
    summary: &str,
    body: &str,
) -> Result<KnowledgeVersion, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, (Uuid, Uuid, i32, String, String, String, DateTime<Utc>)>(
        r#"
        INSERT INTO knowledge_versions (id, knowledge_id, version_number, title, summary, body)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, knowledge_id, version_number, title, summary, body, created_at
        "#,
    )
    .bind(id)
    .bind(knowledge_id)
    .bind(version_number)
    .bind(title)
    .bind(summary)
    .bind(body)
    .fetch_one(executor)
    .await?;

    Ok(KnowledgeVersion {
        id: row.0,
        knowledge_id: row.1,
        version_number: row.2,
        title: row.3,
        summary: row.4,
        body: row.5,
        created_at: row.6,
    })
}

/// Latest version number for `knowledge_id`, or 0 if none exist yet.
pub async fn latest_version_number<'e, E>(executor: E, knowledge_id: Uuid) -> Result<i32, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: (Option<i32>,) =
        sqlx::query_as("SELECT MAX(version_number) FROM knowledge_versions WHERE knowledge_id = $1")
            .bind(knowledge_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.unwrap_or(0))
}

pub async fn list_versions<'e, E>(executor: E, knowledge_id: Uuid) -> Result<Vec<KnowledgeVersion>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, (Uuid, Uuid, i32, String, String, String, DateTime<Utc>)>(
        r#"
        SELECT id, knowledge_id, version_number, title, summary, body, created_at
        FROM knowledge_versions
        WHERE knowledge_id = $1
        ORDER BY version_number ASC
        "#,
    )
    .bind(knowledge_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| KnowledgeVersion {
            id: row.0,
            knowledge_id: row.1,
            version_number: row.2,
            title: row.3,
            summary: row.4,
            body: row.5,
            created_at: row.6,
        })
        .collect())
}

/// Document-level hit, used by the search engine when a knowledge item has
/// no chunks yet (e.g. its first embedding job hasn't run) to fall back on.
#[derive(Debug, Clone)]
pub struct KnowledgeDocHit {
    pub knowledge_id: Uuid,
    pub title: String,
    pub scope: Option<String>,
    pub body: String,
    pub updated_at: DateTime<Utc>,
    pub raw_score: f32,
}

/// Filters shared by the document-level fallback paths; mirrors
/// [`crate::db::chunk_store::ChunkFilters`] but applies directly to `knowledge`.
#[derive(Debug, Clone, Default)]
pub struct DocFilters {
    pub project_id: Option<Uuid>,
    pub knowledge_type: Option<KnowledgeType>,
    pub status: Option<KnowledgeStatus>,
    pub path_prefix: Option<String>,
}

fn push_doc_filters(builder: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filters: &DocFilters) {
    if let Some(project_id) = filters.project_id {
        builder.push(" AND project_id = ");
        builder.push_bind(project_id);
    }
    if let Some(knowledge_type) = filters.knowledge_type {
        builder.push(" AND knowledge_type = ");
        builder.push_bind(knowledge_type.as_str());
    }
    if let Some(status) = filters.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(path_prefix) = &filters.path_prefix {
        builder.push(" AND scope IS NOT NULL AND scope LIKE ");
        builder.push_bind(format!("{}%", path_prefix.trim_end_matches('/')));
    }
}

pub async fn semantic_search_documents<'e, E>(
    executor: E,
    org_id: Uuid,
    query_embedding: &[f32],
    filters: &DocFilters,
    limit: i64,
) -> Result<Vec<KnowledgeDocHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        "SELECT id, title, scope, body, updated_at, 1.0 - (embedding <=> ",
    );
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(") AS score FROM knowledge WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND embedding IS NOT NULL");
    push_doc_filters(&mut builder, filters);
    builder.push(" ORDER BY embedding <=> ");
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(" ASC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, Option<String>, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| KnowledgeDocHit {
            knowledge_id: r.0,
            title: r.1,
            scope: r.2,
            body: r.3,
            updated_at: r.4,
            raw_score: r.5 as f32,
        })
        .collect())
}

pub async fn lexical_search_documents<'e, E>(
    executor: E,
    org_id: Uuid,
    query: &str,
    filters: &DocFilters,
    limit: i64,
) -> Result<Vec<KnowledgeDocHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT id, title, scope, body, updated_at,
               ts_rank(search_index, websearch_to_tsquery('english', "#,
    );
    builder.push_bind(query);
    builder.push(")) AS score FROM knowledge WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND search_index @@ websearch_to_tsquery('english', ");
    builder.push_bind(query);
    builder.push(")");
    push_doc_filters(&mut builder, filters);
    builder.push(" ORDER BY score DESC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, Option<String>, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| KnowledgeDocHit {
            knowledge_id: r.0,
            title: r.1,
            scope: r.2,
            body: r.3,
            updated_at: r.4,
            raw_score: r.5 as f32,
        })
        .collect())
}
