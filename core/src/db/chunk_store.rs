//! Persistence for KnowledgeChunk rows, including wholesale chunk replacement
//! and the chunk-level semantic/lexical retrieval queries the search engine uses.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{KnowledgeChunk, KnowledgeStatus, KnowledgeType};

use super::error::DatabaseError;

#[derive(sqlx::FromRow)]
struct ChunkRow {
    id: Uuid,
    knowledge_id: Uuid,
    org_id: Uuid,
    project_id: Option<Uuid>,
    knowledge_type: String,
    status: String,
    title: String,
    summary: String,
    scope: Option<String>,
    chunk_index: i32,
    content: String,
    embedding: Option<Vector>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChunkRow> for KnowledgeChunk {
    type Error = DatabaseError;

    fn try_from(row: ChunkRow) -> Result<Self, Self::Error> {
        Ok(KnowledgeChunk {
            id: row.id,
            knowledge_id: row.knowledge_id,
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
            scope: row.scope,
            chunk_index: row.chunk_index,
            content: row.content,
            embedding: row.embedding.map(|v| v.to_vec()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One chunk ready for insertion, produced by the chunker plus its embedding.
pub struct NewChunk {
    pub chunk_index: i32,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Replace the entire chunk set for `knowledge_id` in one transaction: delete
/// all existing rows, then insert the new ordered set. Guarantees chunk_index
/// is always dense and always reflects the latest body (spec §4.3).
///
/// Callers pass a `&mut Transaction` here (see `services::embedding_pipeline`)
/// so the delete and the inserts land in the same transaction as the job
/// completion write.
pub async fn replace_all<'e, E>(
    executor: E,
    knowledge_id: Uuid,
    org_id: Uuid,
    project_id: Option<Uuid>,
    knowledge_type: KnowledgeType,
    status: KnowledgeStatus,
    title: &str,
    summary: &str,
    scope: &Option<String>,
    chunks: &[NewChunk],
) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    // Built as one multi-statement batch so both the delete and the inserts
    // land in whatever transaction the executor already represents.
    let mut builder = sqlx::QueryBuilder::new(
        "WITH deleted AS (DELETE FROM knowledge_chunks WHERE knowledge_id = ",
    );
    builder.push_bind(knowledge_id);
    builder.push(") INSERT INTO knowledge_chunks (id, knowledge_id, org_id, project_id, knowledge_type, status, title, summary, scope, chunk_index, content, embedding) ");

    if chunks.is_empty() {
        // Nothing to insert; the DELETE above still must run.
        sqlx::query("DELETE FROM knowledge_chunks WHERE knowledge_id = $1")
            .bind(knowledge_id)
            .execute(executor)
            .await?;
        return Ok(());
    }

    builder.push_values(chunks, |mut b, chunk| {
        b.push_bind(Uuid::new_v4())
            .push_bind(knowledge_id)
            .push_bind(org_id)
            .push_bind(project_id)
            .push_bind(knowledge_type.as_str())
            .push_bind(status.as_str())
            .push_bind(title)
            .push_bind(summary)
            .push_bind(scope.clone())
            .push_bind(chunk.chunk_index)
            .push_bind(chunk.content.clone())
            .push_bind(Vector::from(chunk.embedding.clone()));
    });

    builder.build().execute(executor).await?;
    Ok(())
}

pub async fn count_for_knowledge<'e, E>(executor: E, knowledge_id: Uuid) -> Result<i64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM knowledge_chunks WHERE knowledge_id = $1")
        .bind(knowledge_id)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<KnowledgeChunk>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<ChunkRow> = sqlx::query_as(
        r#"
        SELECT id, knowledge_id, org_id, project_id, knowledge_type, status, title, summary,
               scope, chunk_index, content, embedding, created_at, updated_at
        FROM knowledge_chunks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// A chunk-level hit used by the search engine: enough to rank, fuse, and
/// later hydrate into a document-level result.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub chunk_id: Uuid,
    pub knowledge_id: Uuid,
    pub title: String,
    pub scope: Option<String>,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub raw_score: f32,
}

/// Query filters shared by every chunk-level retrieval path.
#[derive(Debug, Clone, Default)]
pub struct ChunkFilters {
    pub project_id: Option<Uuid>,
    pub knowledge_type: Option<KnowledgeType>,
    pub status: Option<KnowledgeStatus>,
    pub path_prefix: Option<String>,
}

/// Chunk-level cosine similarity against a query embedding (pgvector `<=>`),
/// filtered by org/project/type/status/path_prefix.
pub async fn semantic_search<'e, E>(
    executor: E,
    org_id: Uuid,
    query_embedding: &[f32],
    filters: &ChunkFilters,
    limit: i64,
) -> Result<Vec<ChunkHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT id, knowledge_id, title, scope, content, updated_at,
               1.0 - (embedding <=> "#,
    );
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(") AS score FROM knowledge_chunks WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND embedding IS NOT NULL");
    push_chunk_filters(&mut builder, filters);
    builder.push(" ORDER BY embedding <=> ");
    builder.push_bind(Vector::from(query_embedding.to_vec()));
    builder.push(" ASC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, Uuid, String, Option<String>, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| ChunkHit {
            chunk_id: r.0,
            knowledge_id: r.1,
            title: r.2,
            scope: r.3,
            content: r.4,
            updated_at: r.5,
            raw_score: r.6 as f32,
        })
        .collect())
}

/// Chunk-level full-text match against the precomputed tsvector column, using
/// the engine's "web search" query syntax (`websearch_to_tsquery`).
pub async fn lexical_search<'e, E>(
    executor: E,
    org_id: Uuid,
    query: &str,
    filters: &ChunkFilters,
    limit: i64,
) -> Result<Vec<ChunkHit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT id, knowledge_id, title, scope, content, updated_at,
               ts_rank(search_index, websearch_to_tsquery('english', "#,
    );
    builder.push_bind(query);
    builder.push(")) AS score FROM knowledge_chunks WHERE org_id = ");
    builder.push_bind(org_id);
    builder.push(" AND search_index @@ websearch_to_tsquery('english', ");
    builder.push_bind(query);
    builder.push(")");
    push_chunk_filters(&mut builder, filters);
    builder.push(" ORDER BY score DESC LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, Uuid, String, Option<String>, String, DateTime<Utc>, f64)> =
        builder.build_query_as().fetch_all(executor).await?;

    Ok(rows
        .into_iter()
        .map(|r| ChunkHit {
            chunk_id: r.0,
            knowledge_id: r.1,
            title: r.2,
            scope: r.3,
            content: r.4,
            updated_at: r.5,
            raw_score: r.6 as f32,
        })
        .collect())
}

fn push_chunk_filters(builder: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filters: &ChunkFilters) {
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
