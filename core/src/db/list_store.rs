//! Listing queries backing the VFS `List` operation (spec §4.5).

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{KnowledgeStatus, KnowledgeType};

use super::error::DatabaseError;

/// One row of a knowledge listing, with its chunk_count subquery already resolved.
#[derive(Debug, Clone)]
pub struct KnowledgeListItem {
    pub id: Uuid,
    pub title: String,
    pub scope: Option<String>,
    pub knowledge_type: KnowledgeType,
    pub status: KnowledgeStatus,
    pub updated_at: DateTime<Utc>,
    pub chunk_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub project_id: Option<Uuid>,
    pub path_prefix: Option<String>,
    pub knowledge_type: Option<KnowledgeType>,
    pub status: Option<KnowledgeStatus>,
    pub updated_since: Option<DateTime<Utc>>,
}

/// Fetch `limit + 1` rows ordered by (updated_at desc, id desc) so the caller
/// can detect `has_more` without a second round trip.
pub async fn list_knowledge<'e, E>(
    executor: E,
    org_id: Uuid,
    filters: &ListFilters,
    offset: i64,
    limit: i64,
) -> Result<Vec<KnowledgeListItem>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT k.id, k.title, k.scope, k.knowledge_type, k.status, k.updated_at,
               (SELECT COUNT(*) FROM knowledge_chunks c WHERE c.knowledge_id = k.id) AS chunk_count
        FROM knowledge k
        WHERE k.org_id = "#,
    );
    builder.push_bind(org_id);

    if let Some(project_id) = filters.project_id {
        builder.push(" AND k.project_id = ");
        builder.push_bind(project_id);
    }
    if let Some(path_prefix) = &filters.path_prefix {
        builder.push(" AND k.scope IS NOT NULL AND k.scope LIKE ");
        builder.push_bind(format!("{}%", path_prefix.trim_end_matches('/')));
    }
    if let Some(knowledge_type) = filters.knowledge_type {
        builder.push(" AND k.knowledge_type = ");
        builder.push_bind(knowledge_type.as_str());
    }
    if let Some(status) = filters.status {
        builder.push(" AND k.status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(updated_since) = filters.updated_since {
        builder.push(" AND k.updated_at >= ");
        builder.push_bind(updated_since);
    }

    builder.push(" ORDER BY k.updated_at DESC, k.id DESC OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, Option<String>, String, String, DateTime<Utc>, i64)> =
        builder.build_query_as().fetch_all(executor).await?;

    rows.into_iter()
        .map(|(id, title, scope, knowledge_type, status, updated_at, chunk_count)| {
            Ok(KnowledgeListItem {
                id,
                title,
                scope,
                knowledge_type: knowledge_type
                    .parse()
                    .map_err(|e: crate::models::ValidationError| DatabaseError::decode_failed(e.to_string()))?,
                status: status
                    .parse()
                    .map_err(|e: crate::models::ValidationError| DatabaseError::decode_failed(e.to_string()))?,
                updated_at,
                chunk_count,
            })
        })
        .collect()
}

/// One row of an asset listing.
#[derive(Debug, Clone)]
pub struct AssetListItem {
    pub id: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

pub async fn list_assets<'e, E>(
    executor: E,
    org_id: Uuid,
    project_id: Option<Uuid>,
    offset: i64,
    limit: i64,
) -> Result<Vec<AssetListItem>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut builder =
        sqlx::QueryBuilder::new("SELECT id, filename, created_at FROM assets WHERE org_id = ");
    builder.push_bind(org_id);
    if let Some(project_id) = project_id {
        builder.push(" AND project_id = ");
        builder.push_bind(project_id);
    }
    builder.push(" ORDER BY created_at DESC, id DESC OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    let rows: Vec<(Uuid, String, DateTime<Utc>)> = builder.build_query_as().fetch_all(executor).await?;
    Ok(rows
        .into_iter()
        .map(|(id, filename, created_at)| AssetListItem {
            id,
            filename,
            created_at,
        })
        .collect())
}
