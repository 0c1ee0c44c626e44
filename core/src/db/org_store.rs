//! Persistence for Organization and Project.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Organization, Project};

use super::error::DatabaseError;

pub async fn insert_org<'e, E>(executor: E, org: &Organization) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES ($1, $2, $3)")
        .bind(org.id)
        .bind(&org.name)
        .bind(org.created_at)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get_org<'e, E>(executor: E, id: Uuid) -> Result<Option<Organization>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<(Uuid, String, chrono::DateTime<chrono::Utc>)> =
        sqlx::query_as("SELECT id, name, created_at FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

    Ok(row.map(|(id, name, created_at)| Organization { id, name, created_at }))
}

pub async fn insert_project<'e, E>(executor: E, project: &Project) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO projects (id, org_id, name, created_at) VALUES ($1, $2, $3, $4)")
        .bind(project.id)
        .bind(project.org_id)
        .bind(&project.name)
        .bind(project.created_at)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get_project<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<Option<Project>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let row: Option<(Uuid, Uuid, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT id, org_id, name, created_at FROM projects WHERE id = $1 AND org_id = $2",
    )
    .bind(id)
    .bind(org_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|(id, org_id, name, created_at)| Project {
        id,
        org_id,
        name,
        created_at,
    }))
}
