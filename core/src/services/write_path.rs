//! The versioned write path (spec §4.1): Create, Update, Deprecate. Each
//! operation binds the knowledge row, its version history, and its pending
//! embedding job to one transaction via [`Db::with_tx`].

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::db::{asset_store, box_fut, job_store, knowledge_store, Db};
use crate::models::{Asset, Knowledge, KnowledgeStatus, KnowledgeUpdate, NewAsset, NewKnowledge};

use super::error::CoreError;

/// Allocate ids, validate, and insert the knowledge row, its v1 version, and
/// a pending embedding job, all in one transaction. Any failure rolls back
/// all three.
pub async fn create(db: &Db, new: NewKnowledge) -> Result<Knowledge, CoreError> {
    new.validate()?;

    let knowledge_id = Uuid::new_v4();
    let version_id = Uuid::new_v4();
    let job_id = Uuid::new_v4();

    let knowledge = db
        .with_tx(move |tx: &mut Transaction<'_, Postgres>| {
            let new = new;
            box_fut(async move {
                let knowledge = knowledge_store::insert(&mut *tx, knowledge_id, &new).await?;
                knowledge_store::insert_version(
                    &mut *tx,
                    version_id,
                    knowledge_id,
                    1,
                    &knowledge.title,
                    &knowledge.summary,
                    &knowledge.body,
                )
                .await?;
                job_store::enqueue_for_knowledge(&mut *tx, job_id, knowledge_id).await?;
                Ok(knowledge)
            })
        })
        .await?;

    Ok(knowledge)
}

/// Insert an Asset and, when it has embeddable text, enqueue its embedding
/// job in the same transaction (spec §4.3: "for every asset completion with
/// non-empty description/keywords, at least one EmbeddingJob is enqueued").
/// Assets have no version history, so this has no counterpart to the
/// knowledge path's version insert.
pub async fn create_asset(db: &Db, new: NewAsset) -> Result<Asset, CoreError> {
    new.validate()?;

    let asset_id = Uuid::new_v4();
    let job_id = Uuid::new_v4();

    let asset = db
        .with_tx(move |tx: &mut Transaction<'_, Postgres>| {
            let new = new;
            box_fut(async move {
                let asset = asset_store::insert(&mut *tx, asset_id, &new).await?;
                if asset.has_embeddable_text() {
                    job_store::enqueue_for_asset(&mut *tx, job_id, asset_id).await?;
                }
                Ok(asset)
            })
        })
        .await?;

    Ok(asset)
}

/// Overwrite title/summary/body/scope, append version N+1, and enqueue a
/// fresh embedding job. Fails with `InvalidOperation` if the knowledge is
/// deprecated.
pub async fn update(db: &Db, org_id: Uuid, knowledge_id: Uuid, update: KnowledgeUpdate) -> Result<Knowledge, CoreError> {
    update.validate()?;

    let current = knowledge_store::get_by_id(db.pool(), org_id, knowledge_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("knowledge {knowledge_id} not found")))?;

    if current.status == KnowledgeStatus::Deprecated {
        return Err(CoreError::invalid_operation("cannot modify deprecated knowledge"));
    }

    let version_id = Uuid::new_v4();
    let job_id = Uuid::new_v4();

    let knowledge = db
        .with_tx(move |tx: &mut Transaction<'_, Postgres>| {
            let update = update;
            box_fut(async move {
                // `update_fields` runs first: its `UPDATE ... WHERE id = $1` takes the
                // row lock immediately, so a second concurrent `update()` on the same
                // knowledge_id blocks here until this transaction commits. Only once
                // that lock is held do we read `latest_version_number`, which keeps
                // the version-number read and the version-row insert in the same
                // serialized critical section and guarantees distinct version numbers
                // even when two updates race.
                let knowledge = knowledge_store::update_fields(
                    &mut *tx,
                    org_id,
                    knowledge_id,
                    &update.title,
                    &update.summary,
                    &update.body,
                    &update.scope,
                )
                .await?;
                let next_version = knowledge_store::latest_version_number(&mut *tx, knowledge_id).await? + 1;
                knowledge_store::insert_version(
                    &mut *tx,
                    version_id,
                    knowledge_id,
                    next_version,
                    &knowledge.title,
                    &knowledge.summary,
                    &knowledge.body,
                )
                .await?;
                job_store::enqueue_for_knowledge(&mut *tx, job_id, knowledge_id).await?;
                Ok(knowledge)
            })
        })
        .await?;

    Ok(knowledge)
}

/// Transition to `deprecated`. The only supported removal path; hard delete
/// is intentionally not exposed here.
pub async fn deprecate(db: &Db, org_id: Uuid, knowledge_id: Uuid) -> Result<Knowledge, CoreError> {
    let knowledge = knowledge_store::deprecate(db.pool(), org_id, knowledge_id).await?;
    Ok(knowledge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KnowledgeType;

    #[test]
    fn rejects_update_with_empty_title() {
        let update = KnowledgeUpdate {
            title: String::new(),
            summary: "s".to_string(),
            body: "b".to_string(),
            scope: None,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn new_knowledge_with_guideline_type_validates() {
        let new = NewKnowledge {
            org_id: Uuid::new_v4(),
            project_id: None,
            knowledge_type: KnowledgeType::Guideline,
            title: "Auth".to_string(),
            summary: "s".to_string(),
            body: "# Auth".to_string(),
            scope: None,
        };
        assert!(new.validate().is_ok());
    }
}
