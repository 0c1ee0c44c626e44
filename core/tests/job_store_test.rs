//! Integration coverage for the embedding job queue's claim protocol (S5,
//! claim exclusivity).

use std::collections::HashSet;

use nectra_core::db::{job_store, org_store};
use nectra_core::models::{KnowledgeType, NewKnowledge, Organization};
use nectra_core::services::write_path;
use nectra_core::Db;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn s5_four_concurrent_claimers_partition_100_jobs_exactly(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let new = NewKnowledge {
        org_id: org.id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: "Target".to_string(),
        summary: String::new(),
        body: "body".to_string(),
        scope: None,
    };
    // `create` already enqueues one job; drain it so the count below is exact.
    let knowledge = write_path::create(&db, new).await.unwrap();
    let seed_job = job_store::claim_pending(&pool, 1).await.unwrap();
    assert_eq!(seed_job.len(), 1);

    for _ in 0..100 {
        job_store::enqueue_for_knowledge(&pool, Uuid::new_v4(), knowledge.id).await.unwrap();
    }

    let (a, b, c, d) = tokio::join!(
        job_store::claim_pending(&pool, 25),
        job_store::claim_pending(&pool, 25),
        job_store::claim_pending(&pool, 25),
        job_store::claim_pending(&pool, 25),
    );

    let batches = [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
    for batch in &batches {
        assert_eq!(batch.len(), 25);
    }

    let mut seen: HashSet<Uuid> = HashSet::new();
    for batch in &batches {
        for job in batch {
            assert!(seen.insert(job.id), "job {} claimed by more than one batch", job.id);
        }
    }
    assert_eq!(seen.len(), 100);
}

#[sqlx::test(migrations = "./migrations")]
async fn reap_stalled_returns_processing_jobs_to_pending(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let new = NewKnowledge {
        org_id: org.id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: "Target".to_string(),
        summary: String::new(),
        body: "body".to_string(),
        scope: None,
    };
    write_path::create(&db, new).await.unwrap();

    let claimed = job_store::claim_pending(&pool, 1).await.unwrap();
    assert_eq!(claimed.len(), 1);

    // A 0-second stall threshold treats the just-claimed job as stalled.
    let reaped = job_store::reap_stalled(&pool, 0).await.unwrap();
    assert_eq!(reaped, 1);

    let job = job_store::get_by_id(&pool, claimed[0].id).await.unwrap().unwrap();
    assert_eq!(job.status, nectra_core::JobStatus::Pending);
    assert_eq!(job.retries, 0);
}
