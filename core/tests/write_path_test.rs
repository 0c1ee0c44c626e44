//! Integration coverage for the versioned write path (S1-S3, version
//! monotonicity, deprecated-never-mutates).

use nectra_core::db::{job_store, knowledge_store, org_store};
use nectra_core::models::{JobStatus, KnowledgeStatus, KnowledgeType, KnowledgeUpdate, NewAsset, NewKnowledge, Organization};
use nectra_core::services::write_path;
use nectra_core::Db;
use sqlx::PgPool;

async fn seed_org(pool: &PgPool) -> Organization {
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(pool, &org).await.unwrap();
    org
}

fn sample_new_knowledge(org_id: uuid::Uuid) -> NewKnowledge {
    NewKnowledge {
        org_id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: "Auth".to_string(),
        summary: "s".to_string(),
        body: "# Auth".to_string(),
        scope: None,
    }
}

fn sample_new_asset(org_id: uuid::Uuid, description: &str) -> NewAsset {
    NewAsset {
        org_id,
        project_id: None,
        filename: "diagram.png".to_string(),
        mime_type: "image/png".to_string(),
        sha256: "abc123".to_string(),
        storage_key: "org/asset/diagram.png".to_string(),
        keywords: vec![],
        description: description.to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn s1_create_then_retrieve_round_trips(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;

    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();
    assert_eq!(knowledge.status, KnowledgeStatus::Draft);

    let fetched = knowledge_store::get_by_id(&pool, org.id, knowledge.id)
        .await
        .unwrap()
        .expect("knowledge should exist");
    assert_eq!(fetched.title, "Auth");
    assert_eq!(fetched.body, "# Auth");
    assert_eq!(fetched.knowledge_type, KnowledgeType::Guideline);

    let pending = job_store::count_by_status(&pool, JobStatus::Pending).await.unwrap();
    assert_eq!(pending, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn s2_update_bumps_version_and_preserves_history(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;

    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();

    let update = KnowledgeUpdate {
        title: "Auth v2".to_string(),
        summary: "s2".to_string(),
        body: "# Auth v2".to_string(),
        scope: None,
    };
    write_path::update(&db, org.id, knowledge.id, update).await.unwrap();

    let versions = knowledge_store::list_versions(&pool, knowledge.id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].title, "Auth");
    assert_eq!(versions[1].version_number, 2);
    assert_eq!(versions[1].title, "Auth v2");

    let latest = knowledge_store::get_by_id(&pool, org.id, knowledge.id).await.unwrap().unwrap();
    assert_eq!(latest.title, "Auth v2");
}

#[sqlx::test(migrations = "./migrations")]
async fn update_with_identical_inputs_still_bumps_version(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;
    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();

    let update = KnowledgeUpdate {
        title: knowledge.title.clone(),
        summary: knowledge.summary.clone(),
        body: knowledge.body.clone(),
        scope: knowledge.scope.clone(),
    };
    write_path::update(&db, org.id, knowledge.id, update).await.unwrap();

    let versions = knowledge_store::list_versions(&pool, knowledge.id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].version_number, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn s3_deprecate_blocks_further_update(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;
    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();

    write_path::deprecate(&db, org.id, knowledge.id).await.unwrap();

    let update = KnowledgeUpdate {
        title: "Should not land".to_string(),
        summary: String::new(),
        body: "body".to_string(),
        scope: None,
    };
    let err = write_path::update(&db, org.id, knowledge.id, update).await.unwrap_err();
    assert!(matches!(err, nectra_core::CoreError::InvalidOperation(_)));

    let unchanged = knowledge_store::get_by_id(&pool, org.id, knowledge.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Auth");
    assert_eq!(unchanged.status, KnowledgeStatus::Deprecated);
}

#[sqlx::test(migrations = "./migrations")]
async fn version_numbers_are_dense_and_gapless(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;
    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();

    for i in 2..=4 {
        let update = KnowledgeUpdate {
            title: format!("Auth v{i}"),
            summary: String::new(),
            body: "# Auth".to_string(),
            scope: None,
        };
        write_path::update(&db, org.id, knowledge.id, update).await.unwrap();
    }

    let versions = knowledge_store::list_versions(&pool, knowledge.id).await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_asset_with_description_enqueues_embedding_job(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;

    write_path::create_asset(&db, sample_new_asset(org.id, "A diagram of the pipeline"))
        .await
        .unwrap();

    let pending = job_store::count_by_status(&pool, JobStatus::Pending).await.unwrap();
    assert_eq!(pending, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_asset_without_embeddable_text_enqueues_nothing(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;

    write_path::create_asset(&db, sample_new_asset(org.id, "")).await.unwrap();

    let pending = job_store::count_by_status(&pool, JobStatus::Pending).await.unwrap();
    assert_eq!(pending, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_updates_on_same_knowledge_both_produce_distinct_versions(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = seed_org(&pool).await;
    let knowledge = write_path::create(&db, sample_new_knowledge(org.id)).await.unwrap();

    let update_a = KnowledgeUpdate {
        title: "Auth from A".to_string(),
        summary: String::new(),
        body: "# Auth A".to_string(),
        scope: None,
    };
    let update_b = KnowledgeUpdate {
        title: "Auth from B".to_string(),
        summary: String::new(),
        body: "# Auth B".to_string(),
        scope: None,
    };

    let (a, b) = tokio::join!(
        write_path::update(&db, org.id, knowledge.id, update_a),
        write_path::update(&db, org.id, knowledge.id, update_b),
    );
    a.unwrap();
    b.unwrap();

    let versions = knowledge_store::list_versions(&pool, knowledge.id).await.unwrap();
    assert_eq!(versions.len(), 3);
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[sqlx::test(migrations = "./migrations")]
async fn tenancy_isolation_hides_other_orgs_rows(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org_a = seed_org(&pool).await;
    let org_b = Organization::new("Globex").unwrap();
    org_store::insert_org(&pool, &org_b).await.unwrap();

    let knowledge = write_path::create(&db, sample_new_knowledge(org_a.id)).await.unwrap();

    let leaked = knowledge_store::get_by_id(&pool, org_b.id, knowledge.id).await.unwrap();
    assert!(leaked.is_none());
}
