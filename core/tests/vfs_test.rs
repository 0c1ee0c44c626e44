//! Integration coverage for the VFS read surface (spec's filesystem-style
//! Open/List operations).

use nectra_core::db::{list_store, org_store};
use nectra_core::models::{KnowledgeType, NewAsset, NewKnowledge, Organization};
use nectra_core::services::object_store::NoopObjectStore;
use nectra_core::services::vfs::{LineRange, ListSource, ListedItem, OpenRequest, SourceType, Vfs};
use nectra_core::services::write_path;
use nectra_core::Db;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn open_knowledge_applies_line_range(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let new = NewKnowledge {
        org_id: org.id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: "Runbook".to_string(),
        summary: String::new(),
        body: "line0\nline1\nline2\nline3".to_string(),
        scope: None,
    };
    let knowledge = write_path::create(&db, new).await.unwrap();

    let store = NoopObjectStore;
    let vfs = Vfs::new(&db, &store);
    let opened = vfs
        .open(
            org.id,
            OpenRequest {
                id: knowledge.id,
                source_type: SourceType::Knowledge,
                chunk_id: None,
                range: Some(LineRange {
                    start_line: Some(1),
                    end_line: Some(3),
                    max_chars: None,
                }),
                include_url: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(opened.content, "line1\nline2");
    assert_eq!(opened.total_lines, 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_knowledge_paginates_with_has_more(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    for i in 0..3 {
        let new = NewKnowledge {
            org_id: org.id,
            project_id: None,
            knowledge_type: KnowledgeType::Guideline,
            title: format!("Doc {i}"),
            summary: String::new(),
            body: "body".to_string(),
            scope: None,
        };
        write_path::create(&db, new).await.unwrap();
    }

    let store = NoopObjectStore;
    let vfs = Vfs::new(&db, &store);
    let (page, has_more) = vfs
        .list_knowledge(org.id, &list_store::ListFilters::default(), 0, 2)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(has_more);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_both_concatenates_knowledge_before_assets(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let new_knowledge = NewKnowledge {
        org_id: org.id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: "Runbook".to_string(),
        summary: String::new(),
        body: "body".to_string(),
        scope: None,
    };
    write_path::create(&db, new_knowledge).await.unwrap();

    let new_asset = NewAsset {
        org_id: org.id,
        project_id: None,
        filename: "diagram.png".to_string(),
        mime_type: "image/png".to_string(),
        sha256: "abc123".to_string(),
        storage_key: "org/asset/diagram.png".to_string(),
        keywords: vec![],
        description: "A diagram".to_string(),
    };
    write_path::create_asset(&db, new_asset).await.unwrap();

    let store = NoopObjectStore;
    let vfs = Vfs::new(&db, &store);
    let (page, has_more) = vfs
        .list(org.id, ListSource::Both, None, &list_store::ListFilters::default(), 0, 10)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(!has_more);
    assert!(matches!(page[0], ListedItem::Knowledge(_)));
    assert!(matches!(page[1], ListedItem::Asset(_)));
}
