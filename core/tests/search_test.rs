//! Integration coverage for the hybrid search engine (S4).

use std::sync::Arc;

use nectra_core::db::{chunk_store, knowledge_store, org_store};
use nectra_core::models::{KnowledgeType, NewKnowledge, Organization};
use nectra_core::services::chunking::{chunk_body, ChunkConfig};
use nectra_core::services::search::{ExpansionConfig, SearchEngine, SearchFilters, SearchMode, SearchRequest, SourceScope};
use nectra_core::services::write_path;
use nectra_core::Db;
use nectra_nlp_engine::{DeterministicEmbeddingClient, EmbeddingClient};
use sqlx::PgPool;

async fn seed_knowledge(db: &Db, org_id: uuid::Uuid, title: &str, body: &str) -> uuid::Uuid {
    let new = NewKnowledge {
        org_id,
        project_id: None,
        knowledge_type: KnowledgeType::Guideline,
        title: title.to_string(),
        summary: String::new(),
        body: body.to_string(),
        scope: None,
    };
    let knowledge = write_path::create(db, new).await.unwrap();

    let client = DeterministicEmbeddingClient;
    let doc_embedding = client.generate(&format!("{title}\n\n{body}")).await.unwrap();
    knowledge_store::store_embedding(db.pool(), knowledge.id, &doc_embedding).await.unwrap();

    let chunks = chunk_body(body, &ChunkConfig::default());
    let mut new_chunks = Vec::new();
    for chunk in chunks {
        let embedding = client.generate(&chunk.content).await.unwrap();
        new_chunks.push(chunk_store::NewChunk {
            chunk_index: chunk.index,
            content: chunk.content,
            embedding,
        });
    }
    chunk_store::replace_all(
        db.pool(),
        knowledge.id,
        org_id,
        None,
        KnowledgeType::Guideline,
        knowledge.status,
        title,
        "",
        &None,
        &new_chunks,
    )
    .await
    .unwrap();

    knowledge.id
}

#[sqlx::test(migrations = "./migrations")]
async fn s4_hybrid_search_ranks_matching_title_first(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let auth_id = seed_knowledge(
        &db,
        org.id,
        "Authentication Guide",
        "How authentication and session tokens work across services.",
    )
    .await;
    seed_knowledge(
        &db,
        org.id,
        "Database Optimization",
        "Indexing strategies and query planning for large tables.",
    )
    .await;
    seed_knowledge(
        &db,
        org.id,
        "API Design Decision",
        "Why the team chose REST over GraphQL for the public API.",
    )
    .await;

    let engine = SearchEngine::new(db, Arc::new(DeterministicEmbeddingClient), ExpansionConfig::default());
    let response = engine
        .search(SearchRequest {
            org_id: org.id,
            query: "authentication".to_string(),
            filters: SearchFilters::default(),
            mode: SearchMode::Hybrid,
            exact: true,
            source_scope: SourceScope::Knowledge,
            limit: 10,
            cursor: None,
        })
        .await
        .unwrap();

    assert!(!response.results.is_empty());
    assert_eq!(response.results[0].id, auth_id);
}

#[sqlx::test(migrations = "./migrations")]
async fn lexical_only_mode_skips_semantic_candidates(pool: PgPool) {
    let db = Db::from_pool(pool.clone());
    let org = Organization::new("Acme Corp").unwrap();
    org_store::insert_org(&pool, &org).await.unwrap();

    let auth_id = seed_knowledge(&db, org.id, "Authentication Guide", "Session tokens and login flows.").await;

    let engine = SearchEngine::new(db, Arc::new(DeterministicEmbeddingClient), ExpansionConfig::default());
    let response = engine
        .search(SearchRequest {
            org_id: org.id,
            query: "authentication".to_string(),
            filters: SearchFilters::default(),
            mode: SearchMode::Lexical,
            exact: true,
            source_scope: SourceScope::Knowledge,
            limit: 10,
            cursor: None,
        })
        .await
        .unwrap();

    assert_eq!(response.results[0].id, auth_id);
}
