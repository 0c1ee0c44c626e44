/// Integration tests for the deterministic embedding client (no network access
/// required; `HttpEmbeddingClient` is exercised against a `wiremock` server in
/// unit tests colocated with `embedding.rs`).
use nectra_nlp_engine::{DeterministicEmbeddingClient, EmbeddingClient, EMBEDDING_DIMENSION};

#[tokio::test]
async fn generates_right_sized_embedding() {
    let client = DeterministicEmbeddingClient;
    let embedding = client.generate("a test sentence").await.unwrap();
    assert_eq!(embedding.len(), EMBEDDING_DIMENSION);
}

#[tokio::test]
async fn rejects_empty_text() {
    let client = DeterministicEmbeddingClient;
    let result = client.generate("").await;
    assert!(result.is_err());

    let result = client.generate("   \n\t").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn is_stable_for_the_same_input() {
    let client = DeterministicEmbeddingClient;
    let a = client.generate("stable text").await.unwrap();
    let b = client.generate("stable text").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn differs_across_inputs() {
    let client = DeterministicEmbeddingClient;
    let a = client.generate("the cat sat on the mat").await.unwrap();
    let b = client.generate("quarterly revenue report").await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn batch_preserves_order() {
    let client = DeterministicEmbeddingClient;
    let texts = vec![
        "first".to_string(),
        "second".to_string(),
        "third".to_string(),
    ];
    let batch = client.generate_batch(&texts).await.unwrap();
    assert_eq!(batch.len(), 3);
    for (text, embedding) in texts.iter().zip(batch.iter()) {
        let single = client.generate(text).await.unwrap();
        assert_eq!(&single, embedding);
    }
}

#[tokio::test]
async fn concurrent_requests_all_succeed() {
    use std::sync::Arc;

    let client = Arc::new(DeterministicEmbeddingClient);
    let mut handles = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.generate(&format!("concurrent request {i}")).await
        }));
    }

    for handle in handles {
        let embedding = handle.await.unwrap().unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIMENSION);
    }
}
