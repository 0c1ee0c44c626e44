//! Embedding input text construction (spec §4.3).

use crate::models::{Asset, Knowledge};

/// `title`, `summary`, `body` joined by blank lines, dropping empty parts.
pub fn knowledge_embedding_text(knowledge: &Knowledge) -> String {
    [
        knowledge.title.trim(),
        knowledge.summary.trim(),
        knowledge.body.trim(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// `"File: {filename}"`, then description if present, then the comma-joined
/// keyword list. Callers check [`asset_has_embeddable_text`] before
/// enqueueing a job at all.
pub fn asset_embedding_text(asset: &Asset) -> String {
    let mut parts = vec![format!("File: {}", asset.filename)];
    let description = asset.description.trim();
    if !description.is_empty() {
        parts.push(description.to_string());
    }
    if !asset.keywords.is_empty() {
        parts.push(format!("Keywords: {}", asset.keywords.join(", ")));
    }
    parts.join("\n\n")
}

/// Whether an asset has anything worth embedding at all. Assets with neither
/// a description nor keywords never get an embedding job enqueued.
pub fn asset_has_embeddable_text(asset: &Asset) -> bool {
    asset.has_embeddable_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KnowledgeStatus, KnowledgeType};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_knowledge(title: &str, summary: &str, body: &str) -> Knowledge {
        Knowledge {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            project_id: None,
            knowledge_type: KnowledgeType::Guideline,
            status: KnowledgeStatus::Draft,
            title: title.to_string(),
            summary: summary.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            scope: None,
            embedding: None,
        }
    }

    #[test]
    fn drops_empty_parts() {
        let k = sample_knowledge("Title", "", "Body");
        assert_eq!(knowledge_embedding_text(&k), "Title\n\nBody");
    }

    #[test]
    fn joins_all_three_when_present() {
        let k = sample_knowledge("Title", "Summary", "Body");
        assert_eq!(knowledge_embedding_text(&k), "Title\n\nSummary\n\nBody");
    }

    #[test]
    fn asset_text_includes_filename_description_and_keywords() {
        let asset = Asset {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            project_id: None,
            filename: "doc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            sha256: "deadbeef".to_string(),
            storage_key: "key".to_string(),
            keywords: vec!["alpha".to_string(), "beta".to_string()],
            description: "A document".to_string(),
            embedding: None,
            created_at: Utc::now(),
        };
        let text = asset_embedding_text(&asset);
        assert!(text.contains("File: doc.pdf"));
        assert!(text.contains("A document"));
        assert!(text.contains("Keywords: alpha, beta"));
    }
}
