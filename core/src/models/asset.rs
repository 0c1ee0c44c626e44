//! Asset — a binary artifact descriptor, and its weak association with Knowledge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Metadata for a binary artifact. The payload itself lives in an external
/// object store; this record only carries its description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub filename: String,
    pub mime_type: String,
    pub sha256: String,
    pub storage_key: String,
    pub keywords: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Whether this asset has text worth embedding (spec §4.3: "if both
    /// description and keywords are empty, no job is enqueued").
    pub fn has_embeddable_text(&self) -> bool {
        !self.description.trim().is_empty() || !self.keywords.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub filename: String,
    pub mime_type: String,
    pub sha256: String,
    pub storage_key: String,
    pub keywords: Vec<String>,
    pub description: String,
}

impl NewAsset {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.filename.trim().is_empty() {
            return Err(ValidationError::MissingField("filename".to_string()));
        }
        if self.sha256.trim().is_empty() {
            return Err(ValidationError::MissingField("sha256".to_string()));
        }
        Ok(())
    }
}

/// Many-to-many link between a Knowledge and an Asset. No payload fields;
/// neither side owns the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeAsset {
    pub knowledge_id: Uuid,
    pub asset_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Asset {
        Asset {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            project_id: None,
            filename: "diagram.png".to_string(),
            mime_type: "image/png".to_string(),
            sha256: "abc".to_string(),
            storage_key: "org/asset/diagram.png".to_string(),
            keywords: vec![],
            description: String::new(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_embeddable_text_when_both_empty() {
        assert!(!base().has_embeddable_text());
    }

    #[test]
    fn embeddable_with_description_or_keywords() {
        let mut a = base();
        a.description = "A diagram of the pipeline".to_string();
        assert!(a.has_embeddable_text());

        let mut b = base();
        b.keywords = vec!["diagram".to_string()];
        assert!(b.has_embeddable_text());
    }
}
