//! Knowledge — the versioned text artifact at the center of the service — plus
//! its immutable version history and retrieval chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::ValidationError;

/// The kind of knowledge artifact. Stored as its lowercase string form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeType {
    Guideline,
    Learning,
    Decision,
    Template,
    Checklist,
    Snippet,
}

impl KnowledgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guideline => "guideline",
            Self::Learning => "learning",
            Self::Decision => "decision",
            Self::Template => "template",
            Self::Checklist => "checklist",
            Self::Snippet => "snippet",
        }
    }
}

impl fmt::Display for KnowledgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guideline" => Ok(Self::Guideline),
            "learning" => Ok(Self::Learning),
            "decision" => Ok(Self::Decision),
            "template" => Ok(Self::Template),
            "checklist" => Ok(Self::Checklist),
            "snippet" => Ok(Self::Snippet),
            other => Err(ValidationError::InvalidKnowledgeType(other.to_string())),
        }
    }
}

/// Lifecycle status of a Knowledge item. `Deprecated` is terminal: once set, no
/// further mutation of the parent row is permitted (spec §3, §4.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeStatus {
    Draft,
    Approved,
    Deprecated,
}

impl KnowledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Deprecated => "deprecated",
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::Deprecated)
    }
}

impl fmt::Display for KnowledgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "deprecated" => Ok(Self::Deprecated),
            other => Err(ValidationError::InvalidKnowledgeStatus(other.to_string())),
        }
    }
}

/// A versioned text artifact. The document-level `embedding` is produced
/// asynchronously by the embedding pipeline; it is `None` until the first job
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Knowledge {
    pub id: Uuid,
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub knowledge_type: KnowledgeType,
    pub status: KnowledgeStatus,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Fields accepted by `Create` (spec §4.1). Validated before any row is written.
#[derive(Debug, Clone)]
pub struct NewKnowledge {
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub knowledge_type: KnowledgeType,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub scope: Option<String>,
}

impl NewKnowledge {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::MissingField("body".to_string()));
        }
        if let Some(scope) = &self.scope {
            if !scope.is_empty() && !scope.starts_with('/') {
                return Err(ValidationError::InvalidScope(scope.clone()));
            }
        }
        Ok(())
    }
}

/// Fields accepted by `Update` (spec §4.1).
#[derive(Debug, Clone)]
pub struct KnowledgeUpdate {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub scope: Option<String>,
}

impl KnowledgeUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::MissingField("body".to_string()));
        }
        Ok(())
    }
}

/// An immutable snapshot of a Knowledge item at a point in time. Append-only —
/// updating the parent never rewrites an existing version row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeVersion {
    pub id: Uuid,
    pub knowledge_id: Uuid,
    pub version_number: i32,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A bounded substring of a Knowledge body retained for chunk-level retrieval,
/// denormalizing the parent's filterable fields so every query predicate can be
/// evaluated against the chunk row alone (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub knowledge_id: Uuid,
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub knowledge_type: KnowledgeType,
    pub status: KnowledgeStatus,
    pub title: String,
    pub summary: String,
    pub scope: Option<String>,
    pub chunk_index: i32,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_type_round_trips_through_str() {
        for t in [
            KnowledgeType::Guideline,
            KnowledgeType::Learning,
            KnowledgeType::Decision,
            KnowledgeType::Template,
            KnowledgeType::Checklist,
            KnowledgeType::Snippet,
        ] {
            assert_eq!(t.as_str().parse::<KnowledgeType>().unwrap(), t);
        }
        assert!("bogus".parse::<KnowledgeType>().is_err());
    }

    #[test]
    fn status_is_deprecated_only_for_deprecated() {
        assert!(!KnowledgeStatus::Draft.is_deprecated());
        assert!(!KnowledgeStatus::Approved.is_deprecated());
        assert!(KnowledgeStatus::Deprecated.is_deprecated());
    }

    #[test]
    fn new_knowledge_rejects_missing_title_or_body() {
        let base = NewKnowledge {
            org_id: Uuid::new_v4(),
            project_id: None,
            knowledge_type: KnowledgeType::Guideline,
            title: "Auth".to_string(),
            summary: "s".to_string(),
            body: "# Auth".to_string(),
            scope: None,
        };
        assert!(base.validate().is_ok());

        let mut missing_title = base.clone();
        missing_title.title = "  ".to_string();
        assert!(missing_title.validate().is_err());

        let mut missing_body = base;
        missing_body.body = String::new();
        assert!(missing_body.validate().is_err());
    }

    #[test]
    fn new_knowledge_rejects_scope_without_leading_slash() {
        let mut n = NewKnowledge {
            org_id: Uuid::new_v4(),
            project_id: None,
            knowledge_type: KnowledgeType::Guideline,
            title: "t".to_string(),
            summary: String::new(),
            body: "b".to_string(),
            scope: Some("src/api".to_string()),
        };
        assert!(n.validate().is_err());
        n.scope = Some("/src/api".to_string());
        assert!(n.validate().is_ok());
    }
}
