//! EmbeddingJob — a unit of work for the asynchronous embedding pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Job lifecycle status (spec §4.3 state machine).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of embedding work. Exactly one of `knowledge_id`/`asset_id` is
/// set (spec §3 invariant); `processed_at` is only set once status reaches a
/// terminal value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingJob {
    pub id: Uuid,
    pub knowledge_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
    pub status: JobStatus,
    pub retries: i32,
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl EmbeddingJob {
    pub fn for_knowledge(knowledge_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            knowledge_id: Some(knowledge_id),
            asset_id: None,
            status: JobStatus::Pending,
            retries: 0,
            error: String::new(),
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn for_asset(asset_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            knowledge_id: None,
            asset_id: Some(asset_id),
            status: JobStatus::Pending,
            retries: 0,
            error: String::new(),
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}
