//! SearchLog — optional observability record for offline click-through evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single ranked result as recorded for later evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchLogResult {
    pub id: Uuid,
    pub source: String,
    pub score: f32,
}

/// A record of one search call, persisted so a client can later report which
/// result it ultimately used (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchLogEntry {
    pub id: Uuid,
    pub org_id: Uuid,
    pub project_id: Option<Uuid>,
    pub query: String,
    pub filters: Value,
    pub mode: String,
    pub limit: i32,
    pub results: Vec<SearchLogResult>,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
    pub chosen_id: Option<Uuid>,
    pub chosen_source: Option<String>,
}
