//! Data Models
//!
//! This module contains the core domain entities for the knowledge and asset
//! retrieval service:
//!
//! - [`Organization`], [`Project`], [`ApiKey`] - tenancy
//! - [`Knowledge`], [`KnowledgeVersion`], [`KnowledgeChunk`] - versioned text artifacts
//! - [`Asset`], [`KnowledgeAsset`] - binary artifact metadata and its link to knowledge
//! - [`EmbeddingJob`] - the unit of work the embedding pipeline drains
//! - [`SearchLog`] - optional observability record of a search call
//!
//! Entities carried over the wire by the (external) transport layer are plain,
//! `serde`-derived structs; persistence row shapes live in [`crate::db`].

mod api_key;
mod asset;
mod embedding_job;
mod error;
mod knowledge;
mod organization;
mod project;
mod search_log;

pub use api_key::ApiKey;
pub use asset::{Asset, KnowledgeAsset, NewAsset};
pub use embedding_job::{EmbeddingJob, JobStatus};
pub use error::ValidationError;
pub use knowledge::{
    Knowledge, KnowledgeChunk, KnowledgeStatus, KnowledgeType, KnowledgeUpdate, KnowledgeVersion, NewKnowledge,
};
pub use organization::Organization;
pub use project::Project;
pub use search_log::{SearchLogEntry, SearchLogResult};

/// Fixed dimensionality of every stored embedding vector (spec §4.3).
pub const EMBEDDING_DIMENSION: usize = 1536;
