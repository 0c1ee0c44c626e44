//! Nectra Core Business Logic Layer
//!
//! This crate provides the domain model, persistence layer, and service
//! orchestration for a multi-tenant knowledge and asset retrieval service:
//! versioned text artifacts and binary assets, kept searchable by dense
//! vector similarity and lexical full-text, surfaced through a
//! filesystem-like read interface and a hybrid search interface.
//!
//! # Architecture
//!
//! - **Postgres via sqlx**: relational storage with `pgvector` for
//!   embeddings and `tsvector`/`websearch_to_tsquery` for lexical search.
//! - **Transaction-scoped repository bundle**: [`db::Db::with_tx`] binds
//!   several store writes to one commit, used by the versioned write path
//!   and the embedding pipeline's chunk-replacement step.
//! - **Job-queue embedding pipeline**: `SELECT ... FOR UPDATE SKIP LOCKED`
//!   gives exclusive, FIFO job claiming across any number of worker
//!   processes, with a reaper to recover jobs orphaned by worker death.
//!
//! # Modules
//!
//! - [`models`] - domain entities and their validation rules
//! - [`db`] - Postgres persistence adapters
//! - [`services`] - write path, embedding pipeline, search engine, VFS, auth

pub mod db;
pub mod models;
pub mod services;

pub use db::{DatabaseError, Db};
pub use models::{
    Asset, EmbeddingJob, JobStatus, Knowledge, KnowledgeChunk, KnowledgeStatus, KnowledgeType,
    KnowledgeVersion, NewKnowledge, Organization, Project, ValidationError,
};
pub use services::CoreError;
