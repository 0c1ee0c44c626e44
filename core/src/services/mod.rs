//! Business services: the versioned write path, the embedding pipeline,
//! the hybrid search engine, the VFS read surface, and auth/tenancy.

pub mod auth;
pub mod chunking;
pub mod embedding;
pub mod error;
pub mod object_store;
pub mod search;
pub mod vfs;
pub mod write_path;

pub use error::CoreError;
