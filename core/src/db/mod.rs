//! Postgres persistence layer.
//!
//! Every store function is generic over `sqlx::PgExecutor<'e>` so the same
//! function runs against a bare `&PgPool` or a `&mut Transaction<'_, Postgres>`.
//! This is what lets [`Db::with_tx`] bundle several stores' writes into one
//! atomic commit.

mod error;
mod pool;

pub mod api_key_store;
pub mod asset_store;
pub mod chunk_store;
pub mod job_store;
pub mod knowledge_store;
pub mod list_store;
pub mod org_store;
pub mod search_log_store;

pub use error::DatabaseError;
pub use pool::{box_fut, Db};
