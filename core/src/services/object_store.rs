//! Object-store binding (spec §6) — asset blobs live outside this crate.
//! The core only ever holds a `storage_key` and calls through this trait.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::CoreError;

/// Metadata the object store can report about a stored blob.
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub content_length: u64,
    pub content_type: String,
    pub etag: String,
}

/// The four operations the core consumes from an external blob store.
/// Implementations hand back opaque, time-limited presigned URLs; the core
/// never inspects their contents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn generate_upload_url(&self, key: &str, content_type: &str) -> Result<String, CoreError>;
    async fn generate_download_url(&self, key: &str) -> Result<String, CoreError>;
    async fn delete_object(&self, key: &str) -> Result<(), CoreError>;
    async fn head_object(&self, key: &str) -> Result<ObjectHead, CoreError>;
}

/// `{org_id}/{asset_id}/{filename}` — the org_id prefix lets bucket lifecycle
/// rules target a whole tenant (spec §6).
pub fn storage_key(org_id: Uuid, asset_id: Uuid, filename: &str) -> String {
    format!("{org_id}/{asset_id}/{filename}")
}

/// Reference adapter with no backing store. Useful for tests and for
/// deployments that haven't wired a real object store yet: URLs come back
/// empty and mutating calls no-op rather than fail the caller.
#[derive(Debug, Default, Clone)]
pub struct NoopObjectStore;

#[async_trait]
impl ObjectStore for NoopObjectStore {
    async fn generate_upload_url(&self, _key: &str, _content_type: &str) -> Result<String, CoreError> {
        Ok(String::new())
    }

    async fn generate_download_url(&self, _key: &str) -> Result<String, CoreError> {
        Ok(String::new())
    }

    async fn delete_object(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn head_object(&self, _key: &str) -> Result<ObjectHead, CoreError> {
        Ok(ObjectHead {
            content_length: 0,
            content_type: String::new(),
            etag: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_nests_by_org_then_asset() {
        let org = Uuid::nil();
        let asset = Uuid::nil();
        assert_eq!(
            storage_key(org, asset, "doc.pdf"),
            format!("{org}/{asset}/doc.pdf")
        );
    }

    #[tokio::test]
    async fn noop_store_never_fails() {
        let store = NoopObjectStore;
        assert_eq!(store.generate_upload_url("k", "text/plain").await.unwrap(), "");
        assert_eq!(store.generate_download_url("k").await.unwrap(), "");
        store.delete_object("k").await.unwrap();
        let head = store.head_object("k").await.unwrap();
        assert_eq!(head.content_length, 0);
    }
}
