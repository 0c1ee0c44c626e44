//! APIKey — a credential scoped to an Organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A credential under an Organization. The plaintext token is never stored —
/// only `key_hash`, a hex-encoded cryptographic hash of it. See
/// [`crate::services::auth`] for issuance and validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKey {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// A key is revoked iff `revoked_at` is set. Revocation is monotonic — once
    /// set it is never cleared (enforced by the store, not this getter).
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}
