//! API key issuance, validation, and revocation (spec §4.6).

use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::api_key_store;
use crate::models::ApiKey;

use super::error::CoreError;

/// Every issued token carries this prefix followed by 64 lowercase hex chars,
/// 68 chars total. The prefix is part of the wire contract and is not tied to
/// the crate's own naming.
pub const TOKEN_PREFIX: &str = "ntx_";
const TOKEN_HEX_LEN: usize = 64;

/// A freshly issued key: the plaintext token (shown to the caller exactly
/// once) and the stored row.
pub struct IssuedKey {
    pub token: String,
    pub record: ApiKey,
}

/// Generate 32 random bytes, hex-encode, prefix, hash, and persist the hash.
/// The plaintext token is returned only in this call's result.
pub async fn issue_api_key<'e, E>(executor: E, org_id: Uuid, name: &str) -> Result<IssuedKey, CoreError>
where
    E: PgExecutor<'e>,
{
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = format!("{TOKEN_PREFIX}{}", hex::encode(bytes));
    let key_hash = hash_token(&token);

    let record = api_key_store::insert(executor, Uuid::new_v4(), org_id, name, &key_hash).await?;
    Ok(IssuedKey { token, record })
}

/// Validate a bearer token's shape, look it up by hash, and reject revoked or
/// unknown keys. Returns the owning org_id on success.
pub async fn validate_api_key<'e, E>(executor: E, token: &str) -> Result<Uuid, CoreError>
where
    E: PgExecutor<'e>,
{
    if !has_valid_shape(token) {
        return Err(CoreError::unauthorized("invalid API key format"));
    }

    let key_hash = hash_token(token);
    let key = api_key_store::get_by_hash(executor, &key_hash)
        .await?
        .ok_or_else(|| CoreError::unauthorized("invalid API key"))?;

    if key.is_revoked() {
        return Err(CoreError::forbidden("API key revoked"));
    }

    Ok(key.org_id)
}

pub async fn revoke_api_key<'e, E>(executor: E, org_id: Uuid, id: Uuid) -> Result<(), CoreError>
where
    E: PgExecutor<'e>,
{
    api_key_store::revoke(executor, org_id, id).await?;
    Ok(())
}

fn has_valid_shape(token: &str) -> bool {
    match token.strip_prefix(TOKEN_PREFIX) {
        Some(hex_part) => hex_part.len() == TOKEN_HEX_LEN && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_shape_requires_prefix_and_64_hex_chars() {
        let good = format!("{TOKEN_PREFIX}{}", "a".repeat(64));
        assert!(has_valid_shape(&good));
        assert_eq!(good.len(), 68);
    }

    #[test]
    fn rejects_wrong_prefix_or_length() {
        assert!(!has_valid_shape("wrong_prefix_0000000000000000000000000000000000000000000000000000000000"));
        assert!(!has_valid_shape(&format!("{TOKEN_PREFIX}{}", "a".repeat(10))));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
