//! Opaque pagination cursors: an integer offset plus a timestamp, base64
//! encoded (spec §4.4, §4.5). No stability across corpus mutation is
//! promised — the tradeoff the spec accepts for simplicity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;

use super::super::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub offset: i64,
    pub issued_at: i64,
}

impl Cursor {
    pub fn first() -> Self {
        Self {
            offset: 0,
            issued_at: Utc::now().timestamp(),
        }
    }

    pub fn next(&self, limit: i64) -> Self {
        Self {
            offset: self.offset + limit,
            issued_at: self.issued_at,
        }
    }

    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.offset, self.issued_at);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self, CoreError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CoreError::Validation(crate::models::ValidationError::InvalidId("cursor".to_string())))?;
        let raw = String::from_utf8(raw)
            .map_err(|_| CoreError::Validation(crate::models::ValidationError::InvalidId("cursor".to_string())))?;
        let (offset_str, issued_str) = raw
            .split_once(':')
            .ok_or_else(|| CoreError::Validation(crate::models::ValidationError::InvalidId("cursor".to_string())))?;
        let offset: i64 = offset_str
            .parse()
            .map_err(|_| CoreError::Validation(crate::models::ValidationError::InvalidId("cursor".to_string())))?;
        let issued_at: i64 = issued_str
            .parse()
            .map_err(|_| CoreError::Validation(crate::models::ValidationError::InvalidId("cursor".to_string())))?;
        Ok(Self { offset, issued_at })
    }
}

/// Parse an optional opaque cursor token, defaulting to the first page.
pub fn parse_cursor(token: Option<&str>) -> Result<Cursor, CoreError> {
    match token {
        Some(t) if !t.is_empty() => Cursor::decode(t),
        _ => Ok(Cursor::first()),
    }
}

/// Trim a `limit + 1`-sized fetch down to `limit` items and report whether
/// more results exist beyond it.
pub fn split_has_more<T>(mut items: Vec<T>, limit: usize) -> (Vec<T>, bool) {
    let has_more = items.len() > limit;
    items.truncate(limit);
    (items, has_more)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips_through_encode_decode() {
        let cursor = Cursor { offset: 40, issued_at: 1_700_000_000 };
        let encoded = cursor.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn missing_token_defaults_to_offset_zero() {
        let cursor = parse_cursor(None).unwrap();
        assert_eq!(cursor.offset, 0);
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(Cursor::decode("not-valid-base64!!").is_err());
    }

    #[test]
    fn split_has_more_detects_extra_row() {
        let (items, has_more) = split_has_more(vec![1, 2, 3], 2);
        assert_eq!(items, vec![1, 2]);
        assert!(has_more);

        let (items, has_more) = split_has_more(vec![1, 2], 2);
        assert_eq!(items, vec![1, 2]);
        assert!(!has_more);
    }
}
