//! Organization — the tenancy root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Tenancy root. Every other entity is ultimately scoped to one Organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Bootstrap a brand-new organization with a fresh id and `created_at = now`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(Organization::new("").is_err());
        assert!(Organization::new("   ").is_err());
    }

    #[test]
    fn accepts_nonempty_name() {
        let org = Organization::new("Acme Corp").unwrap();
        assert_eq!(org.name, "Acme Corp");
    }
}
