//! Profile records.

use crate::auth::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user profile. One per authenticated identity, never hard-deleted:
/// removal flips `active` so certificates and ledger rows stay auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new active, unverified profile.
    pub fn new(email: String, full_name: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            role,
            active: true,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Minimal email shape check; real validation lives with the provider.
    pub fn validate_email(email: &str) -> bool {
        let trimmed = email.trim();
        trimmed.len() >= 3 && trimmed.contains('@') && !trimmed.starts_with('@')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_is_active_and_unverified() {
        let profile = Profile::new(
            "aluno@example.com".to_string(),
            "Aluno Teste".to_string(),
            Role::Student,
        );
        assert!(profile.active);
        assert!(!profile.email_verified);
        assert_eq!(profile.role, Role::Student);
    }

    #[test]
    fn test_validate_email() {
        assert!(Profile::validate_email("a@b.com"));
        assert!(!Profile::validate_email("sem-arroba"));
        assert!(!Profile::validate_email("@falta.local"));
    }
}
