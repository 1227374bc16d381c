//! Profile management (admin user-management operations).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::Profile;
use crate::auth::types::Role;

/// Manager for profile records.
pub struct ProfileManager<'a> {
    conn: &'a Connection,
}

impl<'a> ProfileManager<'a> {
    /// Create a new profile manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new profile. Emails are unique across the table.
    pub fn create(
        &self,
        email: &str,
        full_name: &str,
        role: Role,
    ) -> Result<Profile, ProfileError> {
        if !Profile::validate_email(email) {
            return Err(ProfileError::Validation(format!(
                "invalid email: {}",
                email
            )));
        }
        if full_name.trim().is_empty() {
            return Err(ProfileError::Validation("full name is required".to_string()));
        }

        if self.get_by_email(email)?.is_some() {
            return Err(ProfileError::DuplicateEmail(email.to_string()));
        }

        let profile = Profile::new(email.trim().to_string(), full_name.trim().to_string(), role);

        self.conn
            .execute(
                "INSERT INTO profiles (id, email, full_name, role, active, email_verified, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    profile.id.to_string(),
                    profile.email,
                    profile.full_name,
                    profile.role.as_str(),
                    profile.active as i32,
                    profile.email_verified as i32,
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| ProfileError::Database(e.to_string()))?;

        Ok(profile)
    }

    /// Get a profile by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<Profile>, ProfileError> {
        self.conn
            .query_row(
                "SELECT id, email, full_name, role, active, email_verified, created_at, updated_at
                 FROM profiles WHERE id = ?1",
                params![id.to_string()],
                parse_profile_row,
            )
            .optional()
            .map_err(|e| ProfileError::Database(e.to_string()))
    }

    /// Get a profile by email.
    pub fn get_by_email(&self, email: &str) -> Result<Option<Profile>, ProfileError> {
        self.conn
            .query_row(
                "SELECT id, email, full_name, role, active, email_verified, created_at, updated_at
                 FROM profiles WHERE email = ?1",
                params![email.trim()],
                parse_profile_row,
            )
            .optional()
            .map_err(|e| ProfileError::Database(e.to_string()))
    }

    /// List profiles, optionally filtered by role.
    pub fn list(&self, role: Option<Role>) -> Result<Vec<Profile>, ProfileError> {
        let mut profiles = Vec::new();

        match role {
            Some(role) => {
                let mut stmt = self
                    .conn
                    .prepare(
                        "SELECT id, email, full_name, role, active, email_verified, created_at, updated_at
                         FROM profiles WHERE role = ?1 ORDER BY created_at DESC",
                    )
                    .map_err(|e| ProfileError::Database(e.to_string()))?;
                let rows = stmt
                    .query_map(params![role.as_str()], parse_profile_row)
                    .map_err(|e| ProfileError::Database(e.to_string()))?;
                for row in rows {
                    profiles.push(row.map_err(|e| ProfileError::Database(e.to_string()))?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(
                        "SELECT id, email, full_name, role, active, email_verified, created_at, updated_at
                         FROM profiles ORDER BY created_at DESC",
                    )
                    .map_err(|e| ProfileError::Database(e.to_string()))?;
                let rows = stmt
                    .query_map([], parse_profile_row)
                    .map_err(|e| ProfileError::Database(e.to_string()))?;
                for row in rows {
                    profiles.push(row.map_err(|e| ProfileError::Database(e.to_string()))?);
                }
            }
        }

        Ok(profiles)
    }

    /// Change a profile's role.
    pub fn set_role(&self, id: Uuid, role: Role) -> Result<(), ProfileError> {
        self.touch_update(
            id,
            "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE id = ?1",
            role.as_str(),
        )
    }

    /// Activate or deactivate a profile (soft delete).
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<(), ProfileError> {
        let now = Utc::now().to_rfc3339();
        let rows_affected = self
            .conn
            .execute(
                "UPDATE profiles SET active = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), active as i32, now],
            )
            .map_err(|e| ProfileError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ProfileError::NotFound(format!("Profile {}", id)));
        }

        Ok(())
    }

    /// Mark a profile's email as verified.
    pub fn mark_email_verified(&self, id: Uuid) -> Result<(), ProfileError> {
        let now = Utc::now().to_rfc3339();
        let rows_affected = self
            .conn
            .execute(
                "UPDATE profiles SET email_verified = 1, updated_at = ?2 WHERE id = ?1",
                params![id.to_string(), now],
            )
            .map_err(|e| ProfileError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ProfileError::NotFound(format!("Profile {}", id)));
        }

        Ok(())
    }

    fn touch_update(&self, id: Uuid, sql: &str, value: &str) -> Result<(), ProfileError> {
        let now = Utc::now().to_rfc3339();
        let rows_affected = self
            .conn
            .execute(sql, params![id.to_string(), value, now])
            .map_err(|e| ProfileError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ProfileError::NotFound(format!("Profile {}", id)));
        }

        Ok(())
    }
}

fn parse_profile_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(3)?;
    let active: i32 = row.get(4)?;
    let email_verified: i32 = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let role = Role::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown role: {}", role_str).into(),
        )
    })?;

    Ok(Profile {
        id,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role,
        active: active != 0,
        email_verified: email_verified != 0,
        created_at: parse_datetime(6, &created_str)?,
        updated_at: parse_datetime(7, &updated_str)?,
    })
}

// Corrupt stored values surface as errors, never as silent defaults.
fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Profile errors.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        let created = manager
            .create("aluno@example.com", "Aluno Teste", Role::Student)
            .expect("Failed to create profile");

        let fetched = manager.get(created.id).unwrap().expect("Profile not found");
        assert_eq!(fetched.email, "aluno@example.com");
        assert_eq!(fetched.role, Role::Student);
        assert!(fetched.active);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        manager
            .create("x@example.com", "Primeiro", Role::Student)
            .unwrap();
        let err = manager
            .create("x@example.com", "Segundo", Role::Teacher)
            .unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateEmail(_)));
    }

    #[test]
    fn test_deactivate_is_soft() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        let profile = manager
            .create("x@example.com", "Aluno", Role::Student)
            .unwrap();
        manager.set_active(profile.id, false).unwrap();

        let fetched = manager.get(profile.id).unwrap().expect("row must remain");
        assert!(!fetched.active);
    }

    #[test]
    fn test_set_role() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        let profile = manager
            .create("x@example.com", "Pessoa", Role::Student)
            .unwrap();
        manager.set_role(profile.id, Role::Teacher).unwrap();
        assert_eq!(manager.get(profile.id).unwrap().unwrap().role, Role::Teacher);
    }

    #[test]
    fn test_corrupt_row_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        db.connection()
            .execute(
                "INSERT INTO profiles (id, email, full_name, role, active, email_verified, created_at, updated_at)
                 VALUES (?1, 'x@example.com', 'Pessoa', 'gerente', 1, 0, ?2, ?2)",
                params![Uuid::new_v4().to_string(), Utc::now().to_rfc3339()],
            )
            .unwrap();

        // An unknown role never silently falls back to another role
        let err = manager.get_by_email("x@example.com").unwrap_err();
        assert!(matches!(err, ProfileError::Database(_)));
    }

    #[test]
    fn test_list_filtered_by_role() {
        let db = Database::open_in_memory().unwrap();
        let manager = ProfileManager::new(db.connection());

        manager.create("a@example.com", "A", Role::Student).unwrap();
        manager.create("b@example.com", "B", Role::Teacher).unwrap();
        manager.create("c@example.com", "C", Role::Student).unwrap();

        assert_eq!(manager.list(Some(Role::Student)).unwrap().len(), 2);
        assert_eq!(manager.list(None).unwrap().len(), 3);
    }
}
