//! Session persistence.
//!
//! Sessions are opaque bearer tokens bound to a profile. The guard only
//! checks presence and resolves the role; no cryptographic validation
//! happens at this layer.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{Role, Session, SessionIdentity};

/// Manager for session tokens.
pub struct SessionManager<'a> {
    conn: &'a Connection,
}

impl<'a> SessionManager<'a> {
    /// Create a new session manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a session for a profile and return the bearer token.
    pub fn create(&self, profile_id: Uuid) -> Result<Session, SessionError> {
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            profile_id,
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO sessions (token, profile_id, created_at) VALUES (?1, ?2, ?3)",
                params![
                    session.token,
                    session.profile_id.to_string(),
                    session.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| SessionError::Database(e.to_string()))?;

        Ok(session)
    }

    /// Resolve a token to its profile identity.
    ///
    /// Deactivated profiles resolve to `None`: they keep their records but
    /// lose access.
    pub fn resolve(&self, token: &str) -> Result<Option<SessionIdentity>, SessionError> {
        self.conn
            .query_row(
                "SELECT p.id, p.role, p.email, p.active
                 FROM sessions s JOIN profiles p ON p.id = s.profile_id
                 WHERE s.token = ?1",
                params![token],
                |row| {
                    let id_str: String = row.get(0)?;
                    let role_str: String = row.get(1)?;
                    let email: String = row.get(2)?;
                    let active: i32 = row.get(3)?;
                    Ok((id_str, role_str, email, active != 0))
                },
            )
            .optional()
            .map_err(|e| SessionError::Database(e.to_string()))?
            .map(|(id_str, role_str, email, active)| {
                if !active {
                    return Ok(None);
                }
                let profile_id = Uuid::parse_str(&id_str)
                    .map_err(|e| SessionError::Database(format!("Invalid UUID: {}", e)))?;
                let role = Role::from_str(&role_str).ok_or_else(|| {
                    SessionError::Database(format!("Unknown role: {}", role_str))
                })?;
                Ok(Some(SessionIdentity {
                    profile_id,
                    role,
                    email,
                }))
            })
            .transpose()
            .map(Option::flatten)
    }

    /// Revoke a session token.
    pub fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(|e| SessionError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    /// Revoke every session of a profile.
    pub fn revoke_all(&self, profile_id: Uuid) -> Result<usize, SessionError> {
        self.conn
            .execute(
                "DELETE FROM sessions WHERE profile_id = ?1",
                params![profile_id.to_string()],
            )
            .map_err(|e| SessionError::Database(e.to_string()))
    }

    /// When a session was created, if it exists.
    pub fn created_at(&self, token: &str) -> Result<Option<DateTime<Utc>>, SessionError> {
        self.conn
            .query_row(
                "SELECT created_at FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| SessionError::Database(e.to_string()))?
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| SessionError::Database(format!("Invalid date: {}", e)))
            })
            .transpose()
    }
}

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(String),
}
