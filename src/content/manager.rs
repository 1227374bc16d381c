//! Content item management.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{ContentItem, ContentKind};

/// Manager for content items.
pub struct ContentManager<'a> {
    conn: &'a Connection,
}

impl<'a> ContentManager<'a> {
    /// Create a new content manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new content item.
    pub fn create(&self, item: &ContentItem) -> Result<(), ContentError> {
        if item.title.trim().is_empty() {
            return Err(ContentError::Validation("title is required".to_string()));
        }

        let body_json = serde_json::to_string(&item.body)
            .map_err(|e| ContentError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO content_items
                 (id, title, kind, body_json, course_id, lesson_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    item.id.to_string(),
                    item.title,
                    item.kind.as_str(),
                    body_json,
                    item.course_id,
                    item.lesson_id,
                    item.created_at.to_rfc3339(),
                    item.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(())
    }

    /// Get a content item by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<ContentItem>, ContentError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, kind, body_json, course_id, lesson_id, created_at, updated_at
                 FROM content_items WHERE id = ?1",
                params![id.to_string()],
                parse_content_row,
            )
            .optional()
            .map_err(|e| ContentError::Database(e.to_string()))?;

        row.map(ContentRow::into_item).transpose()
    }

    /// List content items of a course, in creation order.
    pub fn list_for_course(&self, course_id: &str) -> Result<Vec<ContentItem>, ContentError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, kind, body_json, course_id, lesson_id, created_at, updated_at
                 FROM content_items WHERE course_id = ?1 ORDER BY created_at ASC",
            )
            .map_err(|e| ContentError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![course_id], parse_content_row)
            .map_err(|e| ContentError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let row = row.map_err(|e| ContentError::Database(e.to_string()))?;
            items.push(row.into_item()?);
        }

        Ok(items)
    }

    /// Update title, body, and lesson of an existing item.
    ///
    /// The kind is immutable: an update carrying a different kind fails
    /// with `KindImmutable`.
    pub fn update(&self, item: &ContentItem) -> Result<(), ContentError> {
        let stored_kind: Option<String> = self
            .conn
            .query_row(
                "SELECT kind FROM content_items WHERE id = ?1",
                params![item.id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ContentError::Database(e.to_string()))?;

        let stored_kind = stored_kind
            .ok_or_else(|| ContentError::NotFound(format!("Content item {}", item.id)))?;

        if ContentKind::from_str(&stored_kind) != Some(item.kind) {
            return Err(ContentError::KindImmutable {
                stored: stored_kind,
                requested: item.kind.as_str().to_string(),
            });
        }

        let body_json = serde_json::to_string(&item.body)
            .map_err(|e| ContentError::Serialization(e.to_string()))?;
        let now = Utc::now();

        self.conn
            .execute(
                "UPDATE content_items
                 SET title = ?2, body_json = ?3, lesson_id = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    item.id.to_string(),
                    item.title,
                    body_json,
                    item.lesson_id,
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete a content item.
    pub fn delete(&self, id: Uuid) -> Result<(), ContentError> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM content_items WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| ContentError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ContentError::NotFound(format!("Content item {}", id)));
        }

        Ok(())
    }
}

/// Intermediate struct for reading content rows from the database.
struct ContentRow {
    id: String,
    title: String,
    kind: String,
    body_json: String,
    course_id: String,
    lesson_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ContentRow {
    fn into_item(self) -> Result<ContentItem, ContentError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ContentError::Serialization(format!("Invalid UUID: {}", e)))?;

        let kind = ContentKind::from_str(&self.kind).ok_or_else(|| {
            ContentError::Serialization(format!("Unknown content kind: {}", self.kind))
        })?;

        let body: serde_json::Value = serde_json::from_str(&self.body_json)
            .map_err(|e| ContentError::Serialization(format!("Invalid body JSON: {}", e)))?;

        Ok(ContentItem {
            id,
            title: self.title,
            kind,
            body,
            course_id: self.course_id,
            lesson_id: self.lesson_id,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_content_row(row: &rusqlite::Row) -> rusqlite::Result<ContentRow> {
    Ok(ContentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: row.get(2)?,
        body_json: row.get(3)?,
        course_id: row.get(4)?,
        lesson_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ContentError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ContentError::Serialization(format!("Invalid date: {}", e)))
}

/// Content errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Content type is immutable (stored: {stored}, requested: {requested})")]
    KindImmutable { stored: String, requested: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use serde_json::json;

    fn text_item(course: &str) -> ContentItem {
        ContentItem::new(
            "Introdução".to_string(),
            ContentKind::Text,
            json!({ "body": "Bem-vindo ao curso." }),
            course.to_string(),
            Some("licao-1".to_string()),
        )
    }

    #[test]
    fn test_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let manager = ContentManager::new(db.connection());

        let item = text_item("curso-rust");
        manager.create(&item).unwrap();

        let fetched = manager.get(item.id).unwrap().expect("item not found");
        assert_eq!(fetched.title, "Introdução");
        assert_eq!(fetched.kind, ContentKind::Text);
        assert_eq!(fetched.body["body"], "Bem-vindo ao curso.");
    }

    #[test]
    fn test_kind_change_rejected() {
        let db = Database::open_in_memory().unwrap();
        let manager = ContentManager::new(db.connection());

        let mut item = text_item("curso-rust");
        manager.create(&item).unwrap();

        item.kind = ContentKind::Video;
        item.body = json!({ "url": "https://videos.example.com/aula1" });

        let err = manager.update(&item).unwrap_err();
        assert!(matches!(err, ContentError::KindImmutable { .. }));

        // Stored item is untouched
        let stored = manager.get(item.id).unwrap().unwrap();
        assert_eq!(stored.kind, ContentKind::Text);
    }

    #[test]
    fn test_update_same_kind() {
        let db = Database::open_in_memory().unwrap();
        let manager = ContentManager::new(db.connection());

        let mut item = text_item("curso-rust");
        manager.create(&item).unwrap();

        item.title = "Introdução revisada".to_string();
        manager.update(&item).unwrap();

        let stored = manager.get(item.id).unwrap().unwrap();
        assert_eq!(stored.title, "Introdução revisada");
        assert!(stored.updated_at >= stored.created_at);
    }

    #[test]
    fn test_list_for_course() {
        let db = Database::open_in_memory().unwrap();
        let manager = ContentManager::new(db.connection());

        manager.create(&text_item("curso-a")).unwrap();
        manager.create(&text_item("curso-a")).unwrap();
        manager.create(&text_item("curso-b")).unwrap();

        assert_eq!(manager.list_for_course("curso-a").unwrap().len(), 2);
        assert_eq!(manager.list_for_course("curso-b").unwrap().len(), 1);
        assert!(manager.list_for_course("curso-c").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_item() {
        let db = Database::open_in_memory().unwrap();
        let manager = ContentManager::new(db.connection());

        let err = manager.delete(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }
}
