//! Course content items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a content item.
///
/// Immutable after creation: switching a lesson from video to quiz means
/// authoring a new item, matching the type-selector-then-editor flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Video,
    Quiz,
    Scorm,
    Lti,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Video => "video",
            ContentKind::Quiz => "quiz",
            ContentKind::Scorm => "scorm",
            ContentKind::Lti => "lti",
        }
    }

    pub fn from_str(s: &str) -> Option<ContentKind> {
        match s {
            "text" => Some(ContentKind::Text),
            "video" => Some(ContentKind::Video),
            "quiz" => Some(ContentKind::Quiz),
            "scorm" => Some(ContentKind::Scorm),
            "lti" => Some(ContentKind::Lti),
            _ => None,
        }
    }
}

/// A piece of course content authored by a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub kind: ContentKind,
    /// Kind-specific payload (text body, video URL, quiz questions,
    /// SCORM/LTI launch data).
    pub body: serde_json::Value,
    pub course_id: String,
    pub lesson_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create a new content item.
    pub fn new(
        title: String,
        kind: ContentKind,
        body: serde_json::Value,
        course_id: String,
        lesson_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            kind,
            body,
            course_id,
            lesson_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            ContentKind::Text,
            ContentKind::Video,
            ContentKind::Quiz,
            ContentKind::Scorm,
            ContentKind::Lti,
        ] {
            assert_eq!(ContentKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentKind::from_str("pdf"), None);
    }
}
