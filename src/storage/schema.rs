//! Database schema definitions for Aula.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Profiles table (one row per authenticated identity; never hard-deleted)
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    email_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Sessions table (opaque bearer token -> profile)
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_profile_id ON sessions(profile_id);

-- Certificate templates table
CREATE TABLE IF NOT EXISTS certificate_templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    is_default INTEGER NOT NULL DEFAULT 0,
    html_layout TEXT NOT NULL,
    css_layout TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Issued certificates table
-- verification_hash is the only public lookup key; revocation mutates the
-- status columns, the row itself is never deleted.
CREATE TABLE IF NOT EXISTS issued_certificates (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES profiles(id),
    course_id TEXT NOT NULL,
    template_id TEXT NOT NULL REFERENCES certificate_templates(id),
    certificate_number TEXT NOT NULL UNIQUE,
    verification_hash TEXT NOT NULL UNIQUE,
    issue_date TEXT NOT NULL,
    revoked INTEGER NOT NULL DEFAULT 0,
    revocation_reason TEXT,
    revocation_date TEXT
);

CREATE INDEX IF NOT EXISTS idx_issued_certificates_student_id ON issued_certificates(student_id);
CREATE INDEX IF NOT EXISTS idx_issued_certificates_hash ON issued_certificates(verification_hash);

-- Certificate verification audit trail (append-only, best effort)
CREATE TABLE IF NOT EXISTS certificate_verifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    verification_hash TEXT NOT NULL,
    ip TEXT,
    user_agent TEXT,
    was_valid INTEGER NOT NULL,
    checked_at TEXT NOT NULL
);

-- Points transactions table (append-only ledger; totals are derived)
CREATE TABLE IF NOT EXISTS points_transactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(id),
    points INTEGER NOT NULL,
    kind TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_points_transactions_user_id ON points_transactions(user_id);

-- Achievements table (rule definitions)
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    criteria_type TEXT NOT NULL,
    criteria_value INTEGER NOT NULL,
    points INTEGER NOT NULL
);

-- Unlocked achievements per user (at most once per rule)
CREATE TABLE IF NOT EXISTS user_achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(id),
    achievement_id TEXT NOT NULL REFERENCES achievements(id),
    unlocked_at TEXT NOT NULL,
    UNIQUE(user_id, achievement_id)
);

-- Content items table (type is immutable after creation)
CREATE TABLE IF NOT EXISTS content_items (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    kind TEXT NOT NULL,
    body_json TEXT NOT NULL,
    course_id TEXT NOT NULL,
    lesson_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_content_items_course_id ON content_items(course_id);
"#;

/// SQL for the schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
