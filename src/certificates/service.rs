//! Certificate issuance, verification, and revocation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::render::render_certificate;
use super::types::{
    CertificateStatus, CertificateTemplate, IssuedCertificate, RenderedCertificate, Verification,
};
use crate::profiles::ProfileManager;

/// Service for certificate operations.
pub struct CertificateService<'a> {
    conn: &'a Connection,
}

impl<'a> CertificateService<'a> {
    /// Create a new certificate service with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Templates ==========

    /// Insert a template.
    pub fn create_template(
        &self,
        template: &CertificateTemplate,
    ) -> Result<(), CertificateError> {
        self.conn
            .execute(
                "INSERT INTO certificate_templates
                 (id, name, description, is_default, html_layout, css_layout, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    template.id.to_string(),
                    template.name,
                    template.description,
                    template.is_default as i32,
                    template.html_layout,
                    template.css_layout,
                    template.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        Ok(())
    }

    /// Get a template by ID.
    pub fn get_template(&self, id: Uuid) -> Result<Option<CertificateTemplate>, CertificateError> {
        self.conn
            .query_row(
                "SELECT id, name, description, is_default, html_layout, css_layout, created_at
                 FROM certificate_templates WHERE id = ?1",
                params![id.to_string()],
                parse_template_row,
            )
            .optional()
            .map_err(|e| CertificateError::Database(e.to_string()))
    }

    /// List all templates, default first.
    pub fn list_templates(&self) -> Result<Vec<CertificateTemplate>, CertificateError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, description, is_default, html_layout, css_layout, created_at
                 FROM certificate_templates ORDER BY is_default DESC, created_at DESC",
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], parse_template_row)
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        let mut templates = Vec::new();
        for row in rows {
            templates.push(row.map_err(|e| CertificateError::Database(e.to_string()))?);
        }

        Ok(templates)
    }

    /// Make a template the default (and unset the previous one).
    ///
    /// An unknown id fails without touching the table: the existing default
    /// survives, and the swap itself is a single statement.
    pub fn set_default_template(&self, id: Uuid) -> Result<(), CertificateError> {
        if self.get_template(id)?.is_none() {
            return Err(CertificateError::NotFound(format!("Template {}", id)));
        }

        self.conn
            .execute(
                "UPDATE certificate_templates SET is_default = (id = ?1)",
                params![id.to_string()],
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        Ok(())
    }

    // ========== Issuance ==========

    /// Issue a certificate for a student/course pair.
    ///
    /// Fails with `DuplicateIssuance` when an active certificate already
    /// exists for the pair and `reissue` was not requested.
    pub fn issue(
        &self,
        student_id: Uuid,
        course_id: &str,
        template_id: Uuid,
        reissue: bool,
    ) -> Result<IssuedCertificate, CertificateError> {
        if course_id.trim().is_empty() {
            return Err(CertificateError::Validation(
                "course id is required".to_string(),
            ));
        }

        let student = ProfileManager::new(self.conn)
            .get(student_id)
            .map_err(|e| CertificateError::Database(e.to_string()))?
            .ok_or_else(|| CertificateError::NotFound(format!("Student {}", student_id)))?;

        if self.get_template(template_id)?.is_none() {
            return Err(CertificateError::NotFound(format!(
                "Template {}",
                template_id
            )));
        }

        if !reissue {
            let existing: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM issued_certificates
                     WHERE student_id = ?1 AND course_id = ?2 AND revoked = 0",
                    params![student_id.to_string(), course_id],
                    |row| row.get(0),
                )
                .map_err(|e| CertificateError::Database(e.to_string()))?;

            if existing > 0 {
                return Err(CertificateError::DuplicateIssuance(format!(
                    "student {} already holds a certificate for course {}",
                    student_id, course_id
                )));
            }
        }

        let now = Utc::now();
        let certificate = IssuedCertificate {
            id: Uuid::new_v4(),
            student_id,
            course_id: course_id.to_string(),
            template_id,
            certificate_number: generate_certificate_number(now),
            // Opaque and non-guessable; never derived from the internal id.
            verification_hash: Uuid::new_v4().simple().to_string(),
            issue_date: now,
            status: CertificateStatus::Active,
        };

        self.conn
            .execute(
                "INSERT INTO issued_certificates
                 (id, student_id, course_id, template_id, certificate_number,
                  verification_hash, issue_date, revoked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
                params![
                    certificate.id.to_string(),
                    certificate.student_id.to_string(),
                    certificate.course_id,
                    certificate.template_id.to_string(),
                    certificate.certificate_number,
                    certificate.verification_hash,
                    certificate.issue_date.to_rfc3339(),
                ],
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        tracing::info!(
            certificate = %certificate.certificate_number,
            student = %student.email,
            course = %certificate.course_id,
            "Certificate issued"
        );

        Ok(certificate)
    }

    /// Get a certificate by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<IssuedCertificate>, CertificateError> {
        self.conn
            .query_row(
                "SELECT id, student_id, course_id, template_id, certificate_number,
                        verification_hash, issue_date, revoked, revocation_reason, revocation_date
                 FROM issued_certificates WHERE id = ?1",
                params![id.to_string()],
                parse_certificate_row,
            )
            .optional()
            .map_err(|e| CertificateError::Database(e.to_string()))
    }

    /// List certificates held by a student, most recent first.
    pub fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<IssuedCertificate>, CertificateError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, student_id, course_id, template_id, certificate_number,
                        verification_hash, issue_date, revoked, revocation_reason, revocation_date
                 FROM issued_certificates WHERE student_id = ?1 ORDER BY issue_date DESC",
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![student_id.to_string()], parse_certificate_row)
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        let mut certificates = Vec::new();
        for row in rows {
            certificates.push(row.map_err(|e| CertificateError::Database(e.to_string()))?);
        }

        Ok(certificates)
    }

    // ========== Verification ==========

    /// Resolve a verification hash. Public surface: no session required.
    ///
    /// `is_valid` is false when the hash is unknown or the certificate is
    /// revoked. The audit row is best effort and never blocks the result.
    pub fn verify(
        &self,
        hash: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<Verification, CertificateError> {
        let certificate = self
            .conn
            .query_row(
                "SELECT id, student_id, course_id, template_id, certificate_number,
                        verification_hash, issue_date, revoked, revocation_reason, revocation_date
                 FROM issued_certificates WHERE verification_hash = ?1",
                params![hash],
                parse_certificate_row,
            )
            .optional()
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        let is_valid = certificate
            .as_ref()
            .map(|c| !c.status.is_revoked())
            .unwrap_or(false);

        if let Err(e) = self.log_verification(hash, ip, user_agent, is_valid) {
            tracing::warn!("Failed to record verification audit entry: {}", e);
        }

        Ok(Verification {
            is_valid,
            certificate,
        })
    }

    fn log_verification(
        &self,
        hash: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        was_valid: bool,
    ) -> Result<(), CertificateError> {
        self.conn
            .execute(
                "INSERT INTO certificate_verifications
                 (verification_hash, ip, user_agent, was_valid, checked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    hash,
                    ip,
                    user_agent,
                    was_valid as i32,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count audit entries recorded for a hash.
    pub fn verification_count(&self, hash: &str) -> Result<usize, CertificateError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM certificate_verifications WHERE verification_hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        Ok(count as usize)
    }

    // ========== Revocation ==========

    /// Revoke a certificate. The record stays resolvable for auditing.
    pub fn revoke(&self, id: Uuid, reason: &str) -> Result<(), CertificateError> {
        let now = Utc::now();
        let rows_affected = self
            .conn
            .execute(
                "UPDATE issued_certificates
                 SET revoked = 1, revocation_reason = ?2, revocation_date = ?3
                 WHERE id = ?1",
                params![id.to_string(), reason, now.to_rfc3339()],
            )
            .map_err(|e| CertificateError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(CertificateError::NotFound(format!("Certificate {}", id)));
        }

        tracing::info!(certificate_id = %id, reason, "Certificate revoked");

        Ok(())
    }

    // ========== Rendering ==========

    /// Merge a certificate with its template and student data.
    pub fn render(&self, id: Uuid) -> Result<RenderedCertificate, CertificateError> {
        let certificate = self
            .get(id)?
            .ok_or_else(|| CertificateError::NotFound(format!("Certificate {}", id)))?;

        let template = self
            .get_template(certificate.template_id)?
            .ok_or_else(|| {
                CertificateError::NotFound(format!("Template {}", certificate.template_id))
            })?;

        let student = ProfileManager::new(self.conn)
            .get(certificate.student_id)
            .map_err(|e| CertificateError::Database(e.to_string()))?
            .ok_or_else(|| {
                CertificateError::NotFound(format!("Student {}", certificate.student_id))
            })?;

        Ok(render_certificate(&template, &certificate, &student))
    }
}

/// Human-readable unique certificate number.
fn generate_certificate_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "CERT-{}-{}",
        now.format("%Y"),
        suffix[..8].to_uppercase()
    )
}

fn parse_template_row(row: &rusqlite::Row) -> rusqlite::Result<CertificateTemplate> {
    let id_str: String = row.get(0)?;
    let is_default: i32 = row.get(3)?;
    let created_str: String = row.get(6)?;

    Ok(CertificateTemplate {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_default: is_default != 0,
        html_layout: row.get(4)?,
        css_layout: row.get(5)?,
        created_at: parse_datetime(6, &created_str)?,
    })
}

fn parse_certificate_row(row: &rusqlite::Row) -> rusqlite::Result<IssuedCertificate> {
    let id_str: String = row.get(0)?;
    let student_str: String = row.get(1)?;
    let template_str: String = row.get(3)?;
    let issue_str: String = row.get(6)?;
    let revoked: i32 = row.get(7)?;
    let revocation_reason: Option<String> = row.get(8)?;
    let revocation_date: Option<String> = row.get(9)?;

    let status = if revoked != 0 {
        let date_str = revocation_date.ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                "revoked certificate without a revocation date".into(),
            )
        })?;
        CertificateStatus::Revoked {
            reason: revocation_reason.unwrap_or_default(),
            revoked_at: parse_datetime(9, &date_str)?,
        }
    } else {
        CertificateStatus::Active
    };

    Ok(IssuedCertificate {
        id: parse_uuid(0, &id_str)?,
        student_id: parse_uuid(1, &student_str)?,
        course_id: row.get(2)?,
        template_id: parse_uuid(3, &template_str)?,
        certificate_number: row.get(4)?,
        verification_hash: row.get(5)?,
        issue_date: parse_datetime(6, &issue_str)?,
        status,
    })
}

// Corrupt stored values surface as errors, never as silent defaults.
fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Certificate errors.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate issuance: {0}")]
    DuplicateIssuance(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::certificates::types::default_template;
    use crate::profiles::ProfileManager;
    use crate::storage::Database;

    fn setup() -> (Database, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let student = ProfileManager::new(db.connection())
            .create("aluno@example.com", "Aluno Teste", Role::Student)
            .unwrap();
        let template = default_template();
        CertificateService::new(db.connection())
            .create_template(&template)
            .unwrap();
        let (student_id, template_id) = (student.id, template.id);
        (db, student_id, template_id)
    }

    #[test]
    fn test_issue_then_verify() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let certificate = service
            .issue(student_id, "curso-rust", template_id, false)
            .expect("Failed to issue certificate");

        let verification = service
            .verify(&certificate.verification_hash, None, None)
            .unwrap();

        assert!(verification.is_valid);
        let found = verification.certificate.expect("certificate expected");
        assert_eq!(found.student_id, student_id);
        assert_eq!(found.certificate_number, certificate.certificate_number);
    }

    #[test]
    fn test_duplicate_issuance_rejected_unless_reissue() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        service
            .issue(student_id, "curso-rust", template_id, false)
            .unwrap();

        let err = service
            .issue(student_id, "curso-rust", template_id, false)
            .unwrap_err();
        assert!(matches!(err, CertificateError::DuplicateIssuance(_)));

        // Explicit reissue is allowed and mints a fresh hash
        let second = service
            .issue(student_id, "curso-rust", template_id, true)
            .expect("reissue should succeed");
        assert!(!second.verification_hash.is_empty());
    }

    #[test]
    fn test_issue_unknown_student_or_template() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let err = service
            .issue(Uuid::new_v4(), "curso-rust", template_id, false)
            .unwrap_err();
        assert!(matches!(err, CertificateError::NotFound(_)));

        let err = service
            .issue(student_id, "curso-rust", Uuid::new_v4(), false)
            .unwrap_err();
        assert!(matches!(err, CertificateError::NotFound(_)));
    }

    #[test]
    fn test_revoked_certificate_stays_resolvable() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let certificate = service
            .issue(student_id, "curso-rust", template_id, false)
            .unwrap();

        service.revoke(certificate.id, "fraude").unwrap();

        let verification = service
            .verify(&certificate.verification_hash, None, None)
            .unwrap();

        // Never "not found" for a previously valid hash
        assert!(!verification.is_valid);
        let found = verification.certificate.expect("revoked cert must resolve");
        match found.status {
            CertificateStatus::Revoked { ref reason, .. } => assert_eq!(reason, "fraude"),
            CertificateStatus::Active => panic!("certificate should be revoked"),
        }
    }

    #[test]
    fn test_unknown_hash_is_invalid() {
        let (db, _, _) = setup();
        let service = CertificateService::new(db.connection());

        let verification = service.verify("nao-existe", None, None).unwrap();
        assert!(!verification.is_valid);
        assert!(verification.certificate.is_none());
    }

    #[test]
    fn test_verification_audit_trail_appended() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let certificate = service
            .issue(student_id, "curso-rust", template_id, false)
            .unwrap();

        service
            .verify(
                &certificate.verification_hash,
                Some("203.0.113.7"),
                Some("Mozilla/5.0"),
            )
            .unwrap();
        service
            .verify(&certificate.verification_hash, None, None)
            .unwrap();

        assert_eq!(
            service
                .verification_count(&certificate.verification_hash)
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_revoke_unknown_certificate() {
        let (db, _, _) = setup();
        let service = CertificateService::new(db.connection());

        let err = service.revoke(Uuid::new_v4(), "motivo").unwrap_err();
        assert!(matches!(err, CertificateError::NotFound(_)));
    }

    #[test]
    fn test_set_default_unknown_template_keeps_existing_default() {
        let (db, _, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let err = service.set_default_template(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CertificateError::NotFound(_)));

        // The failed call left the table untouched
        let templates = service.list_templates().unwrap();
        let defaults: Vec<_> = templates.iter().filter(|t| t.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, template_id);
    }

    #[test]
    fn test_render_merges_student_data() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        let certificate = service
            .issue(student_id, "curso-rust", template_id, false)
            .unwrap();

        let rendered = service.render(certificate.id).unwrap();
        assert!(rendered.html.contains("Aluno Teste"));
        assert!(rendered.html.contains(&certificate.certificate_number));
    }

    #[test]
    fn test_corrupt_issue_date_is_an_error() {
        let (db, student_id, template_id) = setup();
        let service = CertificateService::new(db.connection());

        db.connection()
            .execute(
                "INSERT INTO issued_certificates
                 (id, student_id, course_id, template_id, certificate_number,
                  verification_hash, issue_date, revoked)
                 VALUES (?1, ?2, 'curso-x', ?3, 'CERT-2026-XXXXXXXX', 'hash-x', 'ontem', 0)",
                params![
                    Uuid::new_v4().to_string(),
                    student_id.to_string(),
                    template_id.to_string(),
                ],
            )
            .unwrap();

        let err = service.verify("hash-x", None, None).unwrap_err();
        assert!(matches!(err, CertificateError::Database(_)));
    }

    #[test]
    fn test_set_default_template_is_exclusive() {
        let (db, _, first_template) = setup();
        let service = CertificateService::new(db.connection());

        let second = CertificateTemplate::new(
            "Alternativo".to_string(),
            "<div>{{student_name}}</div>".to_string(),
            String::new(),
        );
        service.create_template(&second).unwrap();
        service.set_default_template(second.id).unwrap();

        let templates = service.list_templates().unwrap();
        let defaults: Vec<_> = templates.iter().filter(|t| t.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert!(templates.iter().any(|t| t.id == first_template));
    }
}
