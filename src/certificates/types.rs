//! Certificate records and templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Revocation state of an issued certificate.
///
/// Revocation is a state change, not a deletion: revoked certificates stay
/// resolvable so verifiers get an explicit "revoked" answer, never a false
/// "not found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    Revoked {
        reason: String,
        revoked_at: DateTime<Utc>,
    },
}

impl CertificateStatus {
    pub fn is_revoked(&self) -> bool {
        matches!(self, CertificateStatus::Revoked { .. })
    }
}

/// An issued certificate.
///
/// `verification_hash` is the only public lookup key and is immutable once
/// issued; the internal id is never required to verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCertificate {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: String,
    pub template_id: Uuid,
    pub certificate_number: String,
    pub verification_hash: String,
    pub issue_date: DateTime<Utc>,
    pub status: CertificateStatus,
}

/// A certificate layout template. Referenced, never owned, by issued
/// certificates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub html_layout: String,
    pub css_layout: String,
    pub created_at: DateTime<Utc>,
}

impl CertificateTemplate {
    /// Create a new template.
    pub fn new(name: String, html_layout: String, css_layout: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            is_default: false,
            html_layout,
            css_layout,
            created_at: Utc::now(),
        }
    }
}

/// Result of a public verification lookup.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub is_valid: bool,
    pub certificate: Option<IssuedCertificate>,
}

/// A certificate merged with its template, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCertificate {
    pub html: String,
    pub css: String,
}

/// Default template seeded on first run.
pub fn default_template() -> CertificateTemplate {
    let mut template = CertificateTemplate::new(
        "Certificado Padrão".to_string(),
        DEFAULT_HTML_LAYOUT.to_string(),
        DEFAULT_CSS_LAYOUT.to_string(),
    );
    template.description = Some("Modelo padrão de certificado de conclusão".to_string());
    template.is_default = true;
    template
}

const DEFAULT_HTML_LAYOUT: &str = r#"<div class="certificado">
  <h1>Certificado de Conclusão</h1>
  <p>Certificamos que <strong>{{student_name}}</strong> concluiu o curso
  <strong>{{course_id}}</strong> em {{issue_date}}.</p>
  <p class="numero">Certificado nº {{certificate_number}}</p>
  <p class="verificacao">Código de verificação: {{verification_hash}}</p>
</div>"#;

const DEFAULT_CSS_LAYOUT: &str = r#".certificado {
  font-family: Georgia, serif;
  text-align: center;
  border: 4px double #1a3c6e;
  padding: 48px;
}
.certificado .numero { font-size: 0.9em; color: #555; }
.certificado .verificacao { font-size: 0.8em; color: #888; }"#;
