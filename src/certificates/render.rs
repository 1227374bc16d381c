//! Certificate rendering.
//!
//! Pure merge of a template with certificate and student data. No side
//! effects, no database access.

use super::types::{CertificateTemplate, IssuedCertificate, RenderedCertificate};
use crate::profiles::Profile;

/// Merge a certificate, its template, and the student profile into a
/// displayable document.
pub fn render_certificate(
    template: &CertificateTemplate,
    certificate: &IssuedCertificate,
    student: &Profile,
) -> RenderedCertificate {
    let html = template
        .html_layout
        .replace("{{student_name}}", &student.full_name)
        .replace("{{student_email}}", &student.email)
        .replace("{{course_id}}", &certificate.course_id)
        .replace("{{certificate_number}}", &certificate.certificate_number)
        .replace("{{verification_hash}}", &certificate.verification_hash)
        .replace(
            "{{issue_date}}",
            &certificate.issue_date.format("%d/%m/%Y").to_string(),
        );

    RenderedCertificate {
        html,
        css: template.css_layout.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::certificates::types::{default_template, CertificateStatus};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_certificate() -> IssuedCertificate {
        IssuedCertificate {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: "curso-rust".to_string(),
            template_id: Uuid::new_v4(),
            certificate_number: "CERT-2026-ABCD1234".to_string(),
            verification_hash: "abc123".to_string(),
            issue_date: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
            status: CertificateStatus::Active,
        }
    }

    #[test]
    fn test_placeholders_replaced() {
        let template = default_template();
        let certificate = sample_certificate();
        let student = Profile::new(
            "maria@example.com".to_string(),
            "Maria Silva".to_string(),
            Role::Student,
        );

        let rendered = render_certificate(&template, &certificate, &student);

        assert!(rendered.html.contains("Maria Silva"));
        assert!(rendered.html.contains("curso-rust"));
        assert!(rendered.html.contains("CERT-2026-ABCD1234"));
        assert!(rendered.html.contains("15/03/2026"));
        assert!(!rendered.html.contains("{{"));
        assert_eq!(rendered.css, template.css_layout);
    }

    #[test]
    fn test_render_is_pure() {
        let template = default_template();
        let certificate = sample_certificate();
        let student = Profile::new(
            "maria@example.com".to_string(),
            "Maria Silva".to_string(),
            Role::Student,
        );

        let first = render_certificate(&template, &certificate, &student);
        let second = render_certificate(&template, &certificate, &student);
        assert_eq!(first.html, second.html);
        assert_eq!(first.css, second.css);
    }
}
