//! Certificate endpoints.
//!
//! The verification endpoint is the public trust surface of the platform;
//! it speaks in explicit states (valid, revoked, unknown) rather than
//! collapsing everything into a boolean.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::provider::AuthProvider;
use crate::auth::types::{Role, SessionIdentity};
use crate::certificates::{CertificateService, CertificateStatus, CertificateTemplate};
use crate::http::error::ApiError;
use crate::http::{require_role, AppState};

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Deserialize)]
pub struct IssueBody {
    pub student_id: Uuid,
    pub course_id: String,
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub reissue: bool,
}

#[derive(Deserialize)]
pub struct RevokeBody {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct TemplateBody {
    pub name: String,
    pub description: Option<String>,
    pub html_layout: String,
    #[serde(default)]
    pub css_layout: String,
    #[serde(default)]
    pub is_default: bool,
}

/// GET /api/certificates/verify?hash=...
///
/// Public: reachable without a session. A revoked certificate answers with
/// its revocation details, never with "not found".
pub async fn verify<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Query(params): Query<VerifyParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let hash = params.hash.as_deref().map(str::trim).unwrap_or("");
    if hash.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Informe o código de verificação" })),
        )
            .into_response());
    }

    let ip = header_value(&headers, "x-forwarded-for");
    let user_agent = header_value(&headers, header::USER_AGENT.as_str());

    let db = state.db()?;
    let verification =
        CertificateService::new(db.connection()).verify(hash, ip.as_deref(), user_agent.as_deref())?;

    let response = match verification.certificate {
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Certificado não encontrado" })),
        )
            .into_response(),
        Some(certificate) => match &certificate.status {
            CertificateStatus::Revoked { reason, revoked_at } => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Certificado revogado",
                    "revocation_reason": reason,
                    "revocation_date": revoked_at,
                })),
            )
                .into_response(),
            CertificateStatus::Active => Json(json!({ "certificate": certificate })).into_response(),
        },
    };

    Ok(response)
}

/// POST /api/certificates
pub async fn issue<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<IssueBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    let db = state.db()?;
    let service = CertificateService::new(db.connection());

    let template_id = match body.template_id {
        Some(id) => id,
        None => service
            .list_templates()?
            .into_iter()
            .find(|t| t.is_default)
            .map(|t| t.id)
            .ok_or_else(|| {
                ApiError::Validation("no default certificate template configured".to_string())
            })?,
    };

    let certificate = service.issue(body.student_id, &body.course_id, template_id, body.reissue)?;

    Ok((StatusCode::CREATED, Json(certificate)))
}

/// POST /api/certificates/:id/revoke
pub async fn revoke<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RevokeBody>,
) -> Result<StatusCode, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    if body.reason.trim().is_empty() {
        return Err(ApiError::Validation(
            "revocation reason is required".to_string(),
        ));
    }

    let db = state.db()?;
    CertificateService::new(db.connection()).revoke(id, body.reason.trim())?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/certificates/:id/render
pub async fn render<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity.ok_or_else(|| ApiError::Auth("no session".to_string()))?;

    let db = state.db()?;
    let service = CertificateService::new(db.connection());

    let certificate = service
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Certificate {}", id)))?;

    // Students only render their own certificates.
    if identity.role == Role::Student && certificate.student_id != identity.profile_id {
        return Err(ApiError::Forbidden(format!(
            "certificate {} belongs to another student",
            id
        )));
    }

    Ok(Json(service.render(id)?))
}

/// GET /api/students/:id/certificates
pub async fn list_for_student<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity.ok_or_else(|| ApiError::Auth("no session".to_string()))?;

    if identity.role != Role::Admin && identity.profile_id != student_id {
        return Err(ApiError::Forbidden(
            "only the holder or an admin can list certificates".to_string(),
        ));
    }

    let db = state.db()?;
    let certificates = CertificateService::new(db.connection()).list_for_student(student_id)?;

    Ok(Json(certificates))
}

/// GET /admin/api/certificate-templates
pub async fn list_templates<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let db = state.db()?;
    Ok(Json(CertificateService::new(db.connection()).list_templates()?))
}

/// POST /admin/api/certificate-templates
pub async fn create_template<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<TemplateBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    if body.name.trim().is_empty() || body.html_layout.trim().is_empty() {
        return Err(ApiError::Validation(
            "template name and html layout are required".to_string(),
        ));
    }

    let mut template =
        CertificateTemplate::new(body.name.trim().to_string(), body.html_layout, body.css_layout);
    template.description = body.description;

    let db = state.db()?;
    let service = CertificateService::new(db.connection());
    service.create_template(&template)?;

    if body.is_default {
        service.set_default_template(template.id)?;
        template.is_default = true;
    }

    Ok((StatusCode::CREATED, Json(template)))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
