//! Certificate issuance, public verification, and rendering.

pub mod render;
pub mod service;
pub mod types;

pub use render::render_certificate;
pub use service::{CertificateError, CertificateService};
pub use types::{
    default_template, CertificateStatus, CertificateTemplate, IssuedCertificate,
    RenderedCertificate, Verification,
};
