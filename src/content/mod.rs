//! Course content authored by teachers.

pub mod manager;
pub mod types;

pub use manager::{ContentError, ContentManager};
pub use types::{ContentItem, ContentKind};
