//! Profile records and admin user management.

pub mod manager;
pub mod types;

pub use manager::{ProfileManager, ProfileError};
pub use types::Profile;
