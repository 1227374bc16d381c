//! Request handlers, grouped by portal area.

pub mod admin;
pub mod auth;
pub mod certificates;
pub mod content;
pub mod gamification;
pub mod tutor;
