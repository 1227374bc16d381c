//! Authentication: roles, sessions, the request guard, and the hosted
//! provider seam.

pub mod guard;
pub mod provider;
pub mod sessions;
pub mod types;

pub use guard::{evaluate, GuardDecision};
pub use provider::{AuthProvider, HostedAuthClient, ProviderError};
pub use sessions::{SessionError, SessionManager};
pub use types::{AuthState, Role, Session, SessionIdentity};
