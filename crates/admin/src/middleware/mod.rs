//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Rejected-session hook (logs the operator out after a backend 401)
//! 5. Role extractors in handlers

pub mod auth;
pub mod session;

pub use auth::{
    AdminArea, AuthRejection, ConsultantArea, OptionalAuth, RequireAdmin, RequireConsultant,
    RequireRole, RoleArea, end_rejected_sessions,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
