//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email/password login against the backend and the session
//!   store that keeps the issued token

pub mod auth;

pub use auth::{AuthError, AuthService, SessionStore};
