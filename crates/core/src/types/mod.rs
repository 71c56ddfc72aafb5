//! Core types for TMC.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod order;
pub mod person;
pub mod phone;
pub mod price;
pub mod role;
pub mod status;

pub use credential::{Claims, CredentialError, Identity};
pub use email::{Email, EmailError, domain_of};
pub use id::*;
pub use order::{CustomerSnapshot, Order, ServiceLine};
pub use person::Person;
pub use phone::{PhoneError, PhoneNumber};
pub use price::Price;
pub use role::{Role, RoleId};
pub use status::*;
