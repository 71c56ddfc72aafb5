//! TMC Core - Shared domain types for the order-management admin panel.
//!
//! This crate provides the types used by every TMC component:
//! - `admin` - Role-gated admin web frontend
//! - `cli` - Operator command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Anything that needs "now" or "today" takes it as an argument so
//! the rules stay deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phones, statuses and roles
//! - [`lifecycle`] - Which order actions are allowed for a status pair
//! - [`validation`] - Form validation for customers, consultants and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod types;
pub mod validation;

pub use lifecycle::OrderActions;
pub use types::*;
