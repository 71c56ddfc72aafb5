//! Person records: customers and consultants.

use serde::{Deserialize, Serialize};

use super::id::PersonId;
use super::role::RoleId;

/// A customer or consultant as stored by the backend.
///
/// Email and phone are kept as the backend returns them; they are only
/// validated on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role_id: RoleId,
}
