//! Status enums for orders and service types.
//!
//! The backend owns both order statuses and reports them as free-form
//! strings. Parsing is case-insensitive; values this frontend does not know
//! are kept verbatim in an `Other` variant so they still display.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order fulfilment status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Created and not yet finished.
    #[default]
    Pending,
    /// Work finished.
    Completed,
    /// Cancelled by an operator.
    Cancelled,
    /// Backend-defined value with no special meaning here.
    Other(String),
}

impl OrderStatus {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Completed and cancelled orders are closed for edits and cancellation.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "pending" | "created" => Self::Pending,
            "completed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order payment status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Not paid.
    #[default]
    Unpaid,
    /// Paid in full.
    Paid,
    /// Paid and then refunded.
    Refunded,
    /// Backend-defined value; gated like unpaid.
    Other(String),
}

impl PaymentStatus {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::Other(raw) => raw,
        }
    }

    /// Paid or refunded orders take no further payment.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Refunded)
    }
}

impl From<&str> for PaymentStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "unpaid" | "pending" => Self::Unpaid,
            "paid" => Self::Paid,
            "refunded" => Self::Refunded,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work on a service line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Flytting. Needs both a from and a to address.
    Moving,
    /// Rengjøring.
    Cleaning,
    /// Pakking.
    Packing,
}

impl ServiceType {
    /// All service types in display order.
    pub const ALL: [Self; 3] = [Self::Moving, Self::Cleaning, Self::Packing];

    /// Backend `tjenesteTypeId`.
    #[must_use]
    pub const fn type_id(self) -> i64 {
        match self {
            Self::Moving => 1,
            Self::Cleaning => 2,
            Self::Packing => 3,
        }
    }

    /// Display name used by the backend in order responses.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Moving => "Flytting",
            Self::Cleaning => "Rengjøring",
            Self::Packing => "Pakking",
        }
    }

    /// Look up a type by its backend id.
    #[must_use]
    pub fn from_type_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.type_id() == id)
    }

    /// Look up a type by display name (Norwegian or English), case-insensitively.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "flytting" | "moving" => Some(Self::Moving),
            "rengjøring" | "rengjoring" | "cleaning" => Some(Self::Cleaning),
            "pakking" | "packing" => Some(Self::Packing),
            _ => None,
        }
    }

    /// Whether a destination address is required.
    #[must_use]
    pub const fn needs_destination(self) -> bool {
        matches!(self, Self::Moving)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
