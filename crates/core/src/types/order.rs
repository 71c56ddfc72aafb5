//! Orders and their service lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, PersonId};
use super::price::Price;
use super::status::{OrderStatus, PaymentStatus, ServiceType};
use crate::lifecycle::OrderActions;

/// Customer details copied onto an order at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One billable unit of work on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    /// `None` when the backend reports a type this frontend does not know.
    pub service_type: Option<ServiceType>,
    /// The type name exactly as the backend reported it.
    pub service_label: String,
    pub service_date: Option<NaiveDate>,
    pub address_from: String,
    pub address_to: Option<String>,
    pub comment: String,
    pub price: Price,
}

/// An order as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<PersonId>,
    pub customer: CustomerSnapshot,
    pub consultant_id: Option<PersonId>,
    pub consultant_name: String,
    pub services: Vec<ServiceLine>,
    pub total_price: Price,
    pub order_date: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl Order {
    /// Actions currently allowed on this order.
    #[must_use]
    pub fn actions(&self) -> OrderActions {
        OrderActions::derive(&self.order_status, &self.payment_status)
    }
}
