//! `/api/orders` - orders, email lookup, payments, refunds and status.

use std::future::Future;

use reqwest::StatusCode;
use tracing::instrument;

use tmc_core::validation::ValidOrder;
use tmc_core::{Order, OrderId, OrderStatus, Person, PersonId, Price, RoleId};

use super::conversions::{convert_order, convert_person};
use super::types::{
    CustomerInfoRequest, OrderDto, OrderRequest, OrderStatusRequest, PaymentRequest, PersonDto,
    ServiceRequest,
};
use super::{ApiError, Authorized, handle_response, parse_error};

const ORDER_PATH: &str = "/api/orders";
const EMAIL_CHECK_PATH: &str = "/api/orders/email-check";
const PAYMENTS_PATH: &str = "/api/orders/payments";
const REFUNDS_PATH: &str = "/api/orders/refunds";
const STATUS_PATH: &str = "/api/orders/orderStatus";

/// Everything needed to create or replace an order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    /// Consultant placing the order (the signed-in operator).
    pub consultant_id: Option<PersonId>,
    /// Existing customer found by email, if any.
    pub customer_id: Option<PersonId>,
    pub order: ValidOrder,
}

impl OrderDraft {
    fn to_request(&self) -> OrderRequest<'_> {
        let customer = &self.order.customer;
        OrderRequest {
            konsulent_id: self.consultant_id,
            kunde_id: self.customer_id,
            kunde_info: CustomerInfoRequest {
                navn: &customer.name,
                telefonnummer: customer.phone.as_str(),
                epost: customer.email.as_str(),
                role_id: RoleId::Customer,
            },
            tjenester: self
                .order
                .services
                .iter()
                .map(|line| ServiceRequest {
                    tjeneste_dato: line.service_date.format("%Y-%m-%d").to_string(),
                    address_from: &line.address_from,
                    address_to: line.address_to.as_deref().unwrap_or_default(),
                    kommentar: &line.comment,
                    pris: line.price,
                    tjeneste_type_id: line.service_type.type_id(),
                })
                .collect(),
        }
    }
}

/// Order operations the state stores depend on.
pub trait OrderApi: Send + Sync {
    /// All orders visible to the operator.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// A single order by id.
    fn get_order(&self, id: OrderId) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Create an order.
    fn create_order(&self, draft: &OrderDraft) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Replace an order's details.
    fn update_order(
        &self,
        id: OrderId,
        draft: &OrderDraft,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Delete an order.
    fn delete_order(&self, id: OrderId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Find an existing person by email. `Ok(None)` when there is none.
    fn check_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Person>, ApiError>> + Send;

    /// Record a payment.
    fn pay(&self, id: OrderId, amount: Price) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Record a refund.
    fn refund(&self, id: OrderId, amount: Price) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set the order status.
    fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

impl OrderApi for Authorized {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders: Vec<OrderDto> = self.get(ORDER_PATH).await?;
        Ok(orders.into_iter().map(convert_order).collect())
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let order: OrderDto = self.get(&format!("{ORDER_PATH}/{id}")).await?;
        Ok(convert_order(order))
    }

    #[instrument(skip(self, draft), fields(lines = draft.order.services.len()))]
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let order: OrderDto = self.post(ORDER_PATH, &draft.to_request()).await?;
        Ok(convert_order(order))
    }

    #[instrument(skip(self, draft), fields(order_id = %id))]
    async fn update_order(&self, id: OrderId, draft: &OrderDraft) -> Result<Order, ApiError> {
        let order: OrderDto = self
            .put(&format!("{ORDER_PATH}/{id}"), &draft.to_request())
            .await?;
        Ok(convert_order(order))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
        self.delete(&format!("{ORDER_PATH}/{id}")).await
    }

    #[instrument(skip(self))]
    async fn check_email(&self, email: &str) -> Result<Option<Person>, ApiError> {
        let response = self.get_raw(EMAIL_CHECK_PATH, &[("email", email)]).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status if status.is_client_error() || status.is_server_error() => {
                tracing::warn!(status = status.as_u16(), "Email check failed");
                Err(ApiError::Failed("Failed to check email".to_string()))
            }
            _ => {
                let person: PersonDto = handle_response(response).await?;
                Ok(Some(convert_person(person)))
            }
        }
    }

    #[instrument(skip(self), fields(order_id = %id, amount = %amount))]
    async fn pay(&self, id: OrderId, amount: Price) -> Result<(), ApiError> {
        let body = PaymentRequest {
            bestille_id: id,
            amount_paid: amount,
        };
        self.post_empty(PAYMENTS_PATH, &body)
            .await
            .map_err(|e| settle_error(e, "This order is already paid.", "Payment failed."))
    }

    #[instrument(skip(self), fields(order_id = %id, amount = %amount))]
    async fn refund(&self, id: OrderId, amount: Price) -> Result<(), ApiError> {
        let body = PaymentRequest {
            bestille_id: id,
            amount_paid: amount,
        };
        self.post_empty(REFUNDS_PATH, &body).await.map_err(|e| {
            settle_error(e, "This order cannot be refunded.", "Refund failed.")
        })
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, ApiError> {
        let body = OrderStatusRequest {
            order_id: id,
            order_status: status.as_str(),
        };
        let response = self
            .request(reqwest::Method::PUT, STATUS_PATH)?
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }

        // Some backends answer 204; fall back to re-reading the order.
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return self.get_order(id).await;
        }
        let order: OrderDto = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")))?;
        Ok(convert_order(order))
    }
}

/// Payments and refunds report a fixed message; 409 has its own.
fn settle_error(error: ApiError, conflict: &str, failure: &str) -> ApiError {
    match error {
        ApiError::Unauthorized => ApiError::Unauthorized,
        ApiError::Api { status: 409, .. } => ApiError::Conflict(conflict.to_string()),
        other => {
            tracing::warn!(error = %other, "Settlement call failed");
            ApiError::Failed(failure.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tmc_core::ServiceType;
    use tmc_core::validation::{PersonInput, ValidServiceLine, validate_person};

    #[test]
    fn test_settle_error_mapping() {
        let conflict = settle_error(
            ApiError::Api {
                status: 409,
                message: Some("duplicate".to_string()),
            },
            "This order is already paid.",
            "Payment failed.",
        );
        assert_eq!(conflict.user_message(), "This order is already paid.");

        let other = settle_error(
            ApiError::Api {
                status: 500,
                message: None,
            },
            "This order is already paid.",
            "Payment failed.",
        );
        assert_eq!(other.user_message(), "Payment failed.");

        let expired = settle_error(ApiError::Unauthorized, "x", "y");
        assert!(matches!(expired, ApiError::Unauthorized));
    }

    #[test]
    fn test_draft_request_shape() {
        let customer = validate_person(&PersonInput {
            name: "Kari".to_string(),
            email: "kari@example.no".to_string(),
            phone: "1234567890".to_string(),
        })
        .unwrap();
        let draft = OrderDraft {
            consultant_id: Some(PersonId::new(4)),
            customer_id: None,
            order: ValidOrder {
                customer,
                services: vec![ValidServiceLine {
                    service_type: ServiceType::Packing,
                    service_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                    address_from: "Storgata 1".to_string(),
                    address_to: None,
                    comment: "Boxes".to_string(),
                    price: "800".parse().unwrap(),
                }],
            },
        };

        let json = serde_json::to_value(draft.to_request()).unwrap();
        assert_eq!(json["konsulentid"], 4);
        assert_eq!(json["kundeInfo"]["epost"], "kari@example.no");
        assert_eq!(json["tjenester"][0]["tjenesteTypeId"], 3);
        assert_eq!(json["tjenester"][0]["tjenesteDato"], "2026-07-01");
        assert_eq!(json["tjenester"][0]["addressTo"], "");
    }
}
