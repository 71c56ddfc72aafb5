//! Order store, including the payment and cancellation flows.

use serde::Serialize;
use tracing::instrument;

use tmc_core::{Order, OrderId, OrderStatus, Person, Price};

use super::{ResourceCore, ResourceState};
use crate::backend::{ApiError, OrderApi, OrderDraft};

/// What happened to the refund half of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RefundOutcome {
    /// No refund was asked for, or the order was not paid.
    NotRequested,
    /// The full total was refunded.
    Refunded(Price),
    /// The order is cancelled but the refund failed with this message.
    Failed(String),
    /// The order is cancelled but the backend rejected the token on the
    /// refund call, so no refund was made.
    SessionExpired,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    pub order: Order,
    pub refund: RefundOutcome,
}

/// State store for orders.
pub struct OrderStore<A> {
    api: A,
    core: ResourceCore<Order>,
}

impl<A: OrderApi> OrderStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            core: ResourceCore::new(),
        }
    }

    pub async fn snapshot(&self) -> ResourceState<Order> {
        self.core.snapshot().await
    }

    /// Load every order.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<(), ApiError> {
        let _in_flight = self.core.begin();
        let generation = self.core.next_list_generation();
        let result = self.api.list_orders().await;
        self.core.apply_list(generation, &result).await;
        result.map(|_| ())
    }

    /// Load one order into `current`.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn fetch_by_id(&self, id: OrderId) -> Result<Order, ApiError> {
        let _in_flight = self.core.begin();
        let generation = self.core.next_item_generation();
        let result = self.api.get_order(id).await;
        self.core.apply_item(generation, &result).await;
        result
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let _in_flight = self.core.begin();
        match self.api.create_order(draft).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, total = %order.total_price, "Order created");
                self.core.insert(order.clone()).await;
                Ok(order)
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, draft), fields(order_id = %id))]
    pub async fn update(&self, id: OrderId, draft: &OrderDraft) -> Result<Order, ApiError> {
        let _in_flight = self.core.begin();
        match self.api.update_order(id, draft).await {
            Ok(order) => {
                tracing::info!(order_id = %id, "Order updated");
                self.core.replace(order.clone()).await;
                Ok(order)
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn remove(&self, id: OrderId) -> Result<(), ApiError> {
        let _in_flight = self.core.begin();
        match self.api.delete_order(id).await {
            Ok(()) => {
                tracing::info!(order_id = %id, "Order deleted");
                self.core.remove(id).await;
                Ok(())
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.fetch_all().await
    }

    pub async fn clear_error(&self) {
        self.core.clear_error().await;
    }

    /// Look up an existing customer by email. Not found is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the backend error for anything but not found.
    #[instrument(skip(self))]
    pub async fn check_email(&self, email: &str) -> Result<Option<Person>, ApiError> {
        let _in_flight = self.core.begin();
        match self.api.check_email(email).await {
            Ok(found) => Ok(found),
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Pay the order's full total.
    ///
    /// # Errors
    ///
    /// Refuses orders whose payment is already settled without calling the
    /// backend; otherwise returns the backend error.
    #[instrument(skip(self, order), fields(order_id = %order.id, total = %order.total_price))]
    pub async fn pay(&self, order: &Order) -> Result<(), ApiError> {
        if !order.actions().can_pay {
            let e = ApiError::Conflict("This order is already paid.".to_string());
            self.core.fail(&e).await;
            return Err(e);
        }

        let outcome = {
            let _in_flight = self.core.begin();
            self.api.pay(order.id, order.total_price).await
        };
        match outcome {
            Ok(()) => {
                tracing::info!(order_id = %order.id, "Order paid");
                self.refresh_after(order.id).await;
                Ok(())
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Refund `amount` on an order.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(order_id = %id, amount = %amount))]
    pub async fn refund(&self, id: OrderId, amount: Price) -> Result<(), ApiError> {
        let outcome = {
            let _in_flight = self.core.begin();
            self.api.refund(id, amount).await
        };
        match outcome {
            Ok(()) => {
                tracing::info!(order_id = %id, "Order refunded");
                self.refresh_after(id).await;
                Ok(())
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Set an order's fulfilment status.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, ApiError> {
        let outcome = {
            let _in_flight = self.core.begin();
            self.api.update_status(id, status).await
        };
        match outcome {
            Ok(order) => {
                tracing::info!(order_id = %id, status = %order.order_status, "Order status updated");
                self.core.replace(order.clone()).await;
                self.refresh_after(id).await;
                Ok(order)
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Cancel an order, then refund its total if asked and it was paid.
    ///
    /// The two backend calls are not atomic. A failed refund, including a
    /// rejected token, leaves the order cancelled and is reported in
    /// [`CancelOutcome::refund`].
    ///
    /// # Errors
    ///
    /// Refuses orders that are already completed or cancelled without
    /// calling the backend; otherwise returns the status update's error.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn cancel(&self, order: &Order, refund_requested: bool) -> Result<CancelOutcome, ApiError> {
        let actions = order.actions();
        if !actions.can_cancel {
            let e = ApiError::Failed("This order can no longer be cancelled.".to_string());
            self.core.fail(&e).await;
            return Err(e);
        }

        let cancelled = self.update_status(order.id, &OrderStatus::Cancelled).await?;

        let refund = if actions.should_refund(refund_requested) {
            match self.refund(order.id, order.total_price).await {
                Ok(()) => RefundOutcome::Refunded(order.total_price),
                Err(ApiError::Unauthorized) => {
                    tracing::warn!(order_id = %order.id, "Token rejected on refund after cancellation");
                    RefundOutcome::SessionExpired
                }
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "Refund after cancellation failed");
                    RefundOutcome::Failed(e.user_message())
                }
            }
        } else {
            RefundOutcome::NotRequested
        };

        let order = self
            .snapshot()
            .await
            .current
            .filter(|current| current.id == order.id)
            .unwrap_or(cancelled);

        Ok(CancelOutcome { order, refund })
    }

    /// Reload the list, and the current order if it is the one affected.
    async fn refresh_after(&self, id: OrderId) {
        if let Err(e) = self.fetch_all().await {
            tracing::warn!(order_id = %id, error = %e, "Refresh after order change failed");
        }
        if self.core.current_key().await == Some(id)
            && let Err(e) = self.fetch_by_id(id).await
        {
            tracing::warn!(order_id = %id, error = %e, "Reload of current order failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Mutex;

    use tmc_core::{CustomerSnapshot, PaymentStatus, PersonId, RoleId};

    use super::*;

    #[derive(Default)]
    struct Calls {
        list: AtomicUsize,
        get: AtomicUsize,
        pay: AtomicUsize,
        refund: AtomicUsize,
        status: AtomicUsize,
    }

    #[derive(Default)]
    struct FakeOrders {
        orders: Mutex<Vec<Order>>,
        calls: Calls,
        refunded: Mutex<Vec<Price>>,
        fail_refund: bool,
        reject_refund_token: bool,
        conflict_on_pay: bool,
    }

    fn order(id: i64, status: OrderStatus, payment: PaymentStatus, total: &str) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: Some(PersonId::new(1)),
            customer: CustomerSnapshot {
                name: "Kari".to_string(),
                email: "kari@example.no".to_string(),
                phone: "1234567890".to_string(),
            },
            consultant_id: Some(PersonId::new(2)),
            consultant_name: "Ola".to_string(),
            services: Vec::new(),
            total_price: total.parse().unwrap(),
            order_date: None,
            order_status: status,
            payment_status: payment,
        }
    }

    impl FakeOrders {
        fn with(orders: Vec<Order>) -> Self {
            Self {
                orders: Mutex::new(orders),
                ..Self::default()
            }
        }

        async fn set_payment(&self, id: OrderId, status: PaymentStatus) {
            if let Some(o) = self.orders.lock().await.iter_mut().find(|o| o.id == id) {
                o.payment_status = status;
            }
        }
    }

    fn not_found() -> ApiError {
        ApiError::Api {
            status: 404,
            message: Some("Order not found".to_string()),
        }
    }

    impl OrderApi for Arc<FakeOrders> {
        async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
            self.calls.list.fetch_add(1, Ordering::SeqCst);
            Ok(self.orders.lock().await.clone())
        }

        async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
            self.calls.get.fetch_add(1, Ordering::SeqCst);
            self.orders
                .lock()
                .await
                .iter()
                .find(|o| o.id == id)
                .cloned()
                .ok_or_else(not_found)
        }

        async fn create_order(&self, _draft: &OrderDraft) -> Result<Order, ApiError> {
            Err(ApiError::Failed("not used".to_string()))
        }

        async fn update_order(&self, _id: OrderId, _draft: &OrderDraft) -> Result<Order, ApiError> {
            Err(ApiError::Failed("not used".to_string()))
        }

        async fn delete_order(&self, id: OrderId) -> Result<(), ApiError> {
            self.orders.lock().await.retain(|o| o.id != id);
            Ok(())
        }

        async fn check_email(&self, email: &str) -> Result<Option<Person>, ApiError> {
            Ok((email == "kari@example.no").then(|| Person {
                id: PersonId::new(1),
                name: "Kari".to_string(),
                email: email.to_string(),
                phone: "1234567890".to_string(),
                role_id: RoleId::Customer,
            }))
        }

        async fn pay(&self, id: OrderId, _amount: Price) -> Result<(), ApiError> {
            self.calls.pay.fetch_add(1, Ordering::SeqCst);
            if self.conflict_on_pay {
                return Err(ApiError::Conflict("This order is already paid.".to_string()));
            }
            self.set_payment(id, PaymentStatus::Paid).await;
            Ok(())
        }

        async fn refund(&self, id: OrderId, amount: Price) -> Result<(), ApiError> {
            self.calls.refund.fetch_add(1, Ordering::SeqCst);
            if self.fail_refund {
                return Err(ApiError::Failed("Refund failed.".to_string()));
            }
            if self.reject_refund_token {
                return Err(ApiError::Unauthorized);
            }
            self.refunded.lock().await.push(amount);
            self.set_payment(id, PaymentStatus::Refunded).await;
            Ok(())
        }

        async fn update_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, ApiError> {
            self.calls.status.fetch_add(1, Ordering::SeqCst);
            let mut orders = self.orders.lock().await;
            let order = orders.iter_mut().find(|o| o.id == id).ok_or_else(not_found)?;
            order.order_status = status.clone();
            Ok(order.clone())
        }
    }

    #[tokio::test]
    async fn test_cancel_paid_order_with_refund_issues_one_refund_for_total() {
        let paid = order(7, OrderStatus::Pending, PaymentStatus::Paid, "2500");
        let api = Arc::new(FakeOrders::with(vec![paid.clone()]));
        let store = OrderStore::new(api.clone());

        let outcome = store.cancel(&paid, true).await.unwrap();

        assert_eq!(api.calls.status.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.refund.load(Ordering::SeqCst), 1);
        assert_eq!(*api.refunded.lock().await, vec![paid.total_price]);
        assert_eq!(outcome.refund, RefundOutcome::Refunded(paid.total_price));
        assert_eq!(outcome.order.order_status, OrderStatus::Cancelled);

        let state = store.snapshot().await;
        assert_eq!(state.items[0].payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_cancel_unpaid_order_never_refunds() {
        let unpaid = order(8, OrderStatus::Pending, PaymentStatus::Unpaid, "900");
        let api = Arc::new(FakeOrders::with(vec![unpaid.clone()]));
        let store = OrderStore::new(api.clone());

        let outcome = store.cancel(&unpaid, true).await.unwrap();

        assert_eq!(api.calls.refund.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.refund, RefundOutcome::NotRequested);
    }

    #[tokio::test]
    async fn test_failed_refund_keeps_cancellation() {
        let paid = order(9, OrderStatus::Pending, PaymentStatus::Paid, "1200");
        let api = Arc::new(FakeOrders {
            fail_refund: true,
            ..FakeOrders::with(vec![paid.clone()])
        });
        let store = OrderStore::new(api.clone());

        let outcome = store.cancel(&paid, true).await.unwrap();

        assert_eq!(outcome.order.order_status, OrderStatus::Cancelled);
        assert_eq!(outcome.refund, RefundOutcome::Failed("Refund failed.".to_string()));
        assert_eq!(store.snapshot().await.error.as_deref(), Some("Refund failed."));
    }

    #[tokio::test]
    async fn test_rejected_token_on_refund_still_reports_cancellation() {
        let paid = order(11, OrderStatus::Pending, PaymentStatus::Paid, "1200");
        let api = Arc::new(FakeOrders {
            reject_refund_token: true,
            ..FakeOrders::with(vec![paid.clone()])
        });
        let store = OrderStore::new(api.clone());

        let outcome = store.cancel(&paid, true).await.unwrap();

        assert_eq!(outcome.refund, RefundOutcome::SessionExpired);
        assert_eq!(outcome.order.order_status, OrderStatus::Cancelled);
        assert_eq!(api.calls.refund.load(Ordering::SeqCst), 1);
        assert!(api.refunded.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_refused_for_closed_order() {
        let done = order(10, OrderStatus::Completed, PaymentStatus::Paid, "100");
        let api = Arc::new(FakeOrders::with(vec![done.clone()]));
        let store = OrderStore::new(api.clone());

        assert!(store.cancel(&done, true).await.is_err());
        assert_eq!(api.calls.status.load(Ordering::SeqCst), 0);
        assert_eq!(api.calls.refund.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pay_refreshes_list_and_current() {
        let unpaid = order(11, OrderStatus::Pending, PaymentStatus::Unpaid, "700");
        let api = Arc::new(FakeOrders::with(vec![unpaid.clone()]));
        let store = OrderStore::new(api.clone());
        store.fetch_by_id(unpaid.id).await.unwrap();

        store.pay(&unpaid).await.unwrap();

        assert_eq!(api.calls.pay.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.list.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.get.load(Ordering::SeqCst), 2);
        let state = store.snapshot().await;
        assert_eq!(state.current.unwrap().payment_status, PaymentStatus::Paid);
        assert_eq!(state.items[0].payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_pay_settled_order_is_refused_locally() {
        let paid = order(12, OrderStatus::Pending, PaymentStatus::Paid, "700");
        let api = Arc::new(FakeOrders::with(vec![paid.clone()]));
        let store = OrderStore::new(api.clone());

        let err = store.pay(&paid).await.unwrap_err();
        assert_eq!(err.user_message(), "This order is already paid.");
        assert_eq!(api.calls.pay.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pay_conflict_is_reported() {
        let stale = order(13, OrderStatus::Pending, PaymentStatus::Unpaid, "700");
        let api = Arc::new(FakeOrders {
            conflict_on_pay: true,
            ..FakeOrders::with(vec![stale.clone()])
        });
        let store = OrderStore::new(api.clone());

        let err = store.pay(&stale).await.unwrap_err();
        assert_eq!(err.user_message(), "This order is already paid.");
        assert_eq!(
            store.snapshot().await.error.as_deref(),
            Some("This order is already paid.")
        );
        assert_eq!(api.calls.list.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_check_email_not_found_is_none() {
        let api = Arc::new(FakeOrders::default());
        let store = OrderStore::new(api.clone());

        assert!(store.check_email("nobody@example.no").await.unwrap().is_none());
        let found = store.check_email("kari@example.no").await.unwrap().unwrap();
        assert_eq!(found.name, "Kari");
        assert!(store.snapshot().await.error.is_none());
    }

    #[tokio::test]
    async fn test_remove_filters_list() {
        let a = order(1, OrderStatus::Pending, PaymentStatus::Unpaid, "100");
        let b = order(2, OrderStatus::Pending, PaymentStatus::Unpaid, "200");
        let api = Arc::new(FakeOrders::with(vec![a, b]));
        let store = OrderStore::new(api.clone());
        store.fetch_all().await.unwrap();

        store.remove(OrderId::new(1)).await.unwrap();

        let ids: Vec<_> = store.snapshot().await.items.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![OrderId::new(2)]);
    }
}
