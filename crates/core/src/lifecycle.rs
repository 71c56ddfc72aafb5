//! Order lifecycle: which actions an operator may take on an order.
//!
//! Fulfilment status and payment status are owned by the backend and move
//! independently. The affordances below are derived from the pair and are
//! re-checked server-side before any request is issued.

use serde::Serialize;

use crate::types::{OrderStatus, PaymentStatus};

/// Actions offered for an order in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct OrderActions {
    /// Order details may be changed.
    pub can_edit: bool,
    /// The order may be cancelled.
    pub can_cancel: bool,
    /// The order may be paid.
    pub can_pay: bool,
    /// The cancel confirmation offers a refund toggle.
    pub can_offer_refund: bool,
}

impl OrderActions {
    /// Derive the allowed actions from the two statuses.
    ///
    /// | Action | Enabled when |
    /// |---|---|
    /// | edit | order open and payment not settled |
    /// | cancel | order open |
    /// | pay | payment not settled |
    /// | refund | paid |
    #[must_use]
    pub fn derive(order_status: &OrderStatus, payment_status: &PaymentStatus) -> Self {
        let open = !order_status.is_closed();
        let settled = payment_status.is_settled();

        Self {
            can_edit: open && !settled,
            can_cancel: open,
            can_pay: !settled,
            can_offer_refund: *payment_status == PaymentStatus::Paid,
        }
    }

    /// Whether a cancellation with the refund toggle set should refund.
    #[must_use]
    pub const fn should_refund(self, refund_requested: bool) -> bool {
        refund_requested && self.can_offer_refund
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other(raw: &str) -> OrderStatus {
        OrderStatus::Other(raw.to_string())
    }

    #[test]
    fn test_edit_requires_open_and_unsettled() {
        let order_statuses = [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            other("in_progress"),
        ];
        let payment_statuses = [
            PaymentStatus::Unpaid,
            PaymentStatus::Paid,
            PaymentStatus::Refunded,
            PaymentStatus::Other("partial".to_string()),
        ];

        for order in &order_statuses {
            for payment in &payment_statuses {
                let actions = OrderActions::derive(order, payment);
                let expected = !matches!(order, OrderStatus::Completed | OrderStatus::Cancelled)
                    && !matches!(payment, PaymentStatus::Paid | PaymentStatus::Refunded);
                assert_eq!(actions.can_edit, expected, "{order} / {payment}");
            }
        }
    }

    #[test]
    fn test_pay_hidden_once_settled() {
        assert!(OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Unpaid).can_pay);
        assert!(!OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Paid).can_pay);
        assert!(!OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Refunded).can_pay);
        // Cancelled but unpaid orders can still be paid.
        assert!(OrderActions::derive(&OrderStatus::Cancelled, &PaymentStatus::Unpaid).can_pay);
    }

    #[test]
    fn test_cancel_ignores_payment_status() {
        assert!(OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Paid).can_cancel);
        assert!(!OrderActions::derive(&OrderStatus::Completed, &PaymentStatus::Unpaid).can_cancel);
        assert!(!OrderActions::derive(&OrderStatus::Cancelled, &PaymentStatus::Paid).can_cancel);
    }

    #[test]
    fn test_refund_only_when_paid() {
        let paid = OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Paid);
        assert!(paid.can_offer_refund);
        assert!(paid.should_refund(true));
        assert!(!paid.should_refund(false));

        let unpaid = OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Unpaid);
        assert!(!unpaid.should_refund(true));
        let refunded = OrderActions::derive(&OrderStatus::Pending, &PaymentStatus::Refunded);
        assert!(!refunded.can_offer_refund);
    }
}
