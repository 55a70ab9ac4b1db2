//! Order Submitter
//!
//! The cash-on-delivery path: one order-creation request per cart line,
//! issued strictly sequentially so the failure report is deterministic. A
//! failed line never stops the batch; the shopper is told about every line
//! that failed, not just the first.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    api::{ApiError, orders::{NewOrder, OrdersApi}},
    cart::CartLine,
    customer::Customer,
};

/// One failed line in a batch submission.
#[derive(Debug)]
pub struct LineFailure {
    /// Position of the line in the cart at submission time.
    pub index: usize,

    /// Title of the failed line, for the inline error message.
    pub title: String,

    /// What went wrong.
    pub error: ApiError,
}

/// Aggregate outcome of one batch submission.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of lines attempted. Every line is always attempted.
    pub attempted: usize,

    /// Failures in cart order; empty means the whole batch succeeded.
    pub failures: Vec<LineFailure>,
}

impl BatchReport {
    /// Whether every line in the batch was accepted.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Submits one order per cart line against the order service.
pub struct OrderSubmitter {
    orders: Arc<dyn OrdersApi>,
}

impl std::fmt::Debug for OrderSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSubmitter").finish_non_exhaustive()
    }
}

impl OrderSubmitter {
    /// Create a submitter backed by the given order service.
    #[must_use]
    pub fn new(orders: Arc<dyn OrdersApi>) -> Self {
        Self { orders }
    }

    /// Submit the batch, one request per line, in cart order. Line `i + 1`
    /// is not attempted until line `i`'s response is observed. There is no
    /// cross-line transaction: a partial success is a real, reportable
    /// state.
    pub async fn submit(
        &self,
        lines: &[CartLine],
        customer: &Customer,
        payment_method: &str,
        promo_code: Option<&str>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, line) in lines.iter().enumerate() {
            report.attempted += 1;

            let order = NewOrder::pending(customer, line, payment_method, promo_code);

            match self.orders.create_order(&order).await {
                Ok(()) => {}
                Err(error) => {
                    warn!(index, title = %line.title, %error, "order line failed");
                    report.failures.push(LineFailure {
                        index,
                        title: line.title.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            failed = report.failures.len(),
            "order batch finished"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use crate::api::orders::MockOrdersApi;

    use super::*;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            id: id.to_string(),
            title: format!("Product {id}"),
            unit_price: Decimal::from(10),
            quantity,
            image: None,
        }
    }

    fn customer() -> Customer {
        Customer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Test Way".to_string(),
        }
    }

    fn rejected() -> ApiError {
        ApiError::Rejected {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "out of stock".to_string(),
        }
    }

    #[tokio::test]
    async fn all_lines_succeed() {
        let mut orders = MockOrdersApi::new();
        orders.expect_create_order().times(3).returning(|_| Ok(()));

        let submitter = OrderSubmitter::new(Arc::new(orders));
        let lines = [line("a", 1), line("b", 2), line("c", 1)];

        let report = submitter
            .submit(&lines, &customer(), "Cash on Delivery", None)
            .await;

        assert!(report.all_succeeded());
        assert_eq!(report.attempted, 3);
    }

    #[tokio::test]
    async fn middle_failure_does_not_stop_batch() {
        let mut orders = MockOrdersApi::new();
        orders.expect_create_order().times(3).returning(|order| {
            if order.product_id == "b" {
                Err(rejected())
            } else {
                Ok(())
            }
        });

        let submitter = OrderSubmitter::new(Arc::new(orders));
        let lines = [line("a", 1), line("b", 2), line("c", 1)];

        let report = submitter
            .submit(&lines, &customer(), "Cash on Delivery", None)
            .await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures.first().map(|f| f.index), Some(1));
        assert_eq!(
            report.failures.first().map(|f| f.title.as_str()),
            Some("Product b")
        );
    }

    #[tokio::test]
    async fn lines_are_submitted_in_cart_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);

        let mut orders = MockOrdersApi::new();
        orders.expect_create_order().returning(move |order| {
            if let Ok(mut ids) = recorder.lock() {
                ids.push(order.product_id.clone());
            }
            Ok(())
        });

        let submitter = OrderSubmitter::new(Arc::new(orders));
        let lines = [line("a", 1), line("b", 1), line("c", 1)];

        submitter
            .submit(&lines, &customer(), "Cash on Delivery", None)
            .await;

        let ids = seen.lock().map(|ids| ids.clone()).unwrap_or_default();

        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn promo_code_is_carried_on_every_line() {
        let mut orders = MockOrdersApi::new();
        orders
            .expect_create_order()
            .times(2)
            .withf(|order| order.promo_code.as_deref() == Some("SPRING10"))
            .returning(|_| Ok(()));

        let submitter = OrderSubmitter::new(Arc::new(orders));
        let lines = [line("a", 1), line("b", 1)];

        let report = submitter
            .submit(&lines, &customer(), "Cash on Delivery", Some("SPRING10"))
            .await;

        assert!(report.all_succeeded());
    }
}
