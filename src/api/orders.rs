//! Order service client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Serialize;

use crate::{cart::CartLine, customer::Customer};

use super::{ApiError, ensure_success};

/// One order-creation request, covering a single cart line.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    /// Customer full name.
    pub customer_name: String,

    /// Customer email address.
    pub customer_email: String,

    /// Customer phone number.
    pub customer_phone: String,

    /// Customer delivery address.
    pub customer_address: String,

    /// Product identity of the line being ordered.
    pub product_id: String,

    /// Product title of the line being ordered.
    pub product_title: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Initial order status; always `"Pending"` for client-created orders.
    pub status: String,

    /// Payment method label, e.g. `"Cash on Delivery"`.
    pub payment_method: String,

    /// Promo code applied to the batch, when one was active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

impl NewOrder {
    /// Build a pending order for one cart line, carrying the batch-wide
    /// customer fields, payment method label and promo code.
    #[must_use]
    pub fn pending(
        customer: &Customer,
        line: &CartLine,
        payment_method: &str,
        promo_code: Option<&str>,
    ) -> Self {
        Self {
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            customer_phone: customer.phone.clone(),
            customer_address: customer.address.clone(),
            product_id: line.id.clone(),
            product_title: line.title.clone(),
            quantity: line.quantity,
            status: "Pending".to_string(),
            payment_method: payment_method.to_string(),
            promo_code: promo_code.map(str::to_string),
        }
    }
}

/// Write access to the order service.
#[automock]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Create one order.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn create_order(&self, order: &NewOrder) -> Result<(), ApiError>;
}

/// HTTP client for the order service.
#[derive(Debug, Clone)]
pub struct HttpOrdersApi {
    base_url: String,
    http: Client,
}

impl HttpOrdersApi {
    /// Create a client against the given backend base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl OrdersApi for HttpOrdersApi {
    async fn create_order(&self, order: &NewOrder) -> Result<(), ApiError> {
        let url = format!("{}/api/orders", self.base_url);

        ensure_success(self.http.post(&url).json(order).send().await?).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    fn test_customer() -> Customer {
        Customer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Test Way".to_string(),
        }
    }

    fn test_line() -> CartLine {
        CartLine {
            id: "p1".to_string(),
            title: "Amber Candle".to_string(),
            unit_price: Decimal::from(12),
            quantity: 2,
            image: None,
        }
    }

    #[test]
    fn pending_order_carries_line_and_customer_fields() {
        let order = NewOrder::pending(
            &test_customer(),
            &test_line(),
            "Cash on Delivery",
            Some("SPRING10"),
        );

        assert_eq!(order.status, "Pending");
        assert_eq!(order.product_id, "p1");
        assert_eq!(order.quantity, 2);
        assert_eq!(order.customer_email, "ada@example.com");
        assert_eq!(order.promo_code.as_deref(), Some("SPRING10"));
    }

    #[test]
    fn promo_code_is_omitted_from_payload_when_absent() -> TestResult {
        let order = NewOrder::pending(&test_customer(), &test_line(), "Cash on Delivery", None);

        let encoded = serde_json::to_string(&order)?;

        assert!(!encoded.contains("promo_code"));

        Ok(())
    }
}
