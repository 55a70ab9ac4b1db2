//! Payment processor client.
//!
//! Two calls drive the external payment protocol: order creation, which
//! yields an approval link the browser navigates to, and capture, which the
//! return route invokes after the processor redirects back.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::customer::Customer;

use super::{ApiError, ensure_success};

/// One line item as sent to the payment processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentItem {
    /// Product identity.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Unit price in `currency`.
    pub unit_price: Decimal,

    /// Quantity ordered.
    pub quantity: u32,

    /// ISO 4217 currency code.
    pub currency: String,
}

/// Request body for processor order creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentOrder {
    /// Line items being paid for.
    pub items: Vec<PaymentItem>,

    /// ISO 4217 currency code for the whole order.
    pub currency: String,

    /// URL the processor redirects back to after approval.
    pub return_url: String,

    /// URL the processor redirects back to on cancel.
    pub cancel_url: String,

    /// Brand name shown on the processor's approval page.
    pub brand_name: String,
}

/// A hypermedia link in the processor's order-creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLink {
    /// Link relation; the approval page has `rel == "approve"`.
    pub rel: String,

    /// Link target.
    pub href: String,
}

/// Processor response to order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPaymentOrder {
    /// Processor-issued order identifier.
    pub id: String,

    /// Hypermedia links, one of which should be the approval page.
    #[serde(default)]
    pub links: Vec<OrderLink>,
}

impl CreatedPaymentOrder {
    /// The approval URL the browser must navigate to, if the processor
    /// supplied one.
    #[must_use]
    pub fn approval_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href.as_str())
    }
}

/// Request body for capturing an approved order.
#[derive(Debug, Clone, Serialize)]
pub struct CapturePaymentOrder {
    /// Processor-issued order identifier, echoed from the return redirect.
    #[serde(rename = "orderID")]
    pub order_id: String,

    /// Customer fields collected before the redirect.
    pub customer: Customer,

    /// The item snapshot taken before the redirect.
    pub items: Vec<PaymentItem>,
}

/// Receipt for a completed capture: how the server-side order fan-out went.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureReceipt {
    /// Internal orders the backend created from the captured payment.
    #[serde(default)]
    pub orders_created: u64,

    /// Per-order failure details for any internal orders that could not be
    /// created.
    #[serde(default)]
    pub orders_failed: Vec<serde_json::Value>,
}

/// Access to the payment processor's order endpoints.
#[automock]
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Create a processor order for the given items.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn create_order(
        &self,
        request: &CreatePaymentOrder,
    ) -> Result<CreatedPaymentOrder, ApiError>;

    /// Capture a processor order the shopper has approved.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn capture_order(
        &self,
        request: &CapturePaymentOrder,
    ) -> Result<CaptureReceipt, ApiError>;
}

/// HTTP client for the payment processor's backend routes.
#[derive(Debug, Clone)]
pub struct HttpPaymentsApi {
    base_url: String,
    http: Client,
}

impl HttpPaymentsApi {
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
impl PaymentsApi for HttpPaymentsApi {
    async fn create_order(
        &self,
        request: &CreatePaymentOrder,
    ) -> Result<CreatedPaymentOrder, ApiError> {
        let url = format!("{}/paypal/create-paypal-order", self.base_url);

        let response = ensure_success(self.http.post(&url).json(request).send().await?).await?;

        Ok(response.json().await?)
    }

    async fn capture_order(
        &self,
        request: &CapturePaymentOrder,
    ) -> Result<CaptureReceipt, ApiError> {
        let url = format!("{}/paypal/capture-paypal-order", self.base_url);

        let response = ensure_success(self.http.post(&url).json(request).send().await?).await?;

        Ok(response.json().await?)
    }
}
