//! Payment Redirect Client
//!
//! Drives the external create-order → redirect → capture-on-return payment
//! protocol. Between creation and capture the browser leaves this system
//! entirely and the page may be fully reloaded, so the intent snapshot is
//! written to the durable slot before navigating away and read back on the
//! return route. The cart is never cleared before a capture success is
//! confirmed.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{
        ApiError,
        paypal::{
            CapturePaymentOrder, CaptureReceipt, CreatePaymentOrder, PaymentItem, PaymentsApi,
        },
    },
    cart::CartLine,
    config::StoreConfig,
    customer::Customer,
    storage::{KeyValueSlot, PAYMENT_CUSTOMER_KEY, PAYMENT_ITEMS_KEY, SlotError},
};

/// Errors raised by the payment flow.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// A payment cannot be started for an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The return route was hit with no persisted intent to capture.
    #[error("no payment is awaiting capture")]
    NoPendingPayment,

    /// The processor's creation response carried no approval link; the
    /// browser must not navigate.
    #[error("payment processor returned no approval link")]
    MissingApprovalLink,

    /// A processor call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The durable slot could not be read or written.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The intent snapshot could not be encoded or decoded.
    #[error("failed to encode payment snapshot: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Where a card-payment attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
    /// No attempt in flight.
    Idle,

    /// Processor order created, approval link not yet followed.
    Created,

    /// Browser handed off to (or returned from) the processor.
    Redirected,

    /// Capture confirmed; the snapshot has been discarded.
    Captured,

    /// Creation or capture failed; nothing is retried silently.
    Failed,
}

/// The snapshot that must survive the redirect round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    /// Cart lines frozen at initiation time.
    pub items: Vec<PaymentItem>,

    /// Customer contact fields collected before the redirect.
    pub customer: Customer,
}

/// Client-side driver for the redirect-based payment protocol.
pub struct PaymentRedirectClient {
    api: Arc<dyn PaymentsApi>,
    slot: Arc<dyn KeyValueSlot>,
    config: StoreConfig,
    phase: PaymentPhase,
}

impl std::fmt::Debug for PaymentRedirectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRedirectClient")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl PaymentRedirectClient {
    /// Create a client in the `Idle` phase.
    #[must_use]
    pub fn new(api: Arc<dyn PaymentsApi>, slot: Arc<dyn KeyValueSlot>, config: StoreConfig) -> Self {
        Self {
            api,
            slot,
            config,
            phase: PaymentPhase::Idle,
        }
    }

    /// The current phase of the attempt.
    #[must_use]
    pub fn phase(&self) -> PaymentPhase {
        self.phase
    }

    /// Start a card payment: snapshot the cart and customer into the durable
    /// slot, create a processor order, and return the approval URL the
    /// browser must navigate to.
    ///
    /// The snapshot is persisted before the creation request is issued, so a
    /// reload at any later point can still find it.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::EmptyCart`] when there is nothing to pay for.
    /// - [`PaymentError::MissingApprovalLink`] when the processor's response
    ///   carries no `approve` link; the attempt is failed and the browser
    ///   must not navigate.
    /// - [`PaymentError::Api`] / [`PaymentError::Slot`] on processor or slot
    ///   failure; the attempt is failed.
    pub async fn begin(
        &mut self,
        lines: &[CartLine],
        customer: &Customer,
    ) -> Result<String, PaymentError> {
        if lines.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let items: Vec<PaymentItem> = lines
            .iter()
            .map(|line| PaymentItem {
                id: line.id.clone(),
                title: line.title.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                currency: self.config.currency.clone(),
            })
            .collect();

        self.persist_intent(&items, customer)?;

        let request = CreatePaymentOrder {
            items,
            currency: self.config.currency.clone(),
            return_url: self.config.return_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            brand_name: self.config.brand_name.clone(),
        };

        let created = match self.api.create_order(&request).await {
            Ok(created) => created,
            Err(error) => {
                warn!(%error, "payment order creation failed");
                self.phase = PaymentPhase::Failed;
                return Err(error.into());
            }
        };

        self.phase = PaymentPhase::Created;

        let Some(approval) = created.approval_link() else {
            warn!(order_id = %created.id, "creation response carried no approval link");
            self.phase = PaymentPhase::Failed;
            return Err(PaymentError::MissingApprovalLink);
        };

        info!(order_id = %created.id, "handing off to payment processor");
        self.phase = PaymentPhase::Redirected;

        Ok(approval.to_string())
    }

    /// The intent persisted by a previous [`PaymentRedirectClient::begin`],
    /// if one survives in the slot.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the slot cannot be read or the snapshot
    /// cannot be decoded.
    pub fn pending_intent(&self) -> Result<Option<PaymentIntent>, PaymentError> {
        let (Some(raw_items), Some(raw_customer)) = (
            self.slot.read(PAYMENT_ITEMS_KEY)?,
            self.slot.read(PAYMENT_CUSTOMER_KEY)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(PaymentIntent {
            items: serde_json::from_str(&raw_items)?,
            customer: serde_json::from_str(&raw_customer)?,
        }))
    }

    /// Finish the payment after the processor redirected back: read the
    /// persisted intent, capture against the processor-issued `order_id`,
    /// and discard the snapshot on success.
    ///
    /// A capture failure keeps the snapshot so capture can be retried
    /// without re-collecting customer data. The caller clears the cart only
    /// after this returns `Ok`.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::NoPendingPayment`] when no snapshot survives.
    /// - [`PaymentError::Api`] when the capture is refused; the attempt is
    ///   failed but retryable.
    pub async fn resume(&mut self, order_id: &str) -> Result<CaptureReceipt, PaymentError> {
        let intent = self.pending_intent()?.ok_or(PaymentError::NoPendingPayment)?;

        self.phase = PaymentPhase::Redirected;

        let request = CapturePaymentOrder {
            order_id: order_id.to_string(),
            customer: intent.customer,
            items: intent.items,
        };

        let receipt = match self.api.capture_order(&request).await {
            Ok(receipt) => receipt,
            Err(error) => {
                warn!(%order_id, %error, "payment capture failed");
                self.phase = PaymentPhase::Failed;
                return Err(error.into());
            }
        };

        self.discard_intent()?;
        self.phase = PaymentPhase::Captured;

        info!(
            %order_id,
            orders_created = receipt.orders_created,
            "payment captured"
        );

        Ok(receipt)
    }

    /// Abandon the attempt explicitly (the processor's cancel redirect):
    /// discard the snapshot and return to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the slot cannot be written.
    pub fn cancel(&mut self) -> Result<(), PaymentError> {
        self.discard_intent()?;
        self.phase = PaymentPhase::Idle;

        Ok(())
    }

    fn persist_intent(
        &self,
        items: &[PaymentItem],
        customer: &Customer,
    ) -> Result<(), PaymentError> {
        self.slot
            .write(PAYMENT_ITEMS_KEY, &serde_json::to_string(items)?)?;
        self.slot
            .write(PAYMENT_CUSTOMER_KEY, &serde_json::to_string(customer)?)?;

        Ok(())
    }

    fn discard_intent(&self) -> Result<(), PaymentError> {
        self.slot.delete(PAYMENT_ITEMS_KEY)?;
        self.slot.delete(PAYMENT_CUSTOMER_KEY)?;

        Ok(())
    }
}
