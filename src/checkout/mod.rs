//! Checkout
//!
//! The view-independent state machine binding cart, discount and submission
//! together. Views call the mutators and read the derived summary and
//! control flags; both derivations are pure, so recomputing them on every
//! cart mutation, method change or discount refresh produces identical
//! output for identical inputs.

use std::{sync::Arc, time::Duration};

use jiff::{Zoned, civil::Date};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::{
    api::{ApiError, coupons::CouponsApi, orders::OrdersApi, paypal::CaptureReceipt},
    cart::{CartError, CartLine, CartStore, Product},
    customer::Customer,
    discount::{DiscountEngine, DiscountError, DiscountRule, PromoCode},
    payment::{PaymentError, PaymentPhase, PaymentRedirectClient},
    pricing::PriceError,
};

pub mod submitter;

use submitter::{BatchReport, OrderSubmitter};

/// How long a success confirmation stays on screen before views dismiss it.
pub const CONFIRMATION_AUTO_DISMISS: Duration = Duration::from_secs(4);

/// Errors raised by checkout orchestration.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout is not in a state that allows this action (empty cart,
    /// or a submission already in flight).
    #[error("checkout is not ready to submit")]
    NotReady,

    /// The selected payment method gates the other submission path.
    #[error("the selected payment method does not allow this action")]
    WrongPaymentMethod,

    /// Cart persistence failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Promo validation failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Price arithmetic failed.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The card payment flow failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// The shopper's chosen way to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    /// Pay the courier; orders are submitted synchronously per line.
    #[default]
    CashOnDelivery,

    /// Pay by card through the external processor's redirect flow.
    PayPal,
}

impl PaymentMethod {
    /// The label recorded on orders created under this method.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::PayPal => "PayPal",
        }
    }
}

/// Checkout lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Cart is empty; nothing to submit.
    Empty,

    /// Cart non-empty, no submission in flight.
    Ready,

    /// Per-line synchronous submission in progress.
    Submitting,

    /// The card path has handed off to the external processor.
    AwaitingRedirect,
}

/// Which submission control each view should enable. Exactly one of the two
/// is enabled while the checkout is ready; both are disabled otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionControls {
    /// The synchronous cash-on-delivery submission button.
    pub cash_enabled: bool,

    /// The card/redirect submission button.
    pub card_enabled: bool,
}

/// Derived totals for the checkout surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    /// Sum of line totals before discount.
    pub subtotal: Decimal,

    /// Amount taken off the subtotal under the active rule.
    pub discount_amount: Decimal,

    /// The payable total.
    pub total: Decimal,

    /// The rule that produced the discount, for display.
    pub rule: Option<DiscountRule>,
}

/// Aggregate result of a cash-on-delivery submission.
#[derive(Debug)]
pub enum CashCheckoutOutcome {
    /// Every line was accepted; the cart has been cleared and the
    /// confirmation shows the discounted total.
    AllSucceeded {
        /// The discounted total the shopper owes on delivery.
        total: Decimal,
    },

    /// At least one line failed; the cart is untouched and the report names
    /// every failed line.
    PartialOrFullFailure {
        /// The per-line failure report.
        report: BatchReport,
    },
}

/// Render-independent coordinator for cart, discount and submission.
pub struct CheckoutOrchestrator {
    cart: CartStore,
    discounts: DiscountEngine,
    method: PaymentMethod,
    state: CheckoutState,
    submitter: OrderSubmitter,
    coupons: Arc<dyn CouponsApi>,
    payments: PaymentRedirectClient,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("state", &self.state)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Build an orchestrator over a loaded cart and the backend clients.
    #[must_use]
    pub fn new(
        cart: CartStore,
        orders: Arc<dyn OrdersApi>,
        coupons: Arc<dyn CouponsApi>,
        payments: PaymentRedirectClient,
    ) -> Self {
        let state = if cart.is_empty() {
            CheckoutState::Empty
        } else {
            CheckoutState::Ready
        };

        Self {
            cart,
            discounts: DiscountEngine::new(),
            method: PaymentMethod::default(),
            state,
            submitter: OrderSubmitter::new(orders),
            coupons,
            payments,
        }
    }

    /// The current checkout state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// The cart being checked out.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The discount engine, for display of the active rule.
    #[must_use]
    pub fn discounts(&self) -> &DiscountEngine {
        &self.discounts
    }

    /// Where the card payment attempt stands, if one is in flight.
    #[must_use]
    pub fn payment_phase(&self) -> PaymentPhase {
        self.payments.phase()
    }

    /// The selected payment method.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.method
    }

    /// Select the payment method, regating the submission controls.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.method = method;
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the cart cannot be persisted.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<(), CheckoutError> {
        self.cart.add(product)?;
        self.sync_state();

        Ok(())
    }

    /// Adjust a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the cart cannot be persisted.
    pub fn update_quantity(&mut self, index: usize, delta: i64) -> Result<(), CheckoutError> {
        self.cart.update_quantity(index, delta)?;
        self.sync_state();

        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the cart cannot be persisted.
    pub fn remove_line(&mut self, index: usize) -> Result<(), CheckoutError> {
        self.cart.remove(index)?;
        self.sync_state();

        Ok(())
    }

    /// Empty the cart, dropping any applied promo with it.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the cart cannot be persisted.
    pub fn clear_cart(&mut self) -> Result<(), CheckoutError> {
        self.cart.clear()?;
        self.sync_state();

        Ok(())
    }

    /// Push a refreshed site-wide percent into the discount engine. Wired to
    /// the pricing refresher's watch channel by the embedding view shell.
    pub fn refresh_site_wide(&mut self, percent: Decimal) {
        self.discounts.refresh_site_wide(percent);
    }

    /// Validate and apply a promo code against the backend coupon list as of
    /// today.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the coupon list cannot be fetched or
    /// the code matches no active, in-window coupon.
    pub async fn apply_promo(&mut self, code: &str) -> Result<PromoCode, CheckoutError> {
        self.apply_promo_at(code, Zoned::now().date()).await
    }

    /// [`CheckoutOrchestrator::apply_promo`] with an explicit "today".
    ///
    /// # Errors
    ///
    /// See [`CheckoutOrchestrator::apply_promo`].
    pub async fn apply_promo_at(
        &mut self,
        code: &str,
        today: Date,
    ) -> Result<PromoCode, CheckoutError> {
        let coupons = self.coupons.list_coupons().await?;

        let applied = self.discounts.apply_promo_code(code, &coupons, today)?;

        Ok(applied.clone())
    }

    /// Derived totals under the active discount rule. Pure and idempotent.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if price arithmetic overflows.
    pub fn summary(&self) -> Result<CheckoutSummary, CheckoutError> {
        let subtotal = self.cart.subtotal()?;
        let total = self.discounts.discounted_total(subtotal)?;

        Ok(CheckoutSummary {
            subtotal,
            discount_amount: subtotal - total,
            total,
            rule: self.discounts.active_rule(),
        })
    }

    /// Which submission control is enabled: a pure function of the selected
    /// method, cart emptiness, and whether a submission is in flight.
    #[must_use]
    pub fn controls(&self) -> SubmissionControls {
        let ready = self.state == CheckoutState::Ready && !self.cart.is_empty();

        SubmissionControls {
            cash_enabled: ready && self.method == PaymentMethod::CashOnDelivery,
            card_enabled: ready && self.method != PaymentMethod::CashOnDelivery,
        }
    }

    /// Place a cash-on-delivery order: one request per line, strictly in
    /// cart order. The cart is cleared only when every line succeeded;
    /// otherwise it is left untouched so the shopper can retry, and the
    /// outcome names every failed line.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotReady`] when the cart is empty or a submission
    ///   is already in flight.
    /// - [`CheckoutError::WrongPaymentMethod`] when the card method is
    ///   selected.
    pub async fn place_order(
        &mut self,
        customer: &Customer,
    ) -> Result<CashCheckoutOutcome, CheckoutError> {
        if self.state != CheckoutState::Ready || self.cart.is_empty() {
            return Err(CheckoutError::NotReady);
        }

        if self.method != PaymentMethod::CashOnDelivery {
            return Err(CheckoutError::WrongPaymentMethod);
        }

        let total = self.summary()?.total;
        let promo_code = self.discounts.promo().map(|promo| promo.code.clone());

        self.state = CheckoutState::Submitting;
        info!(lines = self.cart.lines().len(), "submitting order batch");

        let report = self
            .submitter
            .submit(
                self.cart.lines(),
                customer,
                self.method.label(),
                promo_code.as_deref(),
            )
            .await;

        if report.all_succeeded() {
            self.cart.clear()?;
            self.discounts.clear_promo();
            self.state = CheckoutState::Empty;

            info!(%total, "order batch completed");

            Ok(CashCheckoutOutcome::AllSucceeded { total })
        } else {
            // Failed lines stay in the cart for retry.
            self.state = CheckoutState::Ready;

            Ok(CashCheckoutOutcome::PartialOrFullFailure { report })
        }
    }

    /// Start the card payment flow and return the processor approval URL
    /// the browser must navigate to. This transition leaves the page.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotReady`] when the cart is empty or a submission
    ///   is already in flight.
    /// - [`CheckoutError::WrongPaymentMethod`] when cash-on-delivery is
    ///   selected.
    /// - [`CheckoutError::Payment`] when the processor order cannot be
    ///   created or carries no approval link; the browser must not navigate.
    pub async fn begin_card_payment(
        &mut self,
        customer: &Customer,
    ) -> Result<String, CheckoutError> {
        if self.state != CheckoutState::Ready || self.cart.is_empty() {
            return Err(CheckoutError::NotReady);
        }

        if self.method == PaymentMethod::CashOnDelivery {
            return Err(CheckoutError::WrongPaymentMethod);
        }

        let lines: Vec<CartLine> = self.cart.lines().to_vec();
        let approval_url = self.payments.begin(&lines, customer).await?;

        self.state = CheckoutState::AwaitingRedirect;

        Ok(approval_url)
    }

    /// Finish a card payment after the processor redirected back. Clears
    /// the cart and the promo only once the capture is confirmed; a capture
    /// failure leaves both intact.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if no payment snapshot survives or the
    /// capture is refused.
    pub async fn resume_card_payment(
        &mut self,
        order_id: &str,
    ) -> Result<CaptureReceipt, CheckoutError> {
        let receipt = self.payments.resume(order_id).await?;

        self.cart.clear()?;
        self.discounts.clear_promo();
        self.state = CheckoutState::Empty;

        Ok(receipt)
    }

    /// Abandon an in-flight card payment via the processor's cancel route.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the payment snapshot cannot be
    /// discarded.
    pub fn cancel_card_payment(&mut self) -> Result<(), CheckoutError> {
        self.payments.cancel()?;
        self.state = if self.cart.is_empty() {
            CheckoutState::Empty
        } else {
            CheckoutState::Ready
        };

        Ok(())
    }

    fn sync_state(&mut self) {
        // Cart mutations only move the machine between Empty and Ready; an
        // in-flight submission or redirect keeps its state.
        if !matches!(self.state, CheckoutState::Empty | CheckoutState::Ready) {
            return;
        }

        if self.cart.is_empty() {
            self.discounts.clear_promo();
            self.state = CheckoutState::Empty;
        } else {
            self.state = CheckoutState::Ready;
        }
    }
}
