//! Cart
//!
//! The cart is the single source of truth for what the shopper intends to
//! buy. It is persisted whole under [`CART_KEY`] on every mutation so that it
//! survives page navigation and reload, and it notifies subscribers (nav
//! badge, modal renderers) through a watch channel carrying the total
//! quantity.
//!
//! The slot is read fresh when each view constructs its store and rewritten
//! whole on each mutation. Two sessions sharing one slot race with
//! last-writer-wins semantics; there is no merge. This is an accepted
//! limitation of the durable slot, not something the store papers over.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

use crate::{
    pricing::{self, PriceError},
    storage::{CART_KEY, KeyValueSlot, SlotError},
};

/// Errors related to cart persistence or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// The durable slot could not be read or written.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The cart could not be serialized for persistence.
    #[error("failed to encode cart: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Price arithmetic failed while deriving a total.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// A product as presented by a listing or detail view, before it becomes a
/// cart line.
#[derive(Debug, Clone)]
pub struct Product {
    /// Stable product identifier, when the catalog provides one.
    pub id: Option<String>,

    /// Display title. Doubles as the line identifier when `id` is absent.
    pub title: String,

    /// Unit price, non-negative.
    pub unit_price: Decimal,

    /// Optional display image reference.
    pub image: Option<String>,
}

impl Product {
    fn line_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.title)
    }
}

/// One distinct product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Stable line identifier; at most one line per id exists in a cart.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Unit price.
    pub unit_price: Decimal,

    /// Positive quantity.
    pub quantity: u32,

    /// Optional display image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// Total for this line: `unit_price * quantity`.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the product overflows.
    pub fn total(&self) -> Result<Decimal, PriceError> {
        pricing::line_total(self.unit_price, self.quantity)
    }
}

/// Durable cart store with change notification.
pub struct CartStore {
    lines: Vec<CartLine>,
    slot: Arc<dyn KeyValueSlot>,
    changes: watch::Sender<u32>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the cart persisted in `slot`, starting empty when nothing is
    /// stored. A corrupt payload is discarded rather than blocking the view.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the slot itself cannot be read.
    pub fn load(slot: Arc<dyn KeyValueSlot>) -> Result<Self, CartError> {
        let lines = match slot.read(CART_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(lines) => lines,
                Err(error) => {
                    warn!(%error, "discarding unreadable persisted cart");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let (changes, _) = watch::channel(total_of(&lines));

        Ok(Self {
            lines,
            slot,
            changes,
        })
    }

    /// Add a product to the cart. An existing line with the same id has its
    /// quantity incremented instead of a duplicate being appended.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn add(&mut self, product: &Product) -> Result<(), CartError> {
        let id = product.line_id();

        match self.lines.iter_mut().find(|line| line.id == id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                id: id.to_string(),
                title: product.title.clone(),
                unit_price: product.unit_price,
                quantity: 1,
                image: product.image.clone(),
            }),
        }

        self.persist()
    }

    /// Adjust the quantity of the line at `index` by `delta`, removing the
    /// line when the result drops to zero or below. An out-of-range index is
    /// a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn update_quantity(&mut self, index: usize, delta: i64) -> Result<(), CartError> {
        let Some(line) = self.lines.get_mut(index) else {
            return Ok(());
        };

        let updated = i64::from(line.quantity).saturating_add(delta);

        if updated <= 0 {
            self.lines.remove(index);
        } else {
            line.quantity = u32::try_from(updated).unwrap_or(u32::MAX);
        }

        self.persist()
    }

    /// Remove the line at `index` unconditionally. An out-of-range index is
    /// a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn remove(&mut self, index: usize) -> Result<(), CartError> {
        if index >= self.lines.len() {
            return Ok(());
        }

        self.lines.remove(index);

        self.persist()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();

        self.persist()
    }

    /// The lines currently in the cart, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        total_of(&self.lines)
    }

    /// Sum of all line totals, before any discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Decimal, PriceError> {
        let mut subtotal = Decimal::ZERO;

        for line in &self.lines {
            subtotal += line.total()?;
        }

        Ok(pricing::round_money(subtotal))
    }

    /// Subscribe to change notifications. The channel carries the current
    /// total quantity, which is what the nav badge displays.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.changes.subscribe()
    }

    fn persist(&self) -> Result<(), CartError> {
        let encoded = serde_json::to_string(&self.lines)?;
        self.slot.write(CART_KEY, &encoded)?;

        self.changes.send_replace(self.total_quantity());

        Ok(())
    }
}

fn total_of(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}
