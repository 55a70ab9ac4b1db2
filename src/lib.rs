//! Vitrine
//!
//! Vitrine is a client-resident shopping and checkout orchestration engine: a
//! durable cart shared across independent storefront views, a two-regime
//! discount engine, a polling pricing refresher, a per-line order submitter
//! with partial-failure reporting, and a redirect-based external payment
//! client that survives a full page reload between order creation and capture.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod customer;
pub mod discount;
pub mod payment;
pub mod pricing;
pub mod refresher;
pub mod storage;
