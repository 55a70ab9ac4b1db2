//! Store Configuration

use std::{path::PathBuf, time::Duration};

/// Configuration for a storefront session.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the storefront backend, e.g. `"http://localhost:5000"`.
    pub api_base_url: String,

    /// ISO 4217 currency code used for every price, e.g. `"USD"`.
    pub currency: String,

    /// Brand name shown on the external payment processor's approval page.
    pub brand_name: String,

    /// URL the payment processor redirects back to after approval.
    pub return_url: String,

    /// URL the payment processor redirects back to on cancel.
    pub cancel_url: String,

    /// Directory backing the durable key-value slot.
    pub slot_dir: PathBuf,

    /// How often the sitewide discount percent is re-polled.
    pub refresh_interval: Duration,
}

impl StoreConfig {
    /// Create a configuration with the given backend base URL and defaults
    /// for everything else.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>, slot_dir: impl Into<PathBuf>) -> Self {
        let api_base_url = api_base_url.into();

        Self {
            currency: "USD".to_string(),
            brand_name: "Your Store".to_string(),
            return_url: format!("{api_base_url}/paypal/return"),
            cancel_url: format!("{api_base_url}/paypal/cancel"),
            slot_dir: slot_dir.into(),
            refresh_interval: Duration::from_secs(30),
            api_base_url,
        }
    }
}
