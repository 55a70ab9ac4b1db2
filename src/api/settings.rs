//! Checkout discount setting client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{ApiError, ensure_success};

/// Read access to site-wide settings.
#[automock]
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Fetch the current site-wide checkout discount percent (0–100).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn checkout_discount_percent(&self) -> Result<Decimal, ApiError>;
}

/// HTTP client for the settings endpoint.
#[derive(Debug, Clone)]
pub struct HttpSettingsApi {
    base_url: String,
    http: Client,
}

impl HttpSettingsApi {
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
impl SettingsApi for HttpSettingsApi {
    async fn checkout_discount_percent(&self) -> Result<Decimal, ApiError> {
        let url = format!("{}/api/settings/checkout_discount", self.base_url);

        let response = ensure_success(self.http.get(&url).send().await?).await?;
        let parsed: DiscountSetting = response.json().await?;

        Ok(parsed.percent)
    }
}

#[derive(Debug, Deserialize)]
struct DiscountSetting {
    #[serde(default)]
    percent: Decimal,
}
