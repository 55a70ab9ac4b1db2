//! HTTP clients for the storefront's consumed services.
//!
//! Each consumed service gets one thin client plus an `async_trait` seam so
//! the orchestration layers can be exercised against mocks. Clients never
//! retry or absorb failures; that policy belongs to their callers.

use thiserror::Error;

pub mod coupons;
pub mod orders;
pub mod paypal;
pub mod settings;

/// Errors that can occur when calling a backend service.
///
/// Transport failures and rejections read identically to the shopper
/// ("could not complete this step") but are logged with distinct detail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connect, timeout, body decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service responded with a non-success status.
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the service.
        status: reqwest::StatusCode,
        /// Response body text, for logging.
        body: String,
    },
}

/// Resolve a response into itself or an [`ApiError::Rejected`] carrying the
/// status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    Err(ApiError::Rejected { status, body })
}
