//! Coupons client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::discount::DiscountKind;

use super::{ApiError, ensure_success};

/// A coupon as served by the backend's coupon list.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponRecord {
    /// Code the shopper types in, matched case-insensitively.
    pub code: String,

    /// Display description.
    #[serde(default)]
    pub description: String,

    /// Whether the discount is a percentage or a fixed amount.
    pub discount_type: DiscountKind,

    /// Percent (0–100) or fixed amount, depending on `discount_type`.
    pub discount_value: Decimal,

    /// Inclusive first valid day, `YYYY-MM-DD`. Absent means unbounded.
    #[serde(default)]
    pub start_date: Option<String>,

    /// Inclusive last valid day, `YYYY-MM-DD`. Absent means unbounded.
    #[serde(default)]
    pub end_date: Option<String>,

    /// Inactive coupons never match regardless of dates.
    #[serde(default)]
    pub active: bool,
}

/// Read access to the coupon list.
#[automock]
#[async_trait]
pub trait CouponsApi: Send + Sync {
    /// Fetch all coupons, active or not; validity is decided client-side.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, ApiError>;
}

/// HTTP client for the coupons endpoint.
#[derive(Debug, Clone)]
pub struct HttpCouponsApi {
    base_url: String,
    http: Client,
}

impl HttpCouponsApi {
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
impl CouponsApi for HttpCouponsApi {
    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, ApiError> {
        let url = format!("{}/api/coupons", self.base_url);

        let response = ensure_success(self.http.get(&url).send().await?).await?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn coupon_record_parses_wire_shape() -> TestResult {
        let raw = r#"{
            "code": "SPRING10",
            "description": "Spring sale",
            "discount_type": "percent",
            "discount_value": 10.0,
            "start_date": "2025-03-01",
            "end_date": "2025-05-31",
            "active": true
        }"#;

        let coupon: CouponRecord = serde_json::from_str(raw)?;

        assert_eq!(coupon.code, "SPRING10");
        assert_eq!(coupon.discount_type, DiscountKind::Percent);
        assert_eq!(coupon.discount_value, Decimal::from(10));
        assert!(coupon.active);

        Ok(())
    }

    #[test]
    fn coupon_record_tolerates_missing_dates() -> TestResult {
        let raw = r#"{
            "code": "FLAT25",
            "discount_type": "fixed",
            "discount_value": 25.0,
            "active": true
        }"#;

        let coupon: CouponRecord = serde_json::from_str(raw)?;

        assert_eq!(coupon.discount_type, DiscountKind::Fixed);
        assert_eq!(coupon.start_date, None);
        assert_eq!(coupon.end_date, None);

        Ok(())
    }
}
