//! Pricing Refresher
//!
//! Keeps the site-wide discount percent current across a long-lived page
//! view. One synchronous fetch happens before the first discount-dependent
//! render, then a fixed-interval poll pushes changes to subscribers. A
//! failed fetch degrades to "no discount" for that tick and is retried on
//! the next one; it is never surfaced to the shopper and never retried
//! immediately.

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use tokio::{sync::watch, time};
use tracing::{debug, warn};

use crate::api::settings::SettingsApi;

/// Polls the settings endpoint and publishes the site-wide percent.
pub struct PricingRefresher {
    settings: Arc<dyn SettingsApi>,
    interval: Duration,
    current: watch::Sender<Decimal>,
}

impl std::fmt::Debug for PricingRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingRefresher")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl PricingRefresher {
    /// Create a refresher polling `settings` every `interval`.
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsApi>, interval: Duration) -> Self {
        let (current, _) = watch::channel(Decimal::ZERO);

        Self {
            settings,
            interval,
            current,
        }
    }

    /// Subscribe to the published percent. Starts at zero until
    /// [`PricingRefresher::init`] completes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Decimal> {
        self.current.subscribe()
    }

    /// Fetch once and publish unconditionally. Call before the first render
    /// of any discount-dependent surface.
    pub async fn init(&self) {
        let percent = self.fetch_percent().await;
        self.current.send_replace(percent);
    }

    /// One poll tick: fetch and publish only if the value changed, so
    /// unchanged ticks cause no re-render.
    pub async fn poll_once(&self) {
        let percent = self.fetch_percent().await;

        if percent != *self.current.borrow() {
            debug!(%percent, "site-wide discount changed");
            self.current.send_replace(percent);
        }
    }

    /// Run the poll loop forever: an initial fetch, then one fetch per
    /// interval tick.
    pub async fn run(&self) {
        self.init().await;

        let mut ticker = time::interval(self.interval);

        // The first tick of a fresh interval completes immediately; the
        // initial fetch above already covered it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    async fn fetch_percent(&self) -> Decimal {
        match self.settings.checkout_discount_percent().await {
            Ok(percent) => percent,
            Err(error) => {
                warn!(%error, "discount refresh failed; treating as zero until next tick");
                Decimal::ZERO
            }
        }
    }
}
