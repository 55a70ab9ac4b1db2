//! End-to-end checkout flows over mocked backend services.

use std::sync::Arc;

use rust_decimal::Decimal;
use testresult::TestResult;

use vitrine::{
    api::{
        coupons::{CouponRecord, MockCouponsApi},
        orders::MockOrdersApi,
        paypal::{CaptureReceipt, CreatedPaymentOrder, MockPaymentsApi, OrderLink},
    },
    cart::{CartStore, Product},
    checkout::{CashCheckoutOutcome, CheckoutOrchestrator, CheckoutState, PaymentMethod},
    config::StoreConfig,
    customer::Customer,
    discount::DiscountKind,
    payment::PaymentRedirectClient,
    storage::{JsonFileSlot, KeyValueSlot},
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

fn product(id: &str, price: &str) -> Product {
    Product {
        id: Some(id.to_string()),
        title: format!("Product {id}"),
        unit_price: dec(price),
        image: None,
    }
}

fn customer() -> Customer {
    Customer {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "1 Test Way".to_string(),
    }
}

fn no_coupons() -> MockCouponsApi {
    let mut coupons = MockCouponsApi::new();
    coupons.expect_list_coupons().returning(|| Ok(Vec::new()));
    coupons
}

fn approval_order() -> CreatedPaymentOrder {
    CreatedPaymentOrder {
        id: "ORDER-1".to_string(),
        links: vec![OrderLink {
            rel: "approve".to_string(),
            href: "https://processor/approve/ORDER-1".to_string(),
        }],
    }
}

#[tokio::test]
async fn cash_checkout_from_add_to_confirmation() -> TestResult {
    let dir = tempfile::tempdir()?;
    let slot: Arc<dyn KeyValueSlot> = Arc::new(JsonFileSlot::new(dir.path()));

    let mut orders = MockOrdersApi::new();
    orders
        .expect_create_order()
        .times(2)
        .withf(|order| order.status == "Pending" && order.payment_method == "Cash on Delivery")
        .returning(|_| Ok(()));

    let payments = PaymentRedirectClient::new(
        Arc::new(MockPaymentsApi::new()),
        Arc::clone(&slot),
        StoreConfig::new("http://localhost:5000", dir.path()),
    );

    let cart = CartStore::load(Arc::clone(&slot))?;
    let mut checkout =
        CheckoutOrchestrator::new(cart, Arc::new(orders), Arc::new(no_coupons()), payments);

    checkout.add_to_cart(&product("a", "30.00"))?;
    checkout.add_to_cart(&product("b", "20.00"))?;
    checkout.refresh_site_wide(dec("10"));

    let outcome = checkout.place_order(&customer()).await?;

    match outcome {
        CashCheckoutOutcome::AllSucceeded { total } => assert_eq!(total, dec("45.00")),
        CashCheckoutOutcome::PartialOrFullFailure { report } => {
            panic!("expected success, got {report:?}")
        }
    }

    // The emptied cart is what a fresh view sees after reload.
    let reloaded = CartStore::load(slot)?;
    assert!(reloaded.is_empty());

    Ok(())
}

#[tokio::test]
async fn promo_code_rides_along_on_every_order_line() -> TestResult {
    let dir = tempfile::tempdir()?;
    let slot: Arc<dyn KeyValueSlot> = Arc::new(JsonFileSlot::new(dir.path()));

    let mut coupons = MockCouponsApi::new();
    coupons.expect_list_coupons().returning(|| {
        Ok(vec![CouponRecord {
            code: "FLAT5".to_string(),
            description: String::new(),
            discount_type: DiscountKind::Fixed,
            discount_value: dec("5"),
            start_date: None,
            end_date: None,
            active: true,
        }])
    });

    let mut orders = MockOrdersApi::new();
    orders
        .expect_create_order()
        .times(2)
        .withf(|order| order.promo_code.as_deref() == Some("FLAT5"))
        .returning(|_| Ok(()));

    let payments = PaymentRedirectClient::new(
        Arc::new(MockPaymentsApi::new()),
        Arc::clone(&slot),
        StoreConfig::new("http://localhost:5000", dir.path()),
    );

    let cart = CartStore::load(Arc::clone(&slot))?;
    let mut checkout =
        CheckoutOrchestrator::new(cart, Arc::new(orders), Arc::new(coupons), payments);

    checkout.add_to_cart(&product("a", "10.00"))?;
    checkout.add_to_cart(&product("b", "10.00"))?;
    checkout.apply_promo("flat5").await?;

    assert_eq!(checkout.summary()?.total, dec("15.00"));

    let outcome = checkout.place_order(&customer()).await?;

    assert!(matches!(outcome, CashCheckoutOutcome::AllSucceeded { .. }));

    Ok(())
}

#[tokio::test]
async fn card_checkout_survives_reload_between_redirect_and_capture() -> TestResult {
    let dir = tempfile::tempdir()?;
    let slot: Arc<dyn KeyValueSlot> = Arc::new(JsonFileSlot::new(dir.path()));
    let config = StoreConfig::new("http://localhost:5000", dir.path());

    // Session one: hand off to the processor.
    {
        let mut api = MockPaymentsApi::new();
        api.expect_create_order().returning(|_| Ok(approval_order()));

        let payments =
            PaymentRedirectClient::new(Arc::new(api), Arc::clone(&slot), config.clone());

        let cart = CartStore::load(Arc::clone(&slot))?;
        let mut checkout = CheckoutOrchestrator::new(
            cart,
            Arc::new(MockOrdersApi::new()),
            Arc::new(no_coupons()),
            payments,
        );

        checkout.add_to_cart(&product("a", "12.00"))?;
        checkout.set_payment_method(PaymentMethod::PayPal);

        let url = checkout.begin_card_payment(&customer()).await?;

        assert_eq!(url, "https://processor/approve/ORDER-1");
        assert_eq!(checkout.state(), CheckoutState::AwaitingRedirect);
    }

    // Session two: the page has fully reloaded; only the slot survives.
    {
        let mut api = MockPaymentsApi::new();
        api.expect_capture_order()
            .withf(|request| request.order_id == "ORDER-1")
            .returning(|_| {
                Ok(CaptureReceipt {
                    orders_created: 1,
                    orders_failed: Vec::new(),
                })
            });

        let payments =
            PaymentRedirectClient::new(Arc::new(api), Arc::clone(&slot), config.clone());

        let cart = CartStore::load(Arc::clone(&slot))?;
        assert!(!cart.is_empty(), "cart must survive until capture succeeds");

        let mut checkout = CheckoutOrchestrator::new(
            cart,
            Arc::new(MockOrdersApi::new()),
            Arc::new(no_coupons()),
            payments,
        );

        let receipt = checkout.resume_card_payment("ORDER-1").await?;

        assert_eq!(receipt.orders_created, 1);
        assert_eq!(checkout.state(), CheckoutState::Empty);
    }

    // Nothing is left behind in the slot.
    let reloaded = CartStore::load(slot)?;
    assert!(reloaded.is_empty());

    Ok(())
}
