//! End-to-end register flow: config file → session → sale → QR → payment.

use std::cell::RefCell;
use std::fs;
use std::time::Duration;

use caixa_checkout::{CheckoutConfig, CheckoutError, CheckoutSession};
use caixa_core::pix::tlv::parse;
use caixa_core::pix::{
    FixedStatusSource, PaymentStatusSource, QrCodeEncoder, QrEncoder, QrImage,
};
use caixa_core::{CoreError, CoreResult, Money, PaymentStatus, PaymentStatusReport, Percent};
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

const CONFIG: &str = r#"
[merchant]
name = "Mercadinho Boa Vista"
city = "Jaboatao dos Guararapes"
pix_key = "11.222.333/0001-81"
pix_key_type = "cnpj"

[pix]
status_timeout_secs = 5

[loyalty]
point_value_cents = 2
accrual_step_cents = 500

[[coupons.extras]]
code = "natal50"
kind = "fixed"
value = 50
"#;

fn load(env: &[(&str, &str)]) -> CheckoutConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkout.toml");
    fs::write(&path, CONFIG).unwrap();

    let env: Vec<(String, String)> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    CheckoutConfig::load_with(Some(path), move |key| {
        env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    })
    .unwrap()
}

/// Records the timeout it was asked to honor.
struct RecordingSource {
    seen: RefCell<Vec<(String, Duration)>>,
    report: PaymentStatusReport,
}

impl PaymentStatusSource for RecordingSource {
    fn check_status(&self, transaction_id: &str, timeout: Duration) -> CoreResult<PaymentStatusReport> {
        self.seen
            .borrow_mut()
            .push((transaction_id.to_string(), timeout));
        Ok(self.report.clone())
    }
}

struct BrokenPrinter;

impl QrEncoder for BrokenPrinter {
    fn encode(&self, _text: &str) -> CoreResult<QrImage> {
        Err(CoreError::EncodingFailure("paper jam".to_string()))
    }
}

#[test]
fn test_config_file_drives_session() {
    let config = load(&[]);
    assert_eq!(config.pix.status_timeout(), Duration::from_secs(5));
    assert!(config.pix.append_crc);

    let mut session = CheckoutSession::new(config).unwrap();
    session
        .cart_mut()
        .add_item("SKU1", "Cesta básica", Money::from_cents(12000), 1)
        .unwrap();
    let coupon = session.apply_coupon("NATAL50").unwrap();
    assert_eq!(coupon.value, dec!(50));

    let sale = session.finalize().unwrap();
    assert_eq!(sale.amount_due(), Money::from_cents(7000));
    // R$ 5,00 per point
    assert_eq!(sale.loyalty_points_earned, 14);

    let payload = &sale.pix.as_ref().unwrap().payload;
    let fields = parse(payload).unwrap();
    let city = fields.iter().find(|f| f.id == "60").unwrap();
    assert_eq!(city.value, "Jaboatao dos Gu");
    assert_eq!(fields.last().unwrap().id, "63");

    let account = fields.iter().find(|f| f.id == "26").unwrap().children().unwrap();
    assert_eq!(account[3].value, "11222333000181");
}

#[test]
fn test_env_overrides_win_over_file() {
    let config = load(&[
        ("CAIXA_MERCHANT_NAME", "Boa Vista Filial 2"),
        ("CAIXA_PIX_KEY", "teste@exemplo.com"),
        ("CAIXA_PIX_KEY_TYPE", "email"),
        ("CAIXA_PIX_APPEND_CRC", "false"),
    ]);

    assert_eq!(config.merchant.name, "Boa Vista Filial 2");
    assert_eq!(config.merchant.city, "Jaboatao dos Guararapes");
    assert!(!config.pix.append_crc);

    let mut session = CheckoutSession::new(config).unwrap();
    session
        .cart_mut()
        .add_item("SKU1", "Cesta básica", Money::from_cents(1000), 1)
        .unwrap();
    let sale = session.finalize().unwrap();

    let fields = parse(&sale.pix.unwrap().payload).unwrap();
    assert!(fields.iter().all(|f| f.id != "63"));
}

#[test]
fn test_invalid_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkout.toml");
    fs::write(&path, "[merchant\nname = ").unwrap();

    let err = CheckoutConfig::load_with(Some(path), |_| None).unwrap_err();
    assert!(matches!(err, CheckoutError::ConfigLoadFailed(_)));
}

#[test]
fn test_full_sale_with_every_discount() {
    let mut session = CheckoutSession::new(load(&[])).unwrap();
    let cart = session.cart_mut();
    cart.add_item("A", "Arroz 5kg", Money::from_cents(2500), 2).unwrap();
    cart.add_item("B", "Feijão 1kg", Money::from_cents(899), 3).unwrap();
    cart.set_item_discount("B", Money::from_cents(97), Percent::zero()).unwrap();
    cart.set_cart_discount(Money::zero(), Percent::from_whole(10).unwrap()).unwrap();
    cart.redeem_loyalty_points(100, 150).unwrap();
    session.apply_coupon("FIXO5").unwrap();

    // subtotal 76.97, items 0.97 → 76.00, cart 7.60 → 68.40,
    // coupon 5.00 → 63.40, loyalty 100 × 0.02 = 2.00 → 61.40
    let totals = session.totals();
    assert_eq!(totals.subtotal.amount(), dec!(76.97));
    assert_eq!(totals.item_discounts.amount(), dec!(0.97));
    assert_eq!(totals.cart_discount.amount(), dec!(7.6));
    assert_eq!(totals.coupon_discount.amount(), dec!(5));
    assert_eq!(totals.loyalty_discount.amount(), dec!(2));
    assert_eq!(totals.total.amount(), dec!(61.40));

    let sale = session.finalize().unwrap();
    assert_eq!(sale.loyalty_points_redeemed, 100);
    assert_eq!(sale.loyalty_points_earned, 12);
    assert_eq!(sale.coupon.as_ref().unwrap().code, "FIXO5");
    assert!(session.cart().is_empty());
    assert!(session.cart().applied_coupon().is_none());

    let image = session.render_qr(&QrCodeEncoder, &sale).unwrap();
    assert!(image.width() > 21);

    let settled = Utc.with_ymd_and_hms(2024, 12, 24, 18, 30, 0).unwrap();
    let source = RecordingSource {
        seen: RefCell::new(Vec::new()),
        report: PaymentStatusReport::completed(sale.amount_due(), settled),
    };
    let report = session.await_payment(&source, &sale).unwrap();
    assert_eq!(report.status, PaymentStatus::Completed);
    assert_eq!(
        source.seen.borrow().as_slice(),
        &[(sale.transaction_id.clone(), Duration::from_secs(5))]
    );
}

#[test]
fn test_encoder_failure_propagates() {
    let mut session = CheckoutSession::new(load(&[])).unwrap();
    session
        .cart_mut()
        .add_item("A", "Arroz 5kg", Money::from_cents(2500), 1)
        .unwrap();
    let sale = session.finalize().unwrap();

    let err = session.render_qr(&BrokenPrinter, &sale).unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Core(CoreError::EncodingFailure(msg)) if msg == "paper jam"
    ));
}

#[test]
fn test_unpaid_sale_reports_pending() {
    let mut session = CheckoutSession::new(load(&[])).unwrap();
    session
        .cart_mut()
        .add_item("A", "Arroz 5kg", Money::from_cents(2500), 1)
        .unwrap();
    let sale = session.finalize().unwrap();

    let report = session
        .await_payment(&FixedStatusSource::new(), &sale)
        .unwrap();
    assert_eq!(report.status, PaymentStatus::Pending);
    assert!(report.settled_at.is_none());
}
