//! # Checkout Session
//!
//! One register, one active cart. The session owns the cart, prices it with
//! the configured loyalty policy, and turns the final total into a PIX
//! charge.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cart_mut().add_item(..) ─┐                                             │
//! │  apply_coupon(..)         ├──► totals()  (shown live to the cashier)    │
//! │  redeem points            ┘                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  finalize() ──► SaleSummary { totals, txid, points earned, PixCode? }   │
//! │           │         cart cleared for the next customer                  │
//! │           ▼                                                             │
//! │  render_qr(encoder, &summary) ──► QrImage on the customer display       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  await_payment(source, &summary) ──► Pending | Completed | Failed       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caixa_core::coupon::LayeredCatalog;
use caixa_core::pix::{
    check_payment_status, generate_qr_image, generate_transaction_id, PaymentStatusSource,
    PixCodec, QrEncoder, QrImage,
};
use caixa_core::pricing::loyalty_points_earned;
use caixa_core::{
    Cart, CartTotals, Coupon, Money, PaymentStatus, PaymentStatusReport, PixCode,
    PixPaymentRequest, PricingPolicy,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};

/// The outcome of a finalized sale, ready for the receipt and the customer
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub transaction_id: String,
    /// Totals rounded to centavos.
    pub totals: CartTotals,
    pub coupon: Option<Coupon>,
    /// Points to credit to the customer.
    pub loyalty_points_earned: i64,
    /// Points to debit from the customer.
    pub loyalty_points_redeemed: i64,
    /// `None` when discounts brought the total to zero.
    pub pix: Option<PixCode>,
    pub finalized_at: DateTime<Utc>,
}

impl SaleSummary {
    /// The amount the customer pays.
    pub fn amount_due(&self) -> Money {
        self.totals.total
    }
}

/// Register session.
#[derive(Debug)]
pub struct CheckoutSession {
    config: CheckoutConfig,
    codec: PixCodec,
    policy: PricingPolicy,
    catalog: LayeredCatalog,
    cart: Cart,
}

impl CheckoutSession {
    /// Creates a session with an empty cart.
    ///
    /// ## Errors
    /// `InvalidConfig` when `config` fails [`CheckoutConfig::validate`].
    pub fn new(config: CheckoutConfig) -> CheckoutResult<Self> {
        config.validate()?;

        let catalog = config.coupon_catalog()?;
        debug!(
            merchant = %config.merchant.name,
            extra_coupons = catalog.extras().len(),
            "Checkout session ready"
        );

        Ok(CheckoutSession {
            codec: PixCodec::new(config.pix.codec_config()),
            policy: config.loyalty.policy(),
            catalog,
            cart: Cart::new(),
            config,
        })
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Applies a coupon from the configured catalog.
    pub fn apply_coupon(&mut self, code: &str) -> CheckoutResult<Coupon> {
        match self.cart.apply_coupon(code, &self.catalog) {
            Ok(coupon) => {
                info!(code = %coupon.code, "Coupon applied");
                Ok(coupon.clone())
            }
            Err(e) => {
                warn!(code = %code, error = %e, "Coupon rejected");
                Err(e.into())
            }
        }
    }

    /// Exact totals of the current cart.
    pub fn totals(&self) -> CartTotals {
        self.cart.totals(&self.policy)
    }

    /// Closes the current sale.
    ///
    /// Prices the cart, rounds to centavos, generates a transaction id and,
    /// when something is due, the BR Code for the merchant's key. The cart is
    /// cleared only on success.
    ///
    /// ## Errors
    /// - `EmptyCart` when nothing was scanned
    /// - `Core` when the BR Code cannot be built
    pub fn finalize(&mut self) -> CheckoutResult<SaleSummary> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let totals = self.cart.totals(&self.policy).rounded();
        let transaction_id = generate_transaction_id();

        let pix = if totals.total.is_positive() {
            let request = self.payment_request(totals.total, &transaction_id);
            Some(self.codec.generate(&request)?)
        } else {
            None
        };

        let summary = SaleSummary {
            loyalty_points_earned: loyalty_points_earned(totals.total, &self.policy),
            loyalty_points_redeemed: totals.loyalty_points_used,
            coupon: self.cart.applied_coupon().cloned(),
            transaction_id,
            totals,
            pix,
            finalized_at: Utc::now(),
        };

        info!(
            transaction_id = %summary.transaction_id,
            items = self.cart.item_count(),
            subtotal = %summary.totals.subtotal,
            discount = %summary.totals.total_discount,
            total = %summary.totals.total,
            points_earned = summary.loyalty_points_earned,
            "Sale finalized"
        );

        self.cart.clear();
        Ok(summary)
    }

    /// Asks `source` once whether the sale's PIX charge has settled, using
    /// the configured timeout.
    pub fn await_payment<S>(
        &self,
        source: &S,
        summary: &SaleSummary,
    ) -> CheckoutResult<PaymentStatusReport>
    where
        S: PaymentStatusSource + ?Sized,
    {
        let timeout = self.config.pix.status_timeout();
        let report = check_payment_status(source, &summary.transaction_id, timeout)
            .map_err(|e| {
                warn!(transaction_id = %summary.transaction_id, error = %e, "Payment status check failed");
                e
            })?;

        match report.status {
            PaymentStatus::Completed => {
                info!(transaction_id = %summary.transaction_id, "Payment completed");
                if let Some(paid) = report.amount {
                    if paid != summary.amount_due() {
                        warn!(
                            transaction_id = %summary.transaction_id,
                            paid = %paid,
                            due = %summary.amount_due(),
                            "Settled amount differs from amount due"
                        );
                    }
                }
            }
            PaymentStatus::Failed => {
                warn!(transaction_id = %summary.transaction_id, "Payment failed");
            }
            PaymentStatus::Pending => {
                debug!(transaction_id = %summary.transaction_id, "Payment still pending");
            }
        }

        Ok(report)
    }

    /// Renders the sale's BR Code through `encoder`.
    ///
    /// ## Errors
    /// - `NothingToCharge` for a fully discounted sale
    /// - `Core(EncodingFailure)` from the encoder, not retried
    pub fn render_qr<E>(&self, encoder: &E, summary: &SaleSummary) -> CheckoutResult<QrImage>
    where
        E: QrEncoder + ?Sized,
    {
        let pix = summary
            .pix
            .as_ref()
            .ok_or_else(|| CheckoutError::NothingToCharge {
                transaction_id: summary.transaction_id.clone(),
            })?;

        Ok(generate_qr_image(encoder, &pix.payload)?)
    }

    fn payment_request(&self, amount: Money, transaction_id: &str) -> PixPaymentRequest {
        let merchant = &self.config.merchant;
        PixPaymentRequest::new(
            merchant.pix_key.clone(),
            merchant.pix_key_type,
            merchant.name.clone(),
            merchant.city.clone(),
        )
        .with_amount(amount)
        .with_transaction_id(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caixa_core::pix::{FixedStatusSource, QrCodeEncoder};
    use caixa_core::{CoreError, Percent, PixKeyType};

    fn config() -> CheckoutConfig {
        let mut config = CheckoutConfig::default();
        config.merchant.name = "Padaria Pão Quente".into();
        config.merchant.city = "Recife".into();
        config.merchant.pix_key = "teste@exemplo.com".into();
        config.merchant.pix_key_type = PixKeyType::Email;
        config
    }

    fn session_with_sale() -> CheckoutSession {
        let mut session = CheckoutSession::new(config()).unwrap();
        let cart = session.cart_mut();
        cart.add_item("A", "Pão francês", Money::from_cents(1000), 2).unwrap();
        cart.add_item("B", "Café 500g", Money::from_cents(1575), 1).unwrap();
        session
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = CheckoutSession::new(CheckoutConfig::default()).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_finalize_builds_pix_and_clears_cart() {
        let mut session = session_with_sale();
        session
            .cart_mut()
            .set_cart_discount(Money::zero(), Percent::from_whole(10).unwrap())
            .unwrap();

        let summary = session.finalize().unwrap();
        assert_eq!(summary.amount_due(), Money::from_cents(3218));
        assert_eq!(summary.loyalty_points_earned, 3);
        assert_eq!(summary.transaction_id.len(), 25);

        let pix = summary.pix.as_ref().unwrap();
        assert!(pix.payload.contains("540532.18"));
        assert!(pix.payload.contains(&summary.transaction_id));
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_finalize_empty_cart() {
        let mut session = CheckoutSession::new(config()).unwrap();
        assert!(matches!(session.finalize(), Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_fully_discounted_sale_has_no_pix() {
        let mut session = session_with_sale();
        session
            .cart_mut()
            .set_cart_discount(Money::zero(), Percent::from_whole(100).unwrap())
            .unwrap();

        let summary = session.finalize().unwrap();
        assert_eq!(summary.amount_due(), Money::zero());
        assert!(summary.pix.is_none());
        assert!(matches!(
            session.render_qr(&QrCodeEncoder, &summary),
            Err(CheckoutError::NothingToCharge { .. })
        ));
    }

    #[test]
    fn test_apply_unknown_coupon() {
        let mut session = session_with_sale();
        assert!(matches!(
            session.apply_coupon("NATAL50"),
            Err(CheckoutError::Core(CoreError::UnknownCoupon(_)))
        ));
        assert_eq!(session.apply_coupon("fixo5").unwrap().code, "FIXO5");
    }

    #[test]
    fn test_await_payment_uses_source() {
        let mut session = session_with_sale();
        let summary = session.finalize().unwrap();

        let pending = session
            .await_payment(&FixedStatusSource::new(), &summary)
            .unwrap();
        assert_eq!(pending.status, PaymentStatus::Pending);

        let err = session
            .await_payment(&FixedStatusSource::unreachable(), &summary)
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::PaymentStatusUnavailable { .. })
        ));
    }
}
