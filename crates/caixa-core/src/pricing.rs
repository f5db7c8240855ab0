//! # Pricing Pipeline
//!
//! Turns a [`Cart`] into [`CartTotals`]. The cashier's screen shows every
//! intermediate figure, so the order of the stages is fixed.
//!
//! ## Discount Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ unit_price × quantity                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌────────────────┐  Σ min(fixed + pct × line, line)                    │
//! │  │ ItemDiscounts  │──────────────────────────────────► item_discounts   │
//! │  └───────┬────────┘                                                     │
//! │          ▼ remaining                                                    │
//! │  ┌────────────────┐  min(fixed + pct × remaining, remaining)            │
//! │  │ CartDiscount   │──────────────────────────────────► cart_discount    │
//! │  └───────┬────────┘                                                     │
//! │          ▼ remaining                                                    │
//! │  ┌────────────────┐  pct × remaining | min(value, remaining)            │
//! │  │ Coupon         │──────────────────────────────────► coupon_discount  │
//! │  └───────┬────────┘                                                     │
//! │          ▼ remaining                                                    │
//! │  ┌────────────────┐  min(points, balance) × point value, ≤ remaining    │
//! │  │ Loyalty        │──────────────────────────────────► loyalty_discount │
//! │  └───────┬────────┘                                                     │
//! │          ▼                                                              │
//! │  total = max(0, subtotal − total_discount)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is clamped to what is still payable, so stacking discounts
//! can never push the total below zero. Amounts stay exact (R$ 32,175 is a
//! valid total); [`CartTotals::rounded`] rounds for display.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::Money;
use crate::types::CouponKind;

// =============================================================================
// Policy
// =============================================================================

/// Loyalty conversion rates supplied by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// What one redeemed point is worth. Default R$ 0,01.
    pub loyalty_point_value: Money,
    /// Spend that earns one point. Default R$ 10,00.
    pub loyalty_accrual_step: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            loyalty_point_value: Money::from_cents(1),
            loyalty_accrual_step: Money::from_cents(1000),
        }
    }
}

// =============================================================================
// Stages
// =============================================================================

/// What a stage took off and what is left to pay after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOutcome {
    pub discount: Money,
    pub remaining: Money,
}

impl StageOutcome {
    fn clamped(discount: Money, remaining: Money) -> Self {
        let discount = discount.non_negative().min(remaining);
        StageOutcome {
            discount,
            remaining: remaining - discount,
        }
    }
}

/// One step of the discount pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountStage {
    ItemDiscounts,
    CartDiscount,
    Coupon,
    Loyalty,
}

impl DiscountStage {
    /// Stages in the order they run.
    pub const PIPELINE: [DiscountStage; 4] = [
        DiscountStage::ItemDiscounts,
        DiscountStage::CartDiscount,
        DiscountStage::Coupon,
        DiscountStage::Loyalty,
    ];

    /// Applies this stage to the amount still payable.
    pub fn apply(&self, cart: &Cart, policy: &PricingPolicy, remaining: Money) -> StageOutcome {
        let discount = match self {
            DiscountStage::ItemDiscounts => {
                cart.items().iter().map(|i| i.line_discount()).sum::<Money>()
            }
            DiscountStage::CartDiscount => {
                cart.fixed_discount() + remaining.percent_of(cart.percent_discount())
            }
            DiscountStage::Coupon => match cart.applied_coupon() {
                Some(coupon) => match coupon.kind {
                    CouponKind::Percentage => {
                        Money::new(remaining.amount() * coupon.value / Decimal::ONE_HUNDRED)
                    }
                    CouponKind::Fixed => Money::new(coupon.value),
                },
                None => Money::zero(),
            },
            DiscountStage::Loyalty => match cart.loyalty() {
                Some(redemption) => {
                    policy.loyalty_point_value.multiply_quantity(redemption.redeemable())
                }
                None => Money::zero(),
            },
        };

        StageOutcome::clamped(discount, remaining)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Per-line figures for the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    pub id: String,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Everything the cashier's screen and the receipt display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub lines: Vec<LineTotals>,
    /// Σ line subtotals before any discount.
    pub subtotal: Money,
    pub item_discounts: Money,
    pub cart_discount: Money,
    pub coupon_discount: Money,
    pub loyalty_discount: Money,
    /// item + cart + coupon + loyalty.
    pub total_discount: Money,
    /// `max(0, subtotal − total_discount)`.
    pub total: Money,
    /// Points actually consumed by `loyalty_discount`, which can be fewer
    /// than requested when the sale is nearly free.
    pub loyalty_points_used: i64,
}

impl CartTotals {
    /// Copy rounded to centavos for the receipt.
    ///
    /// `subtotal` and `total` are rounded; `total_discount` is their
    /// difference, so the receipt always adds up. Rounding each stage on its
    /// own can miss that difference by a centavo or two; the residue is
    /// settled on the latest stages.
    ///
    /// ```text
    /// subtotal 35,75   cart 3,575 → 3,58   total 32,175 → 32,18
    /// total_discount = 35,75 − 32,18 = 3,57  ⇒  cart 3,57
    /// ```
    pub fn rounded(&self) -> CartTotals {
        let subtotal = self.subtotal.round_to_cents();
        let total = self.total.round_to_cents();
        let total_discount = subtotal - total;

        let exact = [
            self.item_discounts,
            self.cart_discount,
            self.coupon_discount,
            self.loyalty_discount,
        ];
        let mut stages = exact.map(|d| d.round_to_cents());
        let stage_sum: Money = stages.iter().sum();

        if total_discount > stage_sum {
            // total_discount > 0 implies some exact stage is positive
            if let Some(last) = exact.iter().rposition(|d| d.is_positive()) {
                stages[last] += total_discount - stage_sum;
            }
        } else {
            let mut excess = stage_sum - total_discount;
            for stage in stages.iter_mut().rev() {
                let taken = excess.min(*stage);
                *stage -= taken;
                excess -= taken;
            }
        }
        let [item_discounts, cart_discount, coupon_discount, loyalty_discount] = stages;

        CartTotals {
            lines: self
                .lines
                .iter()
                .map(|l| {
                    let subtotal = l.subtotal.round_to_cents();
                    let discount = l.discount.round_to_cents();
                    LineTotals {
                        id: l.id.clone(),
                        subtotal,
                        discount,
                        total: subtotal.saturating_sub(discount),
                    }
                })
                .collect(),
            subtotal,
            item_discounts,
            cart_discount,
            coupon_discount,
            loyalty_discount,
            total_discount,
            total,
            loyalty_points_used: self.loyalty_points_used,
        }
    }
}

/// Runs the four stages in order over `cart`.
pub fn calculate_totals(cart: &Cart, policy: &PricingPolicy) -> CartTotals {
    let lines: Vec<LineTotals> = cart
        .items()
        .iter()
        .map(|item| {
            let subtotal = item.line_subtotal();
            let discount = item.line_discount();
            LineTotals {
                id: item.id.clone(),
                subtotal,
                discount,
                total: subtotal - discount,
            }
        })
        .collect();

    let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();

    let mut remaining = subtotal;
    let mut discounts = [Money::zero(); 4];
    for (slot, stage) in discounts.iter_mut().zip(DiscountStage::PIPELINE) {
        let outcome = stage.apply(cart, policy, remaining);
        *slot = outcome.discount;
        remaining = outcome.remaining;
    }
    let [item_discounts, cart_discount, coupon_discount, loyalty_discount] = discounts;

    let total_discount = item_discounts + cart_discount + coupon_discount + loyalty_discount;

    CartTotals {
        lines,
        subtotal,
        item_discounts,
        cart_discount,
        coupon_discount,
        loyalty_discount,
        total_discount,
        total: subtotal.saturating_sub(total_discount),
        loyalty_points_used: points_for(loyalty_discount, policy.loyalty_point_value),
    }
}

/// Points earned by a sale: `floor(total / accrual_step)`.
///
/// ## Example
/// ```rust
/// use caixa_core::money::Money;
/// use caixa_core::pricing::{loyalty_points_earned, PricingPolicy};
///
/// let policy = PricingPolicy::default();
/// assert_eq!(loyalty_points_earned(Money::from_cents(9999), &policy), 9);
/// assert_eq!(loyalty_points_earned(Money::from_cents(999), &policy), 0);
/// ```
pub fn loyalty_points_earned(total: Money, policy: &PricingPolicy) -> i64 {
    let step = policy.loyalty_accrual_step.amount();
    if !total.is_positive() || step <= Decimal::ZERO {
        return 0;
    }
    (total.amount() / step).floor().to_i64().unwrap_or(0)
}

/// Smallest whole number of points covering `discount`.
fn points_for(discount: Money, point_value: Money) -> i64 {
    if !discount.is_positive() || !point_value.is_positive() {
        return 0;
    }
    (discount.amount() / point_value.amount())
        .ceil()
        .to_i64()
        .unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::BuiltinCoupons;
    use crate::types::Percent;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn policy() -> PricingPolicy {
        PricingPolicy::default()
    }

    fn cart_35_75() -> Cart {
        let mut cart = Cart::new();
        cart.add_item("A", "Arroz", Money::new(dec!(10)), 2).unwrap();
        cart.add_item("B", "Café", Money::new(dec!(15.75)), 1).unwrap();
        cart
    }

    #[test]
    fn test_empty_cart() {
        let totals = Cart::new().totals(&policy());
        assert!(totals.lines.is_empty());
        assert_eq!(totals.subtotal, Money::zero());
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_ten_percent_cart_discount_is_exact() {
        let mut cart = cart_35_75();
        cart.set_cart_discount(Money::zero(), Percent::from_whole(10).unwrap())
            .unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.subtotal.amount(), dec!(35.75));
        assert_eq!(totals.cart_discount.amount(), dec!(3.575));
        assert_eq!(totals.total.amount(), dec!(32.175));

        let rounded = totals.rounded();
        assert_eq!(rounded.total.amount(), dec!(32.18));
        assert_eq!(rounded.total.to_string(), "R$ 32,18");
    }

    #[test]
    fn test_rounded_receipt_adds_up() {
        let mut cart = cart_35_75();
        cart.set_cart_discount(Money::zero(), Percent::from_whole(10).unwrap())
            .unwrap();

        let r = cart.totals(&policy()).rounded();
        assert_eq!(r.subtotal.to_string(), "R$ 35,75");
        assert_eq!(r.total.to_string(), "R$ 32,18");
        assert_eq!(r.total_discount.to_string(), "R$ 3,57");
        assert_eq!(r.total, r.subtotal - r.total_discount);
        assert_eq!(r.cart_discount.amount(), dec!(3.57));
        assert_eq!(
            r.total_discount,
            r.item_discounts + r.cart_discount + r.coupon_discount + r.loyalty_discount
        );
    }

    #[test]
    fn test_rounded_residue_added_to_last_stage() {
        let mut cart = Cart::new();
        cart.add_item("A", "Bala", Money::new(dec!(10)), 1).unwrap();
        cart.set_item_discount("A", Money::new(dec!(0.004)), Percent::zero())
            .unwrap();
        cart.set_cart_discount(Money::new(dec!(0.004)), Percent::zero())
            .unwrap();
        cart.redeem_loyalty_points(1, 1).unwrap();
        let policy = PricingPolicy {
            loyalty_point_value: Money::new(dec!(0.004)),
            ..PricingPolicy::default()
        };

        // 10 − 0.012 = 9.988 → 9.99, each stage alone rounds to 0.00
        let r = cart.totals(&policy).rounded();
        assert_eq!(r.total.amount(), dec!(9.99));
        assert_eq!(r.total_discount.amount(), dec!(0.01));
        assert_eq!(r.item_discounts, Money::zero());
        assert_eq!(r.cart_discount, Money::zero());
        assert_eq!(r.loyalty_discount.amount(), dec!(0.01));
        assert_eq!(r.lines[0].total, r.lines[0].subtotal - r.lines[0].discount);
    }

    #[test]
    fn test_item_discount_clamped_to_line() {
        let mut cart = cart_35_75();
        cart.set_item_discount("B", Money::new(dec!(20)), Percent::from_whole(50).unwrap())
            .unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.item_discounts.amount(), dec!(15.75));
        assert_eq!(totals.lines[1].total, Money::zero());
        assert_eq!(totals.lines[0].total.amount(), dec!(20));
        assert_eq!(totals.total.amount(), dec!(20));
    }

    #[test]
    fn test_cart_discount_applies_after_item_discounts() {
        let mut cart = cart_35_75();
        cart.set_item_discount("B", Money::new(dec!(5.75)), Percent::zero())
            .unwrap();
        cart.set_cart_discount(Money::new(dec!(1)), Percent::from_whole(10).unwrap())
            .unwrap();

        // remaining after items = 30; cart = 1 + 3 = 4
        let totals = cart.totals(&policy());
        assert_eq!(totals.cart_discount.amount(), dec!(4));
        assert_eq!(totals.total.amount(), dec!(26));
    }

    #[test]
    fn test_percentage_coupon_on_remaining() {
        let mut cart = cart_35_75();
        cart.set_cart_discount(Money::new(dec!(5.75)), Percent::zero())
            .unwrap();
        cart.apply_coupon("DESCONTO10", &BuiltinCoupons).unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.coupon_discount.amount(), dec!(3));
        assert_eq!(totals.total.amount(), dec!(27));
    }

    #[test]
    fn test_fixed_coupon_clamped() {
        let mut cart = Cart::new();
        cart.add_item("A", "Bala", Money::new(dec!(2.50)), 1).unwrap();
        cart.apply_coupon("FIXO5", &BuiltinCoupons).unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.coupon_discount.amount(), dec!(2.50));
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_only_last_coupon_counts() {
        let mut cart = cart_35_75();
        cart.apply_coupon("DESCONTO10", &BuiltinCoupons).unwrap();
        cart.apply_coupon("MEGA20", &BuiltinCoupons).unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.coupon_discount.amount(), dec!(7.15));
    }

    #[test]
    fn test_loyalty_redemption() {
        let mut cart = cart_35_75();
        cart.redeem_loyalty_points(500, 800).unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.loyalty_discount.amount(), dec!(5));
        assert_eq!(totals.loyalty_points_used, 500);
        assert_eq!(totals.total.amount(), dec!(30.75));
    }

    #[test]
    fn test_loyalty_clamped_to_remaining() {
        let mut cart = Cart::new();
        cart.add_item("A", "Bala", Money::new(dec!(2.505)), 1).unwrap();
        cart.redeem_loyalty_points(1000, 1000).unwrap();

        let totals = cart.totals(&policy());
        assert_eq!(totals.loyalty_discount.amount(), dec!(2.505));
        assert_eq!(totals.total, Money::zero());
        // 250.5 points' worth rounds up to 251 consumed
        assert_eq!(totals.loyalty_points_used, 251);
    }

    #[test]
    fn test_total_discount_is_sum_of_stages() {
        let mut cart = cart_35_75();
        cart.set_item_discount("A", Money::new(dec!(1)), Percent::zero())
            .unwrap();
        cart.set_cart_discount(Money::new(dec!(2)), Percent::zero())
            .unwrap();
        cart.apply_coupon("FIXO5", &BuiltinCoupons).unwrap();
        cart.redeem_loyalty_points(100, 100).unwrap();

        let t = cart.totals(&policy());
        assert_eq!(
            t.total_discount,
            t.item_discounts + t.cart_discount + t.coupon_discount + t.loyalty_discount
        );
        assert_eq!(t.total_discount.amount(), dec!(9));
        assert_eq!(t.total.amount(), dec!(26.75));
    }

    #[test]
    fn test_points_earned() {
        assert_eq!(loyalty_points_earned(Money::new(dec!(32.175)), &policy()), 3);
        assert_eq!(loyalty_points_earned(Money::zero(), &policy()), 0);

        let weird = PricingPolicy {
            loyalty_point_value: Money::from_cents(1),
            loyalty_accrual_step: Money::zero(),
        };
        assert_eq!(loyalty_points_earned(Money::from_cents(10_000), &weird), 0);

        assert_eq!(cart_35_75().loyalty_points_earned(&policy()), 3);
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(DiscountStage::PIPELINE[0], DiscountStage::ItemDiscounts);
        assert_eq!(DiscountStage::PIPELINE[3], DiscountStage::Loyalty);
    }

    fn arb_percent() -> impl Strategy<Value = Percent> {
        (0u32..=100).prop_map(|p| Percent::from_whole(p).unwrap())
    }

    proptest! {
        #[test]
        fn prop_total_between_zero_and_subtotal(
            lines in proptest::collection::vec((0i64..100_000, 1i64..20, 0i64..50_000, arb_percent()), 1..10),
            cart_fixed in 0i64..100_000,
            cart_pct in arb_percent(),
            coupon in proptest::option::of(proptest::sample::select(vec!["DESCONTO10", "FIXO5", "MEGA20"])),
            points in 0i64..100_000,
        ) {
            let mut cart = Cart::new();
            for (i, (price, qty, fixed, pct)) in lines.into_iter().enumerate() {
                let id = format!("SKU{}", i);
                cart.add_item(&id, "Item", Money::from_cents(price), qty).unwrap();
                cart.set_item_discount(&id, Money::from_cents(fixed), pct).unwrap();
            }
            cart.set_cart_discount(Money::from_cents(cart_fixed), cart_pct).unwrap();
            if let Some(code) = coupon {
                cart.apply_coupon(code, &BuiltinCoupons).unwrap();
            }
            cart.redeem_loyalty_points(points, points).unwrap();

            let t = cart.totals(&PricingPolicy::default());
            prop_assert!(!t.total.is_negative());
            prop_assert!(t.total <= t.subtotal);
            prop_assert!(t.total_discount <= t.subtotal);
            prop_assert_eq!(t.total, t.subtotal - t.total_discount);
            prop_assert!(t.loyalty_points_used <= points);

            let r = t.rounded();
            prop_assert_eq!(r.total, r.subtotal - r.total_discount);
            prop_assert_eq!(
                r.total_discount,
                r.item_discounts + r.cart_discount + r.coupon_discount + r.loyalty_discount
            );
            prop_assert!(!r.item_discounts.is_negative());
            prop_assert!(!r.cart_discount.is_negative());
            prop_assert!(!r.coupon_discount.is_negative());
            prop_assert!(!r.loyalty_discount.is_negative());
            prop_assert_eq!(r.total, t.total.round_to_cents());
            for line in &r.lines {
                prop_assert_eq!(line.total, line.subtotal - line.discount);
            }
        }
    }
}
