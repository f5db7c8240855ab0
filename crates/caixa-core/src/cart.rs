//! # Cart
//!
//! The single active cart of a register session: line items plus every
//! discount the cashier has applied. Pricing lives in [`crate::pricing`];
//! this module only guards the state.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Scan product ─────────► add_item() ──────────► push / merge quantity  │
//! │  Scan with stock limit ► add_item_capped() ───► merge, clamp to stock  │
//! │  Change quantity ──────► set_quantity() ──────► items[i].quantity = n  │
//! │  Remove line ──────────► remove_item() ───────► items.retain(..)       │
//! │  Line discount ────────► set_item_discount() ─► items[i].discount      │
//! │  Cart discount ────────► set_cart_discount()                           │
//! │  Coupon ───────────────► apply_coupon() / remove_coupon()              │
//! │  Loyalty ──────────────► redeem_loyalty_points()                       │
//! │  Sale finalized ───────► clear()                                       │
//! │                                                                         │
//! │  Read side: totals(&PricingPolicy) ──► CartTotals                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by id and kept in insertion order (receipt order)
//! - Every quantity is in 1..=999; at most 100 lines
//! - Stored discounts are never negative; percentages are within 0..=100
//! - At most one coupon is active
//! - Redeemed loyalty points never exceed the customer's balance

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coupon::CouponCatalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{calculate_totals, loyalty_points_earned, CartTotals, PricingPolicy};
use crate::types::{normalize_coupon_code, Coupon, Percent};
use crate::validation::{validate_amount, validate_item_id, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", try_from = "CartItemRecord")]
pub struct CartItem {
    /// SKU or EAN barcode.
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub fixed_discount: Money,
    pub percent_discount: Percent,
}

impl CartItem {
    fn new(id: &str, name: &str, unit_price: Money, quantity: i64) -> Self {
        CartItem {
            id: id.trim().to_string(),
            name: name.trim().to_string(),
            unit_price,
            quantity,
            fixed_discount: Money::zero(),
            percent_discount: Percent::zero(),
        }
    }

    /// Unit price × quantity.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Fixed plus percentage discount, capped at the line subtotal.
    ///
    /// ## Example
    /// A R$ 10,00 line with R$ 3,00 off and 80% off would be R$ 11,00 of
    /// discount; it is clamped to R$ 10,00.
    pub fn line_discount(&self) -> Money {
        let line = self.line_subtotal();
        let raw = self.fixed_discount + line.percent_of(self.percent_discount);
        raw.min(line)
    }

    pub fn has_discount(&self) -> bool {
        !self.fixed_discount.is_zero() || !self.percent_discount.is_zero()
    }
}

/// Wire shape of [`CartItem`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRecord {
    id: String,
    name: String,
    unit_price: Money,
    quantity: i64,
    #[serde(default)]
    fixed_discount: Money,
    #[serde(default)]
    percent_discount: Percent,
}

impl TryFrom<CartItemRecord> for CartItem {
    type Error = CoreError;

    fn try_from(record: CartItemRecord) -> CoreResult<Self> {
        validate_item_id(&record.id)?;
        validate_quantity(record.quantity)?;
        validate_amount("unit price", record.unit_price)?;
        validate_amount("item fixed discount", record.fixed_discount)?;

        let mut item = CartItem::new(&record.id, &record.name, record.unit_price, record.quantity);
        item.fixed_discount = record.fixed_discount;
        item.percent_discount = record.percent_discount;
        Ok(item)
    }
}

/// Points the customer wants to spend, with the balance they hold.
///
/// The balance is an external fact supplied by the customer ledger; the
/// cart never writes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyRedemption {
    pub points: i64,
    pub available: i64,
}

impl LoyaltyRedemption {
    /// Points that can actually be spent.
    pub fn redeemable(&self) -> i64 {
        self.points.min(self.available).max(0)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart aggregate.
///
/// ## Usage
/// ```rust
/// use caixa_core::money::Money;
/// use caixa_core::pricing::PricingPolicy;
/// use caixa_core::types::Percent;
/// use caixa_core::Cart;
///
/// let mut cart = Cart::new();
/// cart.add_item("A", "Arroz 5kg", Money::from_cents(1000), 2).unwrap();
/// cart.add_item("B", "Café 500g", Money::from_cents(1575), 1).unwrap();
/// cart.set_cart_discount(Money::zero(), Percent::from_whole(10).unwrap()).unwrap();
///
/// let totals = cart.totals(&PricingPolicy::default());
/// assert_eq!(totals.subtotal.amount().to_string(), "35.75");
/// assert_eq!(totals.total.amount().to_string(), "32.175");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", try_from = "CartRecord")]
pub struct Cart {
    items: Vec<CartItem>,
    fixed_discount: Money,
    percent_discount: Percent,
    applied_coupon: Option<Coupon>,
    loyalty: Option<LoyaltyRedemption>,
}

/// Wire shape of [`Cart`]; restored through the same checks as the
/// mutating operations.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartRecord {
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    fixed_discount: Money,
    #[serde(default)]
    percent_discount: Percent,
    #[serde(default)]
    applied_coupon: Option<Coupon>,
    #[serde(default)]
    loyalty: Option<LoyaltyRedemption>,
}

impl TryFrom<CartRecord> for Cart {
    type Error = CoreError;

    fn try_from(record: CartRecord) -> CoreResult<Self> {
        if record.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        for (i, item) in record.items.iter().enumerate() {
            if record.items[..i].iter().any(|other| other.id == item.id) {
                return Err(ValidationError::InvalidFormat {
                    field: "items".to_string(),
                    reason: format!("duplicate line id {}", item.id),
                }
                .into());
            }
        }
        validate_amount("cart fixed discount", record.fixed_discount)?;

        let mut cart = Cart {
            items: record.items,
            fixed_discount: record.fixed_discount,
            percent_discount: record.percent_discount,
            applied_coupon: record.applied_coupon,
            loyalty: None,
        };
        if let Some(loyalty) = record.loyalty {
            cart.redeem_loyalty_points(loyalty.points, loyalty.available)?;
        }
        Ok(cart)
    }
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Adds `quantity` units, merging into an existing line with the same id.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity < 1`
    /// - `QuantityTooLarge` when the merged quantity passes 999
    /// - `CartTooLarge` when a 101st line would be created
    /// - `Validation` for an empty id, a negative price or one above
    ///   [`crate::validation::MAX_AMOUNT_REAIS`]
    pub fn add_item(
        &mut self,
        id: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        self.insert(id, name, unit_price, quantity, None).map(|_| ())
    }

    /// Like [`Cart::add_item`], but the merged quantity is clamped to
    /// `max_quantity` (the stock on hand) instead of failing.
    ///
    /// Returns the line's resulting quantity. Fails with `InsufficientStock`
    /// only when nothing at all is available.
    pub fn add_item_capped(
        &mut self,
        id: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
        max_quantity: i64,
    ) -> CoreResult<i64> {
        self.insert(id, name, unit_price, quantity, Some(max_quantity))
    }

    fn insert(
        &mut self,
        id: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
        stock: Option<i64>,
    ) -> CoreResult<i64> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity {
                requested: quantity,
            });
        }
        validate_item_id(id)?;
        validate_amount("unit price", unit_price)?;

        let id = id.trim();
        let current = self.item(id).map_or(0, |i| i.quantity);
        let requested = current.saturating_add(quantity);

        let merged = match stock {
            Some(available) if available < 1 => {
                return Err(CoreError::InsufficientStock {
                    id: id.to_string(),
                    available,
                    requested,
                });
            }
            Some(available) => requested.min(available).min(MAX_ITEM_QUANTITY),
            None => requested,
        };
        validate_quantity(merged)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = merged;
            return Ok(merged);
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::new(id, name, unit_price, merged));
        Ok(merged)
    }

    /// Removes a line. Returns `false`, leaving the cart untouched, when no
    /// line has this id.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id.trim());
        self.items.len() != before
    }

    /// Replaces a line's quantity.
    ///
    /// `max_quantity` is the stock ceiling when the caller tracks stock.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity < 1`
    /// - `ItemNotFound` when no line has this id
    /// - `InsufficientStock` when `quantity > max_quantity`
    /// - `QuantityTooLarge` when `quantity > 999`
    pub fn set_quantity(
        &mut self,
        id: &str,
        quantity: i64,
        max_quantity: Option<i64>,
    ) -> CoreResult<()> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity {
                requested: quantity,
            });
        }

        let item = self.item_mut(id)?;
        if let Some(available) = max_quantity {
            if quantity > available {
                return Err(CoreError::InsufficientStock {
                    id: item.id.clone(),
                    available,
                    requested: quantity,
                });
            }
        }
        validate_quantity(quantity)?;

        item.quantity = quantity;
        Ok(())
    }

    /// Stores a line's fixed and percentage discount. Their sum is clamped
    /// to the line subtotal at pricing time, not rejected here.
    pub fn set_item_discount(&mut self, id: &str, fixed: Money, percent: Percent) -> CoreResult<()> {
        validate_amount("item fixed discount", fixed)?;

        let item = self.item_mut(id)?;
        item.fixed_discount = fixed;
        item.percent_discount = percent;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cart-level discounts
    // -------------------------------------------------------------------------

    /// Stores the cart-wide discount applied after line discounts.
    pub fn set_cart_discount(&mut self, fixed: Money, percent: Percent) -> CoreResult<()> {
        validate_amount("cart fixed discount", fixed)?;

        self.fixed_discount = fixed;
        self.percent_discount = percent;
        Ok(())
    }

    /// Resolves `code` through `catalog` and makes it the active coupon,
    /// replacing any previous one.
    ///
    /// On `UnknownCoupon` the previously applied coupon stays active.
    pub fn apply_coupon<C>(&mut self, code: &str, catalog: &C) -> CoreResult<&Coupon>
    where
        C: CouponCatalog + ?Sized,
    {
        let code = normalize_coupon_code(code);
        let coupon = if code.is_empty() {
            None
        } else {
            catalog.resolve(&code)
        };

        match coupon {
            Some(coupon) => Ok(&*self.applied_coupon.insert(coupon)),
            None => Err(CoreError::UnknownCoupon(code)),
        }
    }

    /// Drops the active coupon, returning it.
    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.applied_coupon.take()
    }

    /// Sets how many loyalty points the customer spends on this sale.
    ///
    /// `available` is the customer's balance from the loyalty ledger.
    /// Redeeming `0` points cancels a previous redemption.
    ///
    /// ## Errors
    /// - `Validation` for negative points or balance
    /// - `InsufficientPoints` when `points > available`
    pub fn redeem_loyalty_points(&mut self, points: i64, available: i64) -> CoreResult<()> {
        if points < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "loyalty points".to_string(),
            }
            .into());
        }
        if available < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "available loyalty points".to_string(),
            }
            .into());
        }
        if points > available {
            return Err(CoreError::InsufficientPoints {
                requested: points,
                available,
            });
        }

        self.loyalty = (points > 0).then_some(LoyaltyRedemption { points, available });
        Ok(())
    }

    /// Empties the cart and resets every discount.
    pub fn clear(&mut self) {
        *self = Cart::default();
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&CartItem> {
        let id = id.trim();
        self.items.iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: &str) -> CoreResult<&mut CartItem> {
        let id = id.trim();
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))
    }

    pub fn fixed_discount(&self) -> Money {
        self.fixed_discount
    }

    pub fn percent_discount(&self) -> Percent {
        self.percent_discount
    }

    pub fn applied_coupon(&self) -> Option<&Coupon> {
        self.applied_coupon.as_ref()
    }

    pub fn loyalty(&self) -> Option<LoyaltyRedemption> {
        self.loyalty
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ line subtotals, before any discount.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_subtotal).sum()
    }

    /// Runs the discount pipeline.
    pub fn totals(&self, policy: &PricingPolicy) -> CartTotals {
        calculate_totals(self, policy)
    }

    /// Points this cart would earn if finalized now.
    pub fn loyalty_points_earned(&self, policy: &PricingPolicy) -> i64 {
        loyalty_points_earned(self.totals(policy).total, policy)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
