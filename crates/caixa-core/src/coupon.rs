//! # Coupon Catalog
//!
//! Resolves coupon codes typed at the register into [`Coupon`] values.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier types " mega20 "                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_coupon_code() ──► "MEGA20"                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LayeredCatalog                                                         │
//! │  ├── extras (from checkout config)  ── hit? ──► Coupon                 │
//! │  └── BuiltinCoupons                 ── hit? ──► Coupon                 │
//! │                                       miss  ──► None → UnknownCoupon   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `Fn(&str) -> Option<Coupon>` is also a catalog, so a backend lookup
//! can be passed as a closure.

use rust_decimal::Decimal;

use crate::types::{normalize_coupon_code, Coupon, CouponKind};

/// Looks up coupons by code.
///
/// Implementations receive the already-normalized (trimmed, uppercase) code.
pub trait CouponCatalog {
    fn resolve(&self, code: &str) -> Option<Coupon>;
}

impl<F> CouponCatalog for F
where
    F: Fn(&str) -> Option<Coupon>,
{
    fn resolve(&self, code: &str) -> Option<Coupon> {
        self(code)
    }
}

// =============================================================================
// Built-in Catalog
// =============================================================================

/// The three codes every register accepts without a backend.
///
/// | Code         | Discount                            |
/// |--------------|-------------------------------------|
/// | `DESCONTO10` | 10% of the value after discounts    |
/// | `FIXO5`      | R$ 5,00 fixed                       |
/// | `MEGA20`     | 20% of the value after discounts    |
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCoupons;

impl BuiltinCoupons {
    /// Codes in display order.
    pub const CODES: [&'static str; 3] = ["DESCONTO10", "FIXO5", "MEGA20"];
}

impl CouponCatalog for BuiltinCoupons {
    fn resolve(&self, code: &str) -> Option<Coupon> {
        let (kind, value) = match normalize_coupon_code(code).as_str() {
            "DESCONTO10" => (CouponKind::Percentage, Decimal::TEN),
            "FIXO5" => (CouponKind::Fixed, Decimal::from(5)),
            "MEGA20" => (CouponKind::Percentage, Decimal::from(20)),
            _ => return None,
        };
        Coupon::new(code, kind, value).ok()
    }
}

// =============================================================================
// Layered Catalog
// =============================================================================

/// Extra coupons consulted before a fallback catalog.
///
/// An extra coupon with a built-in code shadows the built-in.
#[derive(Debug, Clone, Default)]
pub struct LayeredCatalog<C = BuiltinCoupons> {
    extras: Vec<Coupon>,
    fallback: C,
}

impl LayeredCatalog<BuiltinCoupons> {
    /// Layers `extras` over the built-in codes.
    pub fn over_builtins(extras: Vec<Coupon>) -> Self {
        LayeredCatalog::new(extras, BuiltinCoupons)
    }
}

impl<C: CouponCatalog> LayeredCatalog<C> {
    pub fn new(extras: Vec<Coupon>, fallback: C) -> Self {
        LayeredCatalog { extras, fallback }
    }

    /// The configured extra coupons.
    pub fn extras(&self) -> &[Coupon] {
        &self.extras
    }
}

impl<C: CouponCatalog> CouponCatalog for LayeredCatalog<C> {
    fn resolve(&self, code: &str) -> Option<Coupon> {
        let code = normalize_coupon_code(code);
        self.extras
            .iter()
            .find(|c| c.code == code)
            .cloned()
            .or_else(|| self.fallback.resolve(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_codes() {
        let c = BuiltinCoupons.resolve("DESCONTO10").unwrap();
        assert_eq!(c.kind, CouponKind::Percentage);
        assert_eq!(c.value, dec!(10));

        let c = BuiltinCoupons.resolve("FIXO5").unwrap();
        assert_eq!(c.kind, CouponKind::Fixed);
        assert_eq!(c.value, dec!(5));

        let c = BuiltinCoupons.resolve("MEGA20").unwrap();
        assert_eq!(c.value, dec!(20));

        assert!(BuiltinCoupons.resolve("NATAL50").is_none());
    }

    #[test]
    fn test_builtin_codes_case_insensitive() {
        assert_eq!(BuiltinCoupons.resolve(" fixo5 ").unwrap().code, "FIXO5");
        for code in BuiltinCoupons::CODES {
            assert!(BuiltinCoupons.resolve(code).is_some());
        }
    }

    #[test]
    fn test_layered_extras_shadow_builtins() {
        let extras = vec![
            Coupon::new("NATAL50", CouponKind::Fixed, dec!(50)).unwrap(),
            Coupon::new("FIXO5", CouponKind::Fixed, dec!(7)).unwrap(),
        ];
        let catalog = LayeredCatalog::over_builtins(extras);

        assert_eq!(catalog.resolve("natal50").unwrap().value, dec!(50));
        assert_eq!(catalog.resolve("FIXO5").unwrap().value, dec!(7));
        assert_eq!(catalog.resolve("MEGA20").unwrap().value, dec!(20));
        assert!(catalog.resolve("NOPE").is_none());
    }

    #[test]
    fn test_closure_catalog() {
        let lookup = |code: &str| {
            (code == "VIP").then(|| Coupon::new(code, CouponKind::Percentage, dec!(15)).unwrap())
        };
        assert!(lookup.resolve("VIP").is_some());
        assert!(lookup.resolve("DESCONTO10").is_none());
    }
}
