//! # caixa-core: Pure Business Logic for Caixa POS
//!
//! The two leaf components of the register: the PIX payment codec and the
//! cart pricing engine. No I/O lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caixa POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (mobile / web)                      │   │
//! │  │    Scan ──► Cart UI ──► Discounts ──► PIX QR ──► Receipt        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                caixa-checkout (session + config)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caixa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │    pix    │  │   cart    │  │  pricing  │  │  coupon   │  │   │
//! │  │   │  BR Code  │  │   Cart    │  │ pipeline  │  │  catalog  │  │   │
//! │  │   │  keys/QR  │  │ CartItem  │  │  totals   │  │  lookup   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOGGING • NO NETWORK • DETERMINISTIC              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Injected collaborators: QrEncoder, PaymentStatusSource, CouponCatalog  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pix`] - BR Code payloads, PIX keys, QR and payment-status seams
//! - [`cart`] - the cart aggregate and its operations
//! - [`pricing`] - discount pipeline and loyalty accrual
//! - [`coupon`] - coupon catalogs
//! - [`money`] - exact decimal BRL amounts
//! - [`types`] - shared domain types
//! - [`error`] - domain error types
//! - [`validation`] - input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use caixa_core::coupon::BuiltinCoupons;
//! use caixa_core::money::Money;
//! use caixa_core::pix::build_payload;
//! use caixa_core::pricing::PricingPolicy;
//! use caixa_core::{Cart, PixKeyType, PixPaymentRequest};
//!
//! let mut cart = Cart::new();
//! cart.add_item("7891000100103", "Café 500g", Money::from_cents(1575), 2).unwrap();
//! cart.apply_coupon("FIXO5", &BuiltinCoupons).unwrap();
//!
//! let totals = cart.totals(&PricingPolicy::default()).rounded();
//! assert_eq!(totals.total, Money::from_cents(2650));
//!
//! let request = PixPaymentRequest::new("12345678909", PixKeyType::Cpf, "Padaria Pão Quente", "Recife")
//!     .with_amount(totals.total);
//! let payload = build_payload(&request).unwrap();
//! assert!(payload.contains("540526.50"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pix;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, LoyaltyRedemption};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{CartTotals, PricingPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
///
/// ## Business Reason
/// Keeps receipts printable and catches runaway scanners.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos at the register (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
