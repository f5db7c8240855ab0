//! # caixa-checkout: Checkout Session for Caixa POS
//!
//! Consumes `caixa-core` the way a register does: load the merchant's
//! configuration, ring up a cart, finalize it into a PIX charge, show the
//! QR code and ask the payment network whether it was paid.
//!
//! ## Modules
//!
//! - [`config`] - TOML + environment configuration
//! - [`session`] - the active cart and sale finalization
//! - [`error`] - checkout error types
//!
//! ## Example Usage
//!
//! ```rust
//! use caixa_checkout::{CheckoutConfig, CheckoutSession};
//! use caixa_core::{Money, PixKeyType};
//!
//! let mut config = CheckoutConfig::default();
//! config.merchant.name = "Padaria Pão Quente".into();
//! config.merchant.city = "Recife".into();
//! config.merchant.pix_key = "12345678909".into();
//! config.merchant.pix_key_type = PixKeyType::Cpf;
//!
//! let mut session = CheckoutSession::new(config).unwrap();
//! session.cart_mut().add_item("7891000100103", "Café 500g", Money::from_cents(1575), 1).unwrap();
//! session.apply_coupon("FIXO5").unwrap();
//!
//! let sale = session.finalize().unwrap();
//! assert_eq!(sale.amount_due(), Money::from_cents(1075));
//! assert!(sale.pix.unwrap().copy_and_paste.contains("540510.75"));
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, CheckoutResult};
pub use session::{CheckoutSession, SaleSummary};

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=caixa_checkout=trace` - Trace for this crate only
/// - Default: INFO, DEBUG for caixa crates
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caixa_checkout=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
