//! # Error Types
//!
//! Domain-specific error types for caixa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caixa-core errors (this file)                                         │
//! │  ├── CoreError        - PIX codec and cart pricing failures            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caixa-checkout errors (separate crate)                                │
//! │  └── CheckoutError    - Config loading + wrapped CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → App UI            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, coupon code, TLV tag)
//! 3. Errors are enum variants, never String
//! 4. Discounts are clamped, so there is no "discount exceeds value" error

use thiserror::Error;

use crate::types::PixKeyType;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A PIX key failed its format or check-digit validation.
    ///
    /// ## When This Occurs
    /// - CPF/CNPJ with wrong length or failing modulo-11 check digits
    /// - Email without a dotted domain
    /// - Random key that is not 32 alphanumerics
    #[error("Invalid {key_type} PIX key: {reason}")]
    InvalidKeyFormat {
        key_type: PixKeyType,
        reason: String,
    },

    /// Requested quantity is zero or negative.
    #[error("Invalid quantity {requested}: must be at least 1")]
    InvalidQuantity { requested: i64 },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Requested quantity is above the stock ceiling supplied by the caller.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier types quantity 5
    ///      │
    ///      ▼
    /// set_quantity(id, 5, Some(3))
    ///      │
    ///      ▼
    /// InsufficientStock { id: "7891000", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Apenas 3 em estoque"
    /// ```
    #[error("Insufficient stock for {id}: available {available}, requested {requested}")]
    InsufficientStock {
        id: String,
        available: i64,
        requested: i64,
    },

    /// No cart line with this id.
    #[error("Item not in cart: {0}")]
    ItemNotFound(String),

    /// Coupon code is not in the catalog.
    #[error("Unknown coupon: {0}")]
    UnknownCoupon(String),

    /// Customer tried to redeem more points than they hold.
    #[error("Cannot redeem {requested} points: only {available} available")]
    InsufficientPoints { requested: i64, available: i64 },

    /// Amount is negative, zero where a positive value is required, or
    /// otherwise unusable in a payload.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A TLV value does not fit the two-digit length prefix.
    #[error("BR Code field {id} is {len} bytes, maximum is 99")]
    FieldTooLong { id: String, len: usize },

    /// The QR encoder collaborator failed. Propagated, never retried.
    #[error("QR encoding failed: {0}")]
    EncodingFailure(String),

    /// The payment-status source could not answer within its timeout.
    #[error("Payment status unavailable for {transaction_id}: {reason}")]
    PaymentStatusUnavailable {
        transaction_id: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
