//! # Validation Module
//!
//! Input validation shared by the cart and the PIX codec.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Mobile frontend                                              │
//! │  ├── Masks for CPF/CNPJ/phone                                          │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: caixa-core (Rust)                                            │
//! │  ├── THIS MODULE: quantities, amounts, merchant fields                 │
//! │  └── pix::keys: PIX key formats and check digits                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Banking app                                                  │
//! │  └── Rejects malformed BR Codes at scan time                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use caixa_core::validation::{validate_item_id, validate_quantity};
//!
//! assert!(validate_item_id("7891000100103").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a cart line id (SKU or EAN barcode).
pub const MAX_ITEM_ID_LEN: usize = 50;

/// Maximum length of a BR Code transaction id (field `62`/`05`).
pub const MAX_TRANSACTION_ID_LEN: usize = 25;

/// Largest unit price or fixed discount the cart accepts, in reais.
///
/// 100 lines × 999 units at this price stay far inside `Decimal`'s range,
/// so pricing arithmetic cannot overflow.
pub const MAX_AMOUNT_REAIS: i64 = 1_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a cart line id.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
pub fn validate_item_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "item id".to_string(),
        });
    }

    if id.chars().count() > MAX_ITEM_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "item id".to_string(),
            max: MAX_ITEM_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a required merchant field (name or city) and truncates it to
/// the EMV limit.
///
/// ## Returns
/// The trimmed value cut to at most `max` characters (trailing spaces left
/// by the cut are dropped).
///
/// ## Example
/// ```rust
/// use caixa_core::validation::merchant_field;
///
/// let name = merchant_field("merchant_name", "Mercadinho Bom Preço do Bairro Novo", 25).unwrap();
/// assert_eq!(name.chars().count(), 25);
/// assert!(merchant_field("merchant_city", "   ", 15).is_err());
/// ```
pub fn merchant_field<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(truncate_chars(value, max).trim_end())
}

/// Validates a BR Code transaction id.
///
/// ## Rules
/// - At most 25 characters
/// - ASCII letters and digits only (banks reject anything else in `62`/`05`)
pub fn validate_transaction_id(id: &str) -> ValidationResult<()> {
    if id.chars().count() > MAX_TRANSACTION_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "transaction_id".to_string(),
            max: MAX_TRANSACTION_ID_LEN,
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "transaction_id".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Cuts `value` to at most `max` characters on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty < 1? → InvalidQuantity                                   │
/// │       │                                                                 │
/// │       ├── qty > 999? → QuantityTooLarge                                │
/// │       │                                                                 │
/// │       └── OK → Proceed with add_item                                   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> CoreResult<()> {
    if qty < 1 {
        return Err(CoreError::InvalidQuantity { requested: qty });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: qty,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that an amount (price or fixed discount) is not negative.
///
/// ## Example
/// ```rust
/// use caixa_core::money::Money;
/// use caixa_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_non_negative("price", Money::zero()).is_ok());
/// assert!(validate_non_negative("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price or fixed discount: not negative and at most
/// [`MAX_AMOUNT_REAIS`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_non_negative(field, amount)?;

    if amount > Money::from_cents(MAX_AMOUNT_REAIS * 100) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_REAIS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
