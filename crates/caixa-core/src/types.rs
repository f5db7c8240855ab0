//! # Domain Types
//!
//! Core domain types shared by the PIX codec and the cart pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌─────────────────┐  ┌─────────────────────┐    │
//! │  │ PixPaymentRequest│  │    PixCode      │  │ PaymentStatusReport │    │
//! │  │  ─────────────── │  │  ─────────────  │  │  ─────────────────  │    │
//! │  │  key, key_type   │  │  payload        │  │  status             │    │
//! │  │  merchant name   │  │  copy_and_paste │  │  amount?            │    │
//! │  │  amount?         │  └─────────────────┘  │  settled_at?        │    │
//! │  │  txid?           │                       └─────────────────────┘    │
//! │  └──────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PixKeyType    │   │     Percent     │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Email  Cpf     │   │  0..=100        │   │  code           │       │
//! │  │  Cnpj   Phone   │   │  Decimal        │   │  kind (fixed|%) │       │
//! │  │  Random         │   └─────────────────┘   │  value          │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// PIX Key Type
// =============================================================================

/// The five kinds of key a PIX account can be addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyType {
    /// `fulano@exemplo.com`
    Email,
    /// Individual taxpayer id, 11 digits.
    Cpf,
    /// Company taxpayer id, 14 digits.
    Cnpj,
    /// Mobile number with area code, 10 or 11 digits.
    Phone,
    /// 32-character random key issued by the bank.
    Random,
}

impl PixKeyType {
    /// The string embedded in Merchant Account Information (`26`/`02`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Email => "email",
            PixKeyType::Cpf => "cpf",
            PixKeyType::Cnpj => "cnpj",
            PixKeyType::Phone => "phone",
            PixKeyType::Random => "random",
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixKeyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" | "e-mail" => Ok(PixKeyType::Email),
            "cpf" => Ok(PixKeyType::Cpf),
            "cnpj" => Ok(PixKeyType::Cnpj),
            "phone" | "telefone" | "celular" => Ok(PixKeyType::Phone),
            "random" | "aleatoria" | "evp" => Ok(PixKeyType::Random),
            other => Err(ValidationError::InvalidFormat {
                field: "key_type".to_string(),
                reason: format!(
                    "unknown PIX key type '{}'. Valid options: email, cpf, cnpj, phone, random",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage in the closed range 0..=100.
///
/// ## Why not basis points?
/// Discounts are typed by cashiers as "12,5%" and coupons carry arbitrary
/// decimal rates. Keeping the exact decimal avoids a second rounding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "Decimal")]
pub struct Percent(#[ts(type = "string")] Decimal);

impl Percent {
    /// Creates a percentage, rejecting values outside 0..=100.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "percent".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Percent(value))
    }

    /// Creates a whole-number percentage (`10` = 10%).
    pub fn from_whole(value: u32) -> Result<Self, ValidationError> {
        Self::new(Decimal::from(value))
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(Decimal::ZERO)
    }

    /// Returns the value as written (`12.5` for 12,5%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the multiplier (`0.125` for 12,5%).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percent::new(value)
    }
}

// =============================================================================
// PIX Payment Request
// =============================================================================

/// Everything needed to build a BR Code.
///
/// Construct with [`PixPaymentRequest::new`] and the `with_*` builders.
/// Callers must run [`crate::pix::validate_pix_key`] first; the codec embeds
/// whatever key it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentRequest {
    /// Raw PIX key value.
    pub key: String,
    pub key_type: PixKeyType,
    /// Truncated to 25 characters when serialized.
    pub merchant_name: String,
    /// Truncated to 15 characters when serialized.
    pub merchant_city: String,
    /// `None` lets the payer type the amount in their banking app.
    pub amount: Option<Money>,
    pub description: Option<String>,
    /// Correlates the code with a later status check.
    pub transaction_id: Option<String>,
}

impl PixPaymentRequest {
    /// Creates a request without amount, description or transaction id.
    pub fn new(
        key: impl Into<String>,
        key_type: PixKeyType,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        PixPaymentRequest {
            key: key.into(),
            key_type,
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            amount: None,
            description: None,
            transaction_id: None,
        }
    }

    /// Sets a fixed amount (field `54`).
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the free-text description (field `80`).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the transaction id (field `62`/`05`).
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

// =============================================================================
// PIX Code
// =============================================================================

/// Output of the codec: the QR payload and its "copia e cola" twin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PixCode {
    pub payload: String,
    /// Always identical to `payload`.
    pub copy_and_paste: String,
}

impl PixCode {
    pub(crate) fn from_payload(payload: String) -> Self {
        PixCode {
            copy_and_paste: payload.clone(),
            payload,
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state reported by the payment-status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Code generated, nothing received yet.
    Pending,
    /// Funds settled.
    Completed,
    /// Rejected, expired or refunded.
    Failed,
}

impl PaymentStatus {
    /// True once the status can no longer change.
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// One answer from a payment-status source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusReport {
    pub status: PaymentStatus,
    pub amount: Option<Money>,
    #[ts(as = "Option<String>")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl PaymentStatusReport {
    /// A report with no amount or settlement time yet.
    pub fn pending() -> Self {
        PaymentStatusReport {
            status: PaymentStatus::Pending,
            amount: None,
            settled_at: None,
        }
    }

    /// A settled payment.
    pub fn completed(amount: Money, settled_at: DateTime<Utc>) -> Self {
        PaymentStatusReport {
            status: PaymentStatus::Completed,
            amount: Some(amount),
            settled_at: Some(settled_at),
        }
    }

    /// A failed payment.
    pub fn failed() -> Self {
        PaymentStatusReport {
            status: PaymentStatus::Failed,
            amount: None,
            settled_at: None,
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is an amount in reais.
    Fixed,
    /// `value` is a percentage of what is still payable.
    Percentage,
}

/// A discount code. At most one is active per cart.
///
/// Deserialization goes through [`Coupon::new`], so a stored coupon obeys
/// the same rules as one built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "CouponRecord")]
pub struct Coupon {
    /// Normalized (trimmed, uppercase) code.
    pub code: String,
    pub kind: CouponKind,
    #[ts(type = "string")]
    pub value: Decimal,
}

impl Coupon {
    /// Creates a coupon, normalizing the code and checking the value range.
    ///
    /// ## Rules
    /// - Value must not be negative
    /// - Percentage coupons must not exceed 100
    pub fn new(
        code: impl AsRef<str>,
        kind: CouponKind,
        value: Decimal,
    ) -> Result<Self, ValidationError> {
        let code = normalize_coupon_code(code.as_ref());
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "coupon code".to_string(),
            });
        }
        if value < Decimal::ZERO {
            return Err(ValidationError::MustNotBeNegative {
                field: "coupon value".to_string(),
            });
        }
        if kind == CouponKind::Percentage && value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "coupon value".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Coupon { code, kind, value })
    }
}

/// Wire shape of [`Coupon`] before validation.
#[derive(Deserialize)]
struct CouponRecord {
    code: String,
    kind: CouponKind,
    value: Decimal,
}

impl TryFrom<CouponRecord> for Coupon {
    type Error = ValidationError;

    fn try_from(record: CouponRecord) -> Result<Self, Self::Error> {
        Coupon::new(record.code, record.kind, record.value)
    }
}

/// Trims and uppercases a coupon code as typed by the cashier.
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// =============================================================================
// Unit Tests
// =============================================================================
