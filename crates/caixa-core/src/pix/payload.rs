//! # BR Code Payload
//!
//! Serializes a [`PixPaymentRequest`] into the EMV TLV text used both for the
//! QR code and the "copia e cola" string.
//!
//! ## Field Order (fixed, banks parse positionally)
//! ```text
//! ┌────┬──────────────────────────────┬──────────────────────────────────────┐
//! │ ID │ Field                        │ Value                                │
//! ├────┼──────────────────────────────┼──────────────────────────────────────┤
//! │ 00 │ Payload Format Indicator     │ "01"                                 │
//! │ 01 │ Point of Initiation Method   │ "12"                                 │
//! │ 26 │ Merchant Account Information │ ┌ 00 GUI "br.gov.bcb.pix"            │
//! │    │                              │ │ 01 merchant city                   │
//! │    │                              │ │ 02 key type                        │
//! │    │                              │ │ 03 key                             │
//! │    │                              │ └ 04 "0000"                          │
//! │ 52 │ Merchant Category Code       │ "0000"                               │
//! │ 53 │ Transaction Currency         │ "986" (BRL)                          │
//! │ 54 │ Transaction Amount           │ "100.50"            (only if amount) │
//! │ 58 │ Country Code                 │ "BR"                                 │
//! │ 59 │ Merchant Name                │ ≤ 25 chars                           │
//! │ 60 │ Merchant City                │ ≤ 15 chars                           │
//! │ 62 │ Additional Data Field        │ └ 05 transaction id  (only if txid)  │
//! │ 80 │ Description                  │ free text      (only if description) │
//! │ 63 │ CRC16                        │ 4 hex digits   (when append_crc)     │
//! └────┴──────────────────────────────┴──────────────────────────────────────┘
//! ```

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::crc::append_crc;
use super::keys::normalize_pix_key;
use super::tlv::TlvBuilder;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PixCode, PixPaymentRequest};
use crate::validation::{merchant_field, validate_transaction_id};

/// BR Code field ids.
pub mod id {
    pub const PAYLOAD_FORMAT: &str = "00";
    pub const POINT_OF_INITIATION: &str = "01";
    pub const MERCHANT_ACCOUNT: &str = "26";
    pub const MERCHANT_CATEGORY_CODE: &str = "52";
    pub const CURRENCY: &str = "53";
    pub const AMOUNT: &str = "54";
    pub const COUNTRY: &str = "58";
    pub const MERCHANT_NAME: &str = "59";
    pub const MERCHANT_CITY: &str = "60";
    pub const ADDITIONAL_DATA: &str = "62";
    pub const DESCRIPTION: &str = "80";

    /// Sub-ids inside Merchant Account Information (`26`).
    pub mod account {
        pub const GUI: &str = "00";
        pub const CITY: &str = "01";
        pub const KEY_TYPE: &str = "02";
        pub const KEY: &str = "03";
        pub const CATEGORY: &str = "04";
    }

    /// Sub-ids inside Additional Data Field (`62`).
    pub mod additional {
        pub const TRANSACTION_ID: &str = "05";
    }
}

pub const PAYLOAD_FORMAT_INDICATOR: &str = "01";
pub const POINT_OF_INITIATION_METHOD: &str = "12";
pub const PIX_GUI: &str = "br.gov.bcb.pix";
pub const ACCOUNT_CATEGORY_CODE: &str = "0000";
pub const MERCHANT_CATEGORY_CODE: &str = "0000";
/// ISO 4217 numeric code for BRL.
pub const CURRENCY_BRL: &str = "986";
pub const COUNTRY_CODE: &str = "BR";
pub const MAX_MERCHANT_NAME_LEN: usize = 25;
pub const MAX_MERCHANT_CITY_LEN: usize = 15;

// =============================================================================
// Codec Configuration
// =============================================================================

/// Codec options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PixCodecConfig {
    /// Append the `63` CRC16 trailer. Banking apps reject codes without it;
    /// turn off only to reproduce codes printed by older terminals.
    pub append_crc: bool,
}

impl Default for PixCodecConfig {
    fn default() -> Self {
        PixCodecConfig { append_crc: true }
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Stateless BR Code serializer.
///
/// ## Example
/// ```rust
/// use caixa_core::money::Money;
/// use caixa_core::pix::PixCodec;
/// use caixa_core::{PixKeyType, PixPaymentRequest};
///
/// let request = PixPaymentRequest::new("teste@exemplo.com", PixKeyType::Email, "Loja do Zé", "Recife")
///     .with_amount(Money::from_cents(10050));
/// let code = PixCodec::default().generate(&request).unwrap();
/// assert!(code.payload.starts_with("000201"));
/// assert!(code.payload.contains("5406100.50"));
/// assert_eq!(code.payload, code.copy_and_paste);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixCodec {
    config: PixCodecConfig,
}

impl PixCodec {
    /// Creates a codec with explicit options.
    pub const fn new(config: PixCodecConfig) -> Self {
        PixCodec { config }
    }

    /// Returns the codec options.
    pub const fn config(&self) -> PixCodecConfig {
        self.config
    }

    /// Serializes `request` into BR Code text.
    ///
    /// ## Errors
    /// - `Validation` when merchant name/city is empty or the transaction id
    ///   is not ≤ 25 alphanumerics
    /// - `InvalidAmount` when an amount is present but not positive
    /// - `FieldTooLong` when a value (typically the description) exceeds 99 bytes
    pub fn build_payload(&self, request: &PixPaymentRequest) -> CoreResult<String> {
        let name = merchant_field("merchant_name", &request.merchant_name, MAX_MERCHANT_NAME_LEN)?;
        let city = merchant_field("merchant_city", &request.merchant_city, MAX_MERCHANT_CITY_LEN)?;

        let amount = request
            .amount
            .map(|a| {
                if a.is_positive() {
                    Ok(amount_field_value(a))
                } else {
                    Err(CoreError::InvalidAmount {
                        reason: format!("PIX amount must be positive, got {}", a.amount()),
                    })
                }
            })
            .transpose()?;

        let transaction_id = non_empty(request.transaction_id.as_deref());
        if let Some(txid) = transaction_id {
            validate_transaction_id(txid)?;
        }

        let key = normalize_pix_key(&request.key, request.key_type);
        let account = TlvBuilder::new()
            .field(id::account::GUI, PIX_GUI)?
            .field(id::account::CITY, city)?
            .field(id::account::KEY_TYPE, request.key_type.as_str())?
            .field(id::account::KEY, &key)?
            .field(id::account::CATEGORY, ACCOUNT_CATEGORY_CODE)?;

        let additional =
            TlvBuilder::new().optional(id::additional::TRANSACTION_ID, transaction_id)?;

        let payload = TlvBuilder::new()
            .field(id::PAYLOAD_FORMAT, PAYLOAD_FORMAT_INDICATOR)?
            .field(id::POINT_OF_INITIATION, POINT_OF_INITIATION_METHOD)?
            .nested(id::MERCHANT_ACCOUNT, account)?
            .field(id::MERCHANT_CATEGORY_CODE, MERCHANT_CATEGORY_CODE)?
            .field(id::CURRENCY, CURRENCY_BRL)?
            .optional(id::AMOUNT, amount.as_deref())?
            .field(id::COUNTRY, COUNTRY_CODE)?
            .field(id::MERCHANT_NAME, name)?
            .field(id::MERCHANT_CITY, city)?
            .nested(id::ADDITIONAL_DATA, additional)?
            .optional(id::DESCRIPTION, non_empty(request.description.as_deref()))?
            .build();

        if self.config.append_crc {
            Ok(append_crc(&payload))
        } else {
            Ok(payload)
        }
    }

    /// Builds the payload and wraps it as a [`PixCode`].
    pub fn generate(&self, request: &PixPaymentRequest) -> CoreResult<PixCode> {
        self.build_payload(request).map(PixCode::from_payload)
    }
}

/// [`PixCodec::build_payload`] with default options (CRC appended).
pub fn build_payload(request: &PixPaymentRequest) -> CoreResult<String> {
    PixCodec::default().build_payload(request)
}

/// [`PixCodec::generate`] with default options.
pub fn generate_pix_code(request: &PixPaymentRequest) -> CoreResult<PixCode> {
    PixCodec::default().generate(request)
}

// =============================================================================
// Amount Formatting
// =============================================================================

/// Field `54` text: plain decimal with exactly two fraction digits, no
/// thousands separator and no currency symbol.
fn amount_field_value(amount: Money) -> String {
    let mut value = amount
        .amount()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value.to_string()
}

/// The amount's two-decimal text with the separator removed.
///
/// ## Example
/// ```rust
/// use caixa_core::money::Money;
/// use caixa_core::pix::format_pix_amount;
///
/// assert_eq!(format_pix_amount(Money::from_cents(10050)).unwrap(), "10050");
/// assert_eq!(format_pix_amount(Money::from_cents(99)).unwrap(), "099");
/// assert_eq!(format_pix_amount(Money::from_cents(100000)).unwrap(), "100000");
/// ```
///
/// ## Errors
/// `InvalidAmount` for negative input.
pub fn format_pix_amount(amount: Money) -> CoreResult<String> {
    if amount.is_negative() {
        return Err(CoreError::InvalidAmount {
            reason: format!("cannot format negative amount {}", amount.amount()),
        });
    }
    Ok(amount_field_value(amount).replace('.', ""))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pix::crc::verify_crc;
    use crate::pix::tlv::parse;
    use crate::types::PixKeyType;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn request() -> PixPaymentRequest {
        PixPaymentRequest::new("teste@exemplo.com", PixKeyType::Email, "Loja do Ze", "Recife")
    }

    fn legacy() -> PixCodec {
        PixCodec::new(PixCodecConfig { append_crc: false })
    }

    fn ids(payload: &str) -> Vec<String> {
        parse(payload).unwrap().into_iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_minimal_payload_exact() {
        let payload = legacy().build_payload(&request()).unwrap();
        let expected = concat!(
            "000201",
            "010212",
            "2666",
            "0014br.gov.bcb.pix",
            "0106Recife",
            "0205email",
            "0317teste@exemplo.com",
            "04040000",
            "52040000",
            "5303986",
            "5802BR",
            "5910Loja do Ze",
            "6006Recife",
        );
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_amount_field() {
        let req = request().with_amount(Money::new(dec!(100.5)));
        let payload = build_payload(&req).unwrap();
        assert!(payload.contains("5406100.50"));

        let req = request().with_amount(Money::new(dec!(1234.567)));
        assert!(build_payload(&req).unwrap().contains("54071234.57"));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let req = request().with_amount(Money::zero());
        assert!(matches!(
            build_payload(&req),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_full_field_order() {
        let req = request()
            .with_amount(Money::from_cents(10050))
            .with_transaction_id("VENDA42")
            .with_description("Pedido 42");
        let payload = build_payload(&req).unwrap();
        assert_eq!(
            ids(&payload),
            ["00", "01", "26", "52", "53", "54", "58", "59", "60", "62", "80", "63"]
        );
        assert!(payload.contains("62110507VENDA42"));
        assert!(payload.contains("8009Pedido 42"));
        assert!(verify_crc(&payload));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let req = request().with_description("   ").with_transaction_id("");
        let payload = legacy().build_payload(&req).unwrap();
        assert_eq!(ids(&payload), ["00", "01", "26", "52", "53", "58", "59", "60"]);
    }

    #[test]
    fn test_merchant_account_template() {
        let req = PixPaymentRequest::new("123.456.789-09", PixKeyType::Cpf, "Ana", "Olinda");
        let payload = legacy().build_payload(&req).unwrap();
        let fields = parse(&payload).unwrap();
        let account = fields.iter().find(|f| f.id == "26").unwrap().children().unwrap();
        let values: Vec<_> = account.iter().map(|f| (f.id.as_str(), f.value.as_str())).collect();
        assert_eq!(
            values,
            [
                ("00", PIX_GUI),
                ("01", "Olinda"),
                ("02", "cpf"),
                ("03", "12345678909"),
                ("04", "0000"),
            ]
        );
    }

    #[test]
    fn test_merchant_name_truncated() {
        let req = PixPaymentRequest::new(
            "teste@exemplo.com",
            PixKeyType::Email,
            "Supermercado Familia Silva e Filhos Ltda",
            "Jaboatao dos Guararapes",
        );
        let payload = legacy().build_payload(&req).unwrap();
        let fields = parse(&payload).unwrap();
        let name = fields.iter().find(|f| f.id == "59").unwrap();
        let city = fields.iter().find(|f| f.id == "60").unwrap();
        assert_eq!(name.value, "Supermercado Familia Silv");
        assert_eq!(city.value, "Jaboatao dos Gu");
    }

    #[test]
    fn test_empty_merchant_rejected() {
        let req = PixPaymentRequest::new("teste@exemplo.com", PixKeyType::Email, "", "Recife");
        assert!(matches!(build_payload(&req), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_description_too_long() {
        let req = request().with_description("x".repeat(100));
        assert!(matches!(
            build_payload(&req),
            Err(CoreError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn test_bad_transaction_id_rejected() {
        let req = request().with_transaction_id("venda 42!");
        assert!(build_payload(&req).is_err());
    }

    #[test]
    fn test_format_pix_amount() {
        assert_eq!(format_pix_amount(Money::new(dec!(100.50))).unwrap(), "10050");
        assert_eq!(format_pix_amount(Money::new(dec!(0.99))).unwrap(), "099");
        assert_eq!(format_pix_amount(Money::new(dec!(1000))).unwrap(), "100000");
        assert_eq!(format_pix_amount(Money::zero()).unwrap(), "000");
        assert!(format_pix_amount(Money::from_cents(-1)).is_err());
    }

    proptest! {
        #[test]
        fn prop_payload_lengths_consistent(
            cents in 1i64..10_000_000,
            name in "[A-Za-z ]{1,40}",
            city in "[A-Za-z]{1,30}",
            txid in proptest::option::of("[A-Z0-9]{1,25}"),
        ) {
            prop_assume!(!name.trim().is_empty());
            let mut req = PixPaymentRequest::new("teste@exemplo.com", PixKeyType::Email, name, city)
                .with_amount(Money::from_cents(cents));
            req.transaction_id = txid;

            let payload = build_payload(&req).unwrap();
            prop_assert!(payload.starts_with("000201"));
            prop_assert!(verify_crc(&payload));

            // parse() fails if any declared length disagrees with its value
            let fields = parse(&payload).unwrap();
            for f in fields.iter().filter(|f| f.id == "26" || f.id == "62") {
                prop_assert!(f.children().is_ok());
            }
            let amount = fields.iter().find(|f| f.id == "54").unwrap();
            prop_assert_eq!(amount.value.replace('.', ""), format_pix_amount(Money::from_cents(cents)).unwrap());
        }
    }
}
