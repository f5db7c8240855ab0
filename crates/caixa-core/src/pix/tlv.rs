//! # TLV Builder
//!
//! EMV "ID LENGTH VALUE" fields, the building block of every BR Code.
//!
//! ```text
//! ┌────┬────┬──────────────────────┐
//! │ ID │ LL │ VALUE                │    "5406100.50"
//! │ 54 │ 06 │ 100.50               │     ID=54, LL=06, VALUE=100.50
//! └────┴────┴──────────────────────┘
//! ```
//!
//! `LL` is the UTF-8 byte length of VALUE, zero-padded to two digits, so a
//! single field carries at most 99 bytes. Nested templates (`26`, `62`) are
//! a builder whose output becomes the VALUE of the parent field.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};

/// Largest VALUE a two-digit length prefix can describe.
pub const MAX_VALUE_LEN: usize = 99;

/// Renders a single `ID LL VALUE` field.
///
/// ## Example
/// ```rust
/// use caixa_core::pix::tlv::field;
///
/// assert_eq!(field("00", "01").unwrap(), "000201");
/// assert_eq!(field("58", "BR").unwrap(), "5802BR");
/// ```
pub fn field(id: &str, value: &str) -> CoreResult<String> {
    debug_assert!(id.len() == 2 && id.bytes().all(|b| b.is_ascii_digit()));

    let len = value.len();
    if len > MAX_VALUE_LEN {
        return Err(CoreError::FieldTooLong {
            id: id.to_string(),
            len,
        });
    }

    Ok(format!("{}{:02}{}", id, len, value))
}

/// Accumulates TLV fields in call order.
///
/// ## Usage
/// ```rust
/// use caixa_core::pix::tlv::TlvBuilder;
///
/// let inner = TlvBuilder::new().field("05", "VENDA42").unwrap();
/// let payload = TlvBuilder::new()
///     .field("00", "01").unwrap()
///     .optional("54", None).unwrap()
///     .nested("62", inner).unwrap()
///     .build();
/// assert_eq!(payload, "00020162110507VENDA42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvBuilder {
    buf: String,
}

impl TlvBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mandatory field.
    pub fn field(mut self, id: &str, value: &str) -> CoreResult<Self> {
        self.buf.push_str(&field(id, value)?);
        Ok(self)
    }

    /// Appends a field only when `value` is present and non-empty.
    pub fn optional(self, id: &str, value: Option<&str>) -> CoreResult<Self> {
        match value {
            Some(v) if !v.is_empty() => self.field(id, v),
            _ => Ok(self),
        }
    }

    /// Appends `inner` as the value of template `id`; an empty template is
    /// omitted entirely.
    pub fn nested(self, id: &str, inner: TlvBuilder) -> CoreResult<Self> {
        if inner.is_empty() {
            return Ok(self);
        }
        self.field(id, inner.as_str())
    }

    /// True when no field has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The fields rendered so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Finishes the builder.
    pub fn build(self) -> String {
        self.buf
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlvField {
    pub id: String,
    pub value: String,
}

impl TlvField {
    /// Decodes this field's value as a nested template.
    pub fn children(&self) -> CoreResult<Vec<TlvField>> {
        parse(&self.value)
    }
}

/// Splits a TLV string into its top-level fields.
///
/// Fails when a header is truncated, a length is not two digits, or a
/// declared length runs past the end of the input (or splits a UTF-8
/// character).
pub fn parse(input: &str) -> CoreResult<Vec<TlvField>> {
    let mut fields = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let id = slice(input, pos, pos + 2)?;
        let len_str = slice(input, pos + 2, pos + 4)?;
        if !id.bytes().all(|b| b.is_ascii_digit()) || !len_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed(format!("bad field header at byte {}", pos)));
        }
        let len: usize = len_str
            .parse()
            .map_err(|_| malformed(format!("bad length at byte {}", pos + 2)))?;

        let value = slice(input, pos + 4, pos + 4 + len)?;
        fields.push(TlvField {
            id: id.to_string(),
            value: value.to_string(),
        });
        pos += 4 + len;
    }

    Ok(fields)
}

fn slice(input: &str, start: usize, end: usize) -> CoreResult<&str> {
    input
        .get(start..end)
        .ok_or_else(|| malformed(format!("field truncated at byte {}", start)))
}

fn malformed(reason: String) -> CoreError {
    ValidationError::InvalidFormat {
        field: "payload".to_string(),
        reason,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
