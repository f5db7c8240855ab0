//! # PIX Codec
//!
//! Everything needed to charge a customer through PIX:
//!
//! - [`tlv`] - EMV ID/LENGTH/VALUE fields
//! - [`crc`] - CRC16 trailer
//! - [`keys`] - key validation, normalization, random keys, transaction ids
//! - [`payload`] - BR Code serialization ([`PixCodec`])
//! - [`qr`] - QR rendering behind the [`QrEncoder`] seam
//! - [`status`] - payment status behind the [`PaymentStatusSource`] seam

pub mod crc;
pub mod keys;
pub mod payload;
pub mod qr;
pub mod status;
pub mod tlv;

pub use keys::{
    check_pix_key, generate_random_pix_key, generate_random_pix_key_with,
    generate_transaction_id, normalize_pix_key, validate_pix_key, validate_pix_key_str,
};
pub use payload::{build_payload, format_pix_amount, generate_pix_code, PixCodec, PixCodecConfig};
pub use qr::{generate_qr_image, QrCodeEncoder, QrEncoder, QrImage};
pub use status::{check_payment_status, FixedStatusSource, PaymentStatusSource};
