//! # PIX Key Validation
//!
//! Format and check-digit rules for the five PIX key types.
//!
//! ## Rules by Type
//! ```text
//! ┌──────────┬───────────────────────────────────────────────────────────────┐
//! │ email    │ local@domain.tld, no whitespace, a dot inside the domain      │
//! │ cpf      │ 11 digits, not all equal, two modulo-11 check digits          │
//! │ cnpj     │ 14 digits, not all equal, two weighted modulo-11 digits       │
//! │ phone    │ 10 or 11 digits after stripping punctuation                   │
//! │ random   │ exactly 32 ASCII letters/digits                               │
//! └──────────┴───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Punctuation in CPF/CNPJ/phone (`123.456.789-09`) is ignored.

use rand::Rng;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::PixKeyType;
use crate::validation::MAX_TRANSACTION_ID_LEN;

/// Length of a random ("aleatória") key.
pub const RANDOM_KEY_LEN: usize = 32;

/// Longest email the DICT directory accepts as a key.
pub const MAX_EMAIL_KEY_LEN: usize = 77;

const RANDOM_KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

// =============================================================================
// Public API
// =============================================================================

/// Returns true when `key` is a well-formed key of `key_type`.
///
/// ## Example
/// ```rust
/// use caixa_core::pix::validate_pix_key;
/// use caixa_core::PixKeyType;
///
/// assert!(validate_pix_key("teste@exemplo.com", PixKeyType::Email));
/// assert!(validate_pix_key("123.456.789-09", PixKeyType::Cpf));
/// assert!(!validate_pix_key("12345678901", PixKeyType::Cpf));
/// ```
pub fn validate_pix_key(key: &str, key_type: PixKeyType) -> bool {
    check_pix_key(key, key_type).is_ok()
}

/// Like [`validate_pix_key`] but takes the type as text; an unknown type
/// yields `false` rather than an error.
pub fn validate_pix_key_str(key: &str, key_type: &str) -> bool {
    key_type
        .parse::<PixKeyType>()
        .map(|kt| validate_pix_key(key, kt))
        .unwrap_or(false)
}

/// Validates `key`, explaining the failure.
pub fn check_pix_key(key: &str, key_type: PixKeyType) -> CoreResult<()> {
    let result = match key_type {
        PixKeyType::Email => check_email(key),
        PixKeyType::Cpf => check_cpf(key),
        PixKeyType::Cnpj => check_cnpj(key),
        PixKeyType::Phone => check_phone(key),
        PixKeyType::Random => check_random(key),
    };

    result.map_err(|reason| CoreError::InvalidKeyFormat {
        key_type,
        reason: reason.to_string(),
    })
}

/// Canonical form of a key as embedded in the BR Code.
///
/// - CPF/CNPJ: digits only
/// - Phone: `+55` followed by the digits, unless a `+` country code was given
/// - Email: trimmed and lowercased
/// - Random: trimmed
pub fn normalize_pix_key(key: &str, key_type: PixKeyType) -> String {
    let key = key.trim();
    match key_type {
        PixKeyType::Cpf | PixKeyType::Cnpj => only_digits(key),
        PixKeyType::Phone if key.starts_with('+') => format!("+{}", only_digits(key)),
        PixKeyType::Phone => format!("+55{}", only_digits(key)),
        PixKeyType::Email => key.to_lowercase(),
        PixKeyType::Random => key.to_string(),
    }
}

/// Generates a random key: 32 characters drawn uniformly from `[A-Z0-9]`.
pub fn generate_random_pix_key() -> String {
    generate_random_pix_key_with(&mut rand::thread_rng())
}

/// [`generate_random_pix_key`] with a caller-supplied generator.
pub fn generate_random_pix_key_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RANDOM_KEY_LEN)
        .map(|_| char::from(RANDOM_KEY_ALPHABET[rng.gen_range(0..RANDOM_KEY_ALPHABET.len())]))
        .collect()
}

/// Generates a 25-character uppercase alphanumeric transaction id for field
/// `62`/`05`.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(MAX_TRANSACTION_ID_LEN)
        .collect()
}

// =============================================================================
// Per-type Checks
// =============================================================================

fn check_email(key: &str) -> Result<(), &'static str> {
    if key.chars().count() > MAX_EMAIL_KEY_LEN {
        return Err("longer than 77 characters");
    }
    if key.chars().any(char::is_whitespace) {
        return Err("contains whitespace");
    }

    let mut parts = key.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("must contain exactly one '@'");
    };
    if local.is_empty() {
        return Err("missing local part before '@'");
    }

    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err("domain must contain a '.'");
    }

    Ok(())
}

fn check_cpf(key: &str) -> Result<(), &'static str> {
    let digits = digit_values(key);
    if digits.len() != 11 {
        return Err("must have 11 digits");
    }
    if all_same(&digits) {
        return Err("repeated digit sequence");
    }

    let first = cpf_check_digit(&digits[..9]);
    let second = cpf_check_digit(&digits[..10]);
    if digits[9] != first || digits[10] != second {
        return Err("check digits do not match");
    }

    Ok(())
}

/// Weights run from `len + 1` down to 2; `(sum * 10) % 11`, with 10 mapped to 0.
fn cpf_check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=top).rev())
        .map(|(d, w)| d * w)
        .sum();
    let rem = (sum * 10) % 11;
    if rem >= 10 {
        0
    } else {
        rem
    }
}

fn check_cnpj(key: &str) -> Result<(), &'static str> {
    let digits = digit_values(key);
    if digits.len() != 14 {
        return Err("must have 14 digits");
    }
    if all_same(&digits) {
        return Err("repeated digit sequence");
    }

    let first = cnpj_check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS);
    let second = cnpj_check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS);
    if digits[12] != first || digits[13] != second {
        return Err("check digits do not match");
    }

    Ok(())
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rem = sum % 11;
    if rem < 2 {
        0
    } else {
        11 - rem
    }
}

fn check_phone(key: &str) -> Result<(), &'static str> {
    match only_digits(key).len() {
        10 | 11 => Ok(()),
        _ => Err("must have 10 or 11 digits including area code"),
    }
}

fn check_random(key: &str) -> Result<(), &'static str> {
    if key.len() != RANDOM_KEY_LEN || !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err("must be exactly 32 letters or digits");
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn only_digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn digit_values(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

// =============================================================================
// Unit Tests
// =============================================================================
