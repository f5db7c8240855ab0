//! # Checkout Configuration
//!
//! Who gets paid, how codes are built and how loyalty converts.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAIXA_MERCHANT_NAME, CAIXA_MERCHANT_CITY                           │
//! │     CAIXA_PIX_KEY, CAIXA_PIX_KEY_TYPE, CAIXA_PIX_APPEND_CRC            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/caixa-pos/checkout.toml (Linux)                          │
//! │     ~/Library/Application Support/br.caixa.caixa-pos/checkout.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     CRC on, 30s status timeout, 1 point = R$0,01, R$10 per point       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [merchant]
//! name = "Padaria Pão Quente"
//! city = "Recife"
//! pix_key = "11.222.333/0001-81"
//! pix_key_type = "cnpj"
//!
//! [pix]
//! append_crc = true
//! status_timeout_secs = 30
//!
//! [loyalty]
//! point_value_cents = 1
//! accrual_step_cents = 1000
//!
//! [[coupons.extras]]
//! code = "NATAL50"
//! kind = "fixed"
//! value = 50
//! ```

use std::path::PathBuf;
use std::time::Duration;

use caixa_core::coupon::LayeredCatalog;
use caixa_core::pix::{check_pix_key, PixCodec, PixCodecConfig};
use caixa_core::{Coupon, CouponKind, Money, PixKeyType, PixPaymentRequest, PricingPolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Merchant
// =============================================================================

/// The receiving account printed into every BR Code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub pix_key: String,

    #[serde(default = "default_key_type")]
    pub pix_key_type: PixKeyType,
}

fn default_key_type() -> PixKeyType {
    PixKeyType::Email
}

impl Default for MerchantConfig {
    fn default() -> Self {
        MerchantConfig {
            name: String::new(),
            city: String::new(),
            pix_key: String::new(),
            pix_key_type: default_key_type(),
        }
    }
}

// =============================================================================
// PIX
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixSettings {
    /// Append the CRC16 trailer (field `63`).
    #[serde(default = "default_true")]
    pub append_crc: bool,

    /// Timeout handed to the payment-status source.
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_status_timeout() -> u64 {
    30
}

impl Default for PixSettings {
    fn default() -> Self {
        PixSettings {
            append_crc: default_true(),
            status_timeout_secs: default_status_timeout(),
        }
    }
}

impl PixSettings {
    pub fn codec_config(&self) -> PixCodecConfig {
        PixCodecConfig {
            append_crc: self.append_crc,
        }
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

// =============================================================================
// Loyalty
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltySettings {
    /// Value of one redeemed point, in centavos.
    #[serde(default = "default_point_value")]
    pub point_value_cents: i64,

    /// Spend, in centavos, that earns one point.
    #[serde(default = "default_accrual_step")]
    pub accrual_step_cents: i64,
}

fn default_point_value() -> i64 {
    1
}

fn default_accrual_step() -> i64 {
    1000
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            point_value_cents: default_point_value(),
            accrual_step_cents: default_accrual_step(),
        }
    }
}

impl LoyaltySettings {
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            loyalty_point_value: Money::from_cents(self.point_value_cents),
            loyalty_accrual_step: Money::from_cents(self.accrual_step_cents),
        }
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// A store-specific coupon layered over the built-in codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponEntry {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponSettings {
    #[serde(default)]
    pub extras: Vec<CouponEntry>,
}

// =============================================================================
// Checkout Config
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub merchant: MerchantConfig,

    #[serde(default)]
    pub pix: PixSettings,

    #[serde(default)]
    pub loyalty: LoyaltySettings,

    #[serde(default)]
    pub coupons: CouponSettings,
}

impl CheckoutConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`CheckoutConfig::load`] with a custom variable lookup instead of the
    /// process environment.
    pub fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> CheckoutResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(lookup);
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.merchant.name.trim().is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "merchant.name is required".into(),
            ));
        }

        if self.merchant.city.trim().is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "merchant.city is required".into(),
            ));
        }

        check_pix_key(&self.merchant.pix_key, self.merchant.pix_key_type)
            .map_err(|e| CheckoutError::InvalidConfig(format!("merchant.pix_key: {}", e)))?;

        // Field 26 carries key and city together and is capped at 99 bytes.
        let request = PixPaymentRequest::new(
            self.merchant.pix_key.clone(),
            self.merchant.pix_key_type,
            self.merchant.name.clone(),
            self.merchant.city.clone(),
        );
        PixCodec::new(self.pix.codec_config())
            .build_payload(&request)
            .map_err(|e| {
                CheckoutError::InvalidConfig(format!(
                    "merchant does not fit in a BR Code: {}",
                    e
                ))
            })?;

        if self.pix.status_timeout_secs == 0 {
            return Err(CheckoutError::InvalidConfig(
                "pix.status_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.loyalty.point_value_cents < 0 || self.loyalty.accrual_step_cents < 0 {
            return Err(CheckoutError::InvalidConfig(
                "loyalty values must not be negative".into(),
            ));
        }

        self.extra_coupons()?;

        Ok(())
    }

    /// Applies `CAIXA_*` overrides, reading variables through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("CAIXA_MERCHANT_NAME") {
            debug!(name = %name, "Overriding merchant name from environment");
            self.merchant.name = name;
        }

        if let Some(city) = lookup("CAIXA_MERCHANT_CITY") {
            self.merchant.city = city;
        }

        if let Some(key) = lookup("CAIXA_PIX_KEY") {
            debug!("Overriding PIX key from environment");
            self.merchant.pix_key = key;
        }

        if let Some(kind) = lookup("CAIXA_PIX_KEY_TYPE") {
            match kind.parse::<PixKeyType>() {
                Ok(parsed) => self.merchant.pix_key_type = parsed,
                Err(_) => warn!(key_type = %kind, "Unknown PIX key type in environment"),
            }
        }

        if let Some(flag) = lookup("CAIXA_PIX_APPEND_CRC") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.pix.append_crc = true,
                "0" | "false" | "no" => self.pix.append_crc = false,
                _ => warn!(value = %flag, "Unrecognized CAIXA_PIX_APPEND_CRC value"),
            }
        }
    }

    /// Configured extra coupons, normalized and range-checked.
    pub fn extra_coupons(&self) -> CheckoutResult<Vec<Coupon>> {
        self.coupons
            .extras
            .iter()
            .map(|e| {
                Coupon::new(&e.code, e.kind, e.value).map_err(|err| {
                    CheckoutError::InvalidConfig(format!("coupon '{}': {}", e.code, err))
                })
            })
            .collect()
    }

    /// Extra coupons layered over the built-in catalog.
    pub fn coupon_catalog(&self) -> CheckoutResult<LayeredCatalog> {
        Ok(LayeredCatalog::over_builtins(self.extra_coupons()?))
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br", "caixa", "caixa-pos")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }
}
