//! # Checkout Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │      Core       │  │        Session          │ │
//! │  │  ─────────────  │  │  ─────────────  │  │  ─────────────────────  │ │
//! │  │  InvalidConfig  │  │  CoreError      │  │  EmptyCart              │ │
//! │  │  ConfigLoad     │  │  (cart, PIX,    │  │                         │ │
//! │  │  ConfigSave     │  │   QR, status)   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caixa_core::CoreError;
use thiserror::Error;

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[derive(Debug, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration values are inconsistent.
    #[error("Invalid checkout configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config file could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Finalize was called with nothing in the cart.
    #[error("Cannot finalize an empty cart")]
    EmptyCart,

    /// The sale was fully discounted, so no PIX charge exists.
    #[error("Sale {transaction_id} has nothing to charge")]
    NothingToCharge { transaction_id: String },

    // =========================================================================
    // Core Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::ConfigSaveFailed(err.to_string())
    }
}

impl CheckoutError {
    /// True if this error points at the register's configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CheckoutError::InvalidConfig(_)
                | CheckoutError::ConfigLoadFailed(_)
                | CheckoutError::ConfigSaveFailed(_)
        )
    }
}
