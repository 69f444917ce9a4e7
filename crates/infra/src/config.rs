//! Pricing configuration loaded from the environment.

use std::env::VarError;

use thiserror::Error;

use ecopricing_auth::Role;

/// Largest scale `rust_decimal` can represent.
const MAX_PRICE_SCALE: u32 = 28;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Role whose members may edit cost and channel margins by hand.
    pub pricing_role: Role,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Decimal places used when presenting derived prices.
    pub price_scale: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            pricing_role: Role::pricing_manager(),
            log_level: "info".to_string(),
            price_scale: 2,
        }
    }
}

/// Load `.env` (if present) and read the pricing configuration.
///
/// # Errors
///
/// Returns `ConfigError` when a variable is present but invalid.
pub fn load_pricing_config() -> Result<PricingConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_pricing_config(|key| std::env::var(key))
}

/// Build the configuration from an arbitrary lookup, so tests never touch the
/// process environment.
pub fn build_pricing_config<F>(lookup: F) -> Result<PricingConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(trimmed.to_string())
    };

    let pricing_role = Role::new(non_empty("ECOPRICING_PRICING_ROLE", Role::PRICING_MANAGER)?);
    let log_level = non_empty("ECOPRICING_LOG_LEVEL", "info")?;

    let raw_scale = or_default("ECOPRICING_PRICE_SCALE", "2");
    let price_scale = raw_scale
        .trim()
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "ECOPRICING_PRICE_SCALE".to_string(),
            reason: e.to_string(),
        })?;
    if price_scale > MAX_PRICE_SCALE {
        return Err(ConfigError::InvalidEnvVar {
            var: "ECOPRICING_PRICE_SCALE".to_string(),
            reason: format!("must be at most {MAX_PRICE_SCALE}"),
        });
    }

    Ok(PricingConfig {
        pricing_role,
        log_level,
        price_scale,
    })
}
