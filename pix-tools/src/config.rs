//! Merchant configuration.

use std::env;

use pix_brcode::MerchantConfig;

/// Settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Receiver name, city and description used for every generated code.
    pub merchant: MerchantConfig,
    /// Prefix for generated transaction ids.
    pub txid_prefix: String,
}

impl ToolsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MerchantConfig::default();
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let merchant_name = non_blank("PIX_MERCHANT_NAME").unwrap_or(defaults.merchant_name);
        let merchant_city = non_blank("PIX_MERCHANT_CITY").unwrap_or(defaults.merchant_city);

        // Set but empty turns the description off
        let description = match lookup("PIX_DESCRIPTION") {
            Some(desc) if desc.trim().is_empty() => None,
            Some(desc) => Some(desc),
            None => defaults.description,
        };

        let txid_prefix = lookup("PIX_TXID_PREFIX").unwrap_or_default();

        Self {
            merchant: MerchantConfig {
                merchant_name,
                merchant_city,
                description,
            },
            txid_prefix,
        }
    }
}
