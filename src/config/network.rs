use std::sync::Arc;

use crate::config::helpers::{optional_env, parse_optional_env, validate_http_url};
use crate::error::ConfigError;
use crate::network::{NativeCurrency, NetworkDescriptor};

/// Largest decimals value accepted for a native currency.
const MAX_CURRENCY_DECIMALS: u8 = 36;

/// Target network resolved from `CODEX_*` env vars over the Open Campus
/// Codex defaults.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub descriptor: Arc<NetworkDescriptor>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            descriptor: Arc::new(NetworkDescriptor::open_campus_codex().clone()),
        }
    }
}

impl NetworkConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = NetworkDescriptor::open_campus_codex();

        let chain_id = parse_optional_env::<u64>("CODEX_CHAIN_ID", "a positive integer")?
            .unwrap_or(defaults.numeric_id());
        if chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CODEX_CHAIN_ID".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let name = optional_env("CODEX_CHAIN_NAME")?.unwrap_or_else(|| defaults.name().to_string());

        let rpc_url =
            optional_env("CODEX_RPC_URL")?.unwrap_or_else(|| defaults.rpc_url().to_string());
        validate_http_url("CODEX_RPC_URL", &rpc_url)?;

        let explorer_url = optional_env("CODEX_EXPLORER_URL")?
            .unwrap_or_else(|| defaults.explorer_url().to_string());
        validate_http_url("CODEX_EXPLORER_URL", &explorer_url)?;

        let currency = defaults.native_currency();
        let currency_name =
            optional_env("CODEX_CURRENCY_NAME")?.unwrap_or_else(|| currency.name.clone());
        let currency_symbol =
            optional_env("CODEX_CURRENCY_SYMBOL")?.unwrap_or_else(|| currency.symbol.clone());
        let decimals = parse_optional_env::<u8>("CODEX_CURRENCY_DECIMALS", "an integer 0-36")?
            .unwrap_or(currency.decimals);
        if decimals > MAX_CURRENCY_DECIMALS {
            return Err(ConfigError::InvalidValue {
                key: "CODEX_CURRENCY_DECIMALS".to_string(),
                message: format!("must be <= {MAX_CURRENCY_DECIMALS}, got {decimals}"),
            });
        }

        Ok(Self {
            descriptor: Arc::new(NetworkDescriptor::new(
                chain_id,
                name,
                NativeCurrency::new(currency_name, currency_symbol, decimals),
                rpc_url,
                explorer_url,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;

    const KEYS: &[&str] = &[
        "CODEX_CHAIN_ID",
        "CODEX_CHAIN_NAME",
        "CODEX_RPC_URL",
        "CODEX_EXPLORER_URL",
        "CODEX_CURRENCY_NAME",
        "CODEX_CURRENCY_SYMBOL",
        "CODEX_CURRENCY_DECIMALS",
    ];

    fn clear_network_env() {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            for key in KEYS {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_to_open_campus_codex() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_network_env();

        let cfg = NetworkConfig::resolve().expect("resolve");
        assert_eq!(&*cfg.descriptor, NetworkDescriptor::open_campus_codex());
    }

    #[test]
    fn overrides_keep_hex_id_in_sync() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_network_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CODEX_CHAIN_ID", "656476");
            std::env::set_var("CODEX_CHAIN_NAME", "\"Codex Staging\"");
            std::env::set_var("CODEX_RPC_URL", "http://localhost:8545");
        }

        let cfg = NetworkConfig::resolve().expect("resolve");
        assert_eq!(cfg.descriptor.hex_id(), "0xa045c");
        assert_eq!(cfg.descriptor.name(), "Codex Staging");
        assert_eq!(cfg.descriptor.rpc_url(), "http://localhost:8545");

        clear_network_env();
    }

    #[test]
    fn rejects_zero_chain_id_and_bad_urls() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_network_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CODEX_CHAIN_ID", "0");
        }
        assert!(matches!(
            NetworkConfig::resolve(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "CODEX_CHAIN_ID"
        ));

        clear_network_env();
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CODEX_EXPLORER_URL", "blockscout");
        }
        assert!(NetworkConfig::resolve().is_err());

        clear_network_env();
    }

    #[test]
    fn currency_decimals_are_bounded() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_network_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CODEX_CURRENCY_DECIMALS", "37");
        }
        assert!(matches!(
            NetworkConfig::resolve(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "CODEX_CURRENCY_DECIMALS"
        ));

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CODEX_CURRENCY_DECIMALS", "36");
        }
        let cfg = NetworkConfig::resolve().expect("resolve");
        assert_eq!(cfg.descriptor.native_currency().decimals, 36);

        clear_network_env();
    }
}
