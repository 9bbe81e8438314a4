//! Configuration for codexlink.
//!
//! Settings are loaded with priority: env var > default. `.env` files are
//! read first by [`crate::bootstrap::load_codexlink_env`], so values there
//! behave like env vars.

pub(crate) mod helpers;
mod network;
mod persona;

use crate::error::ConfigError;

pub use self::network::NetworkConfig;
pub use self::persona::PersonaConfig;

/// Serializes tests that mutate process env vars.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Main configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub network: NetworkConfig,
    pub persona: PersonaConfig,
}

impl Config {
    /// Resolve everything from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            network: NetworkConfig::resolve()?,
            persona: PersonaConfig::resolve()?,
        })
    }
}
