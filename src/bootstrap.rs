//! Bootstrap helpers for codexlink.
//!
//! Env vars can live in `./.env` or in `~/.codexlink/.env` (standard dotenvy
//! format). Both are loaded before [`crate::config::Config::from_env`].

use std::path::{Path, PathBuf};

/// Path to the codexlink-specific `.env` file: `~/.codexlink/.env`.
pub fn codexlink_env_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codexlink")
        .join(".env")
}

/// Load `./.env`, then `~/.codexlink/.env`.
///
/// dotenvy never overwrites existing env vars, so the effective priority is:
///
///   explicit env vars > `./.env` > `~/.codexlink/.env`
pub fn load_codexlink_env() {
    let _ = dotenvy::dotenv();
    load_env_file(&codexlink_env_path());
}

/// Load one env file if it exists. Returns whether it was read.
pub fn load_env_file(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match dotenvy::from_path(path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Warning: failed to load {}: {}", path.display(), e);
            false
        }
    }
}
