use std::str::FromStr;

use crate::error::ConfigError;

/// Read an env var, treating unset and blank the same. Surrounding quotes
/// left over from `.env` files are stripped.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => {
            let normalized = normalize_env_value(&value);
            if normalized.is_empty() {
                Ok(None)
            } else {
                Ok(Some(normalized))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

/// Read and parse an env var, naming the key in the error.
pub(crate) fn parse_optional_env<T>(key: &str, expected: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be {expected}: {e}"),
        })
}

/// Require an absolute http(s) URL.
pub(crate) fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("must be a valid URL: {e}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an http or https URL, got scheme '{other}'"),
        }),
    }
}

fn normalize_env_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let maybe_unquoted = trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    maybe_unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values_are_unquoted() {
        assert_eq!(normalize_env_value("  \"abc\" "), "abc");
        assert_eq!(normalize_env_value("'abc'"), "abc");
        assert_eq!(normalize_env_value("\"abc"), "\"abc");
    }

    #[test]
    fn urls_must_be_http() {
        assert!(validate_http_url("X", "https://rpc.example").is_ok());
        assert!(validate_http_url("X", "ws://rpc.example").is_err());
        assert!(validate_http_url("X", "not a url").is_err());
    }
}
