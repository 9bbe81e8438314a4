//! Error types for codexlink.

use serde::Serialize;

/// Provider code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Provider code for "unrecognized chain id".
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Raw rejection as handed back by an injected provider.
///
/// Providers are free to omit `code`; the gateway decodes this into a
/// [`ProviderError`] and nothing downstream looks at the raw shape.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct ProviderRejection {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderRejection {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    /// A rejection without a numeric code (transport or host failure).
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }
}

/// Decoded provider failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no wallet provider is installed")]
    Unavailable,

    #[error("user rejected the request: {message}")]
    UserRejected { message: String },

    #[error("chain is not recognized by the provider: {message}")]
    ChainUnrecognized { message: String },

    #[error("provider returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("provider transport failure: {message}")]
    Transport { message: String },

    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl ProviderError {
    /// Numeric provider code, if the failure carried one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected { .. } => Some(USER_REJECTED_CODE),
            Self::ChainUnrecognized { .. } => Some(UNRECOGNIZED_CHAIN_CODE),
            Self::Rpc { code, .. } => Some(*code),
            Self::Unavailable | Self::Transport { .. } | Self::InvalidResponse { .. } => None,
        }
    }
}

/// Decode by code only. Message text is carried along for diagnostics.
impl From<ProviderRejection> for ProviderError {
    fn from(rejection: ProviderRejection) -> Self {
        match rejection.code {
            Some(USER_REJECTED_CODE) => Self::UserRejected {
                message: rejection.message,
            },
            Some(UNRECOGNIZED_CHAIN_CODE) => Self::ChainUnrecognized {
                message: rejection.message,
            },
            Some(code) => Self::Rpc {
                code,
                message: rejection.message,
            },
            None => Self::Transport {
                message: rejection.message,
            },
        }
    }
}

/// Terminal failure of one `connect()` invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("no wallet provider is installed")]
    ProviderUnavailable,

    #[error("user declined the connection request")]
    UserRejected,

    #[error("no account was authorized by the wallet")]
    NoAuthorizedAccount,

    #[error("target network could not be added: {0}")]
    ChainAddFailed(#[source] ProviderError),

    #[error("wallet provider failed: {0}")]
    UnknownProviderError(#[source] ProviderError),
}

impl ConnectError {
    /// Whether the user can reasonably retry the same `connect()` call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UserRejected | Self::NoAuthorizedAccount)
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ProviderUnavailable => FailureKind::ProviderUnavailable,
            Self::UserRejected => FailureKind::UserRejected,
            Self::NoAuthorizedAccount => FailureKind::NoAuthorizedAccount,
            Self::ChainAddFailed(_) => FailureKind::ChainAddFailed,
            Self::UnknownProviderError(_) => FailureKind::UnknownProviderError,
        }
    }
}

/// Fieldless mirror of [`ConnectError`] for state reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ProviderUnavailable,
    UserRejected,
    NoAuthorizedAccount,
    ChainAddFailed,
    UnknownProviderError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "provider_unavailable",
            Self::UserRejected => "user_rejected",
            Self::NoAuthorizedAccount => "no_authorized_account",
            Self::ChainAddFailed => "chain_add_failed",
            Self::UnknownProviderError => "unknown_provider_error",
        }
    }
}

/// Persona completion errors. Never surfaced from `generate`, which falls
/// back to a template; kept for logging and for direct completion calls.
#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("no completion API key configured")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}
