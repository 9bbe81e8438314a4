//! Injected wallet provider seam and the gateway that talks to it.
//!
//! [`Eip1193Provider`] is the capability object handed in by the host
//! (a browser bridge, or [`crate::testing::FakeProvider`] in tests). The
//! [`ProviderGateway`] is the only code that calls it: it checks presence,
//! issues typed requests and decodes raw rejections into [`ProviderError`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, ProviderRejection};
use crate::network::{NetworkDescriptor, decode_chain_id};

/// Request methods of the provider contract used by the session core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderMethod {
    RequestAccounts,
    Accounts,
    ChainId,
    SwitchEthereumChain,
    AddEthereumChain,
}

impl ProviderMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Accounts => "eth_accounts",
            Self::ChainId => "eth_chainId",
            Self::SwitchEthereumChain => "wallet_switchEthereumChain",
            Self::AddEthereumChain => "wallet_addEthereumChain",
        }
    }

    /// Whether the call may put a permission prompt in front of the user.
    pub fn is_prompting(self) -> bool {
        matches!(
            self,
            Self::RequestAccounts | Self::SwitchEthereumChain | Self::AddEthereumChain
        )
    }
}

/// Provider-originated notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
        }
    }
}

/// A notification together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Ordered account list; index 0 is the selected account.
    AccountsChanged(Vec<String>),
    /// New chain id as the provider transmits it (hex string).
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            Self::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            Self::ChainChanged(_) => ProviderEventKind::ChainChanged,
        }
    }
}

/// Callback registered against a provider event.
pub type EventCallback = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Handle returned by [`Eip1193Provider::on`], used to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// EIP-1193 request/event surface of an injected wallet.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Forward one request. Exactly one attempt; no retries.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRejection>;

    /// Register a callback for `event`.
    fn on(&self, event: ProviderEventKind, callback: EventCallback) -> ListenerId;

    /// Remove a callback registered with [`Eip1193Provider::on`]. Returns
    /// false if it was not registered.
    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool;
}

/// A live registration on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub event: ProviderEventKind,
    pub id: ListenerId,
}

/// Presence check and typed request dispatch over an optional provider.
#[derive(Clone, Default)]
pub struct ProviderGateway {
    provider: Option<Arc<dyn Eip1193Provider>>,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("available", &self.is_available())
            .finish()
    }
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn Eip1193Provider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Gateway for an environment with no injected wallet.
    pub fn absent() -> Self {
        Self { provider: None }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Forward a raw request. Fails with [`ProviderError::Unavailable`]
    /// without any call when no provider is injected.
    pub async fn request(
        &self,
        method: ProviderMethod,
        params: Value,
    ) -> Result<Value, ProviderError> {
        let Some(provider) = self.provider.as_ref() else {
            return Err(ProviderError::Unavailable);
        };
        if method.is_prompting() {
            tracing::info!(method = method.as_str(), "waiting for wallet confirmation");
        } else {
            tracing::debug!(method = method.as_str(), "provider request");
        }
        match provider.request(method.as_str(), params).await {
            Ok(value) => Ok(value),
            Err(rejection) => {
                let error = ProviderError::from(rejection);
                tracing::debug!(method = method.as_str(), code = ?error.code(), "provider rejected request");
                Err(error)
            }
        }
    }

    /// `eth_requestAccounts`: may prompt the user.
    pub async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let value = self
            .request(ProviderMethod::RequestAccounts, Value::Array(Vec::new()))
            .await?;
        parse_accounts(ProviderMethod::RequestAccounts, value)
    }

    /// `eth_accounts`: silent, never prompts.
    pub async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
        let value = self
            .request(ProviderMethod::Accounts, Value::Array(Vec::new()))
            .await?;
        parse_accounts(ProviderMethod::Accounts, value)
    }

    /// `eth_chainId`, decoded to a number.
    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let value = self
            .request(ProviderMethod::ChainId, Value::Array(Vec::new()))
            .await?;
        let raw = value
            .as_str()
            .ok_or_else(|| invalid_response(ProviderMethod::ChainId, "expected a hex string"))?;
        decode_chain_id(raw).map_err(|reason| invalid_response(ProviderMethod::ChainId, reason))
    }

    /// `wallet_switchEthereumChain` to the descriptor's hex id.
    pub async fn switch_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        let params = serde_json::to_value([network.switch_params()])
            .map_err(|e| invalid_response(ProviderMethod::SwitchEthereumChain, e.to_string()))?;
        self.request(ProviderMethod::SwitchEthereumChain, params)
            .await
            .map(|_| ())
    }

    /// `wallet_addEthereumChain` with the full descriptor.
    pub async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        let params = serde_json::to_value([network.add_chain_params()])
            .map_err(|e| invalid_response(ProviderMethod::AddEthereumChain, e.to_string()))?;
        self.request(ProviderMethod::AddEthereumChain, params)
            .await
            .map(|_| ())
    }

    /// Register `callback`. `None` when no provider is injected.
    pub fn subscribe(
        &self,
        event: ProviderEventKind,
        callback: EventCallback,
    ) -> Option<Subscription> {
        let provider = self.provider.as_ref()?;
        let id = provider.on(event, callback);
        tracing::debug!(event = event.as_str(), id = id.0, "subscribed to provider event");
        Some(Subscription { event, id })
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        match self.provider.as_ref() {
            Some(provider) => provider.remove_listener(subscription.event, subscription.id),
            None => false,
        }
    }
}

fn invalid_response(method: ProviderMethod, reason: impl Into<String>) -> ProviderError {
    ProviderError::InvalidResponse {
        method: method.as_str().to_string(),
        reason: reason.into(),
    }
}

/// A `null` result is read as "no accounts", matching lenient providers.
fn parse_accounts(method: ProviderMethod, value: Value) -> Result<Vec<String>, ProviderError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(address) => Ok(address),
                other => Err(invalid_response(
                    method,
                    format!("account entry is not a string: {other}"),
                )),
            })
            .collect(),
        other => Err(invalid_response(
            method,
            format!("expected an account list, got {other}"),
        )),
    }
}
