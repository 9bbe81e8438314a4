//! Connect sequence and the switch-or-add network protocol.
//!
//! One `connect()` runs strictly in order: request accounts, read the chain,
//! then switch to the target network if needed. A switch rejected with 4902
//! (chain unknown to the wallet) is the only failure recovered automatically,
//! by adding the network; the wallet switches to a freshly added chain on
//! its own, so no second switch is issued.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{ConnectError, FailureKind, ProviderError};
use crate::network::NetworkDescriptor;
use crate::provider::ProviderGateway;
use crate::session::state::SessionState;

/// Where the negotiator currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NegotiationState {
    Idle,
    Requesting,
    Connected { matched: bool },
    SwitchingChain,
    AddingChain,
    Failed { kind: FailureKind },
}

impl NegotiationState {
    /// Terminal states hand control back to the caller.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Connected { matched: true } | Self::Failed { .. }
        )
    }
}

/// What had to be done to land on the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAction {
    AlreadyOnTarget,
    Switched,
    Added,
}

/// Result of a successful `connect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOutcome {
    pub address: String,
    pub chain_id: u64,
    pub network_action: NetworkAction,
}

/// Drives the connect state machine against one target network.
///
/// Overlapping `connect()` calls on the same negotiator are not serialized;
/// callers should wait for one to finish before starting another.
#[derive(Debug, Clone)]
pub struct ConnectionNegotiator {
    gateway: ProviderGateway,
    network: Arc<NetworkDescriptor>,
    session: SessionState,
    state: Arc<watch::Sender<NegotiationState>>,
}

impl ConnectionNegotiator {
    pub fn new(
        gateway: ProviderGateway,
        network: Arc<NetworkDescriptor>,
        session: SessionState,
    ) -> Self {
        let (state, _rx) = watch::channel(NegotiationState::Idle);
        Self {
            gateway,
            network,
            session,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> NegotiationState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<NegotiationState> {
        self.state.subscribe()
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Run one negotiation. Re-entrant from any terminal state.
    pub async fn connect(&self) -> Result<ConnectOutcome, ConnectError> {
        match self.negotiate().await {
            Ok(outcome) => {
                tracing::info!(
                    address = %outcome.address,
                    chain_id = outcome.chain_id,
                    action = ?outcome.network_action,
                    "wallet connected on {}",
                    self.network.name()
                );
                Ok(outcome)
            }
            Err(error) => {
                self.transition(NegotiationState::Failed { kind: error.kind() });
                if error.is_recoverable() {
                    tracing::warn!(kind = error.kind().as_str(), "connect failed: {error}");
                } else {
                    tracing::error!(kind = error.kind().as_str(), "connect failed: {error}");
                }
                Err(error)
            }
        }
    }

    async fn negotiate(&self) -> Result<ConnectOutcome, ConnectError> {
        if !self.gateway.is_available() {
            return Err(ConnectError::ProviderUnavailable);
        }

        self.transition(NegotiationState::Requesting);
        let accounts = self
            .gateway
            .request_accounts()
            .await
            .map_err(classify_request_error)?;
        tracing::debug!(count = accounts.len(), "accounts received");

        // Index 0 is the wallet's selected account by provider convention.
        let address = accounts
            .into_iter()
            .next()
            .filter(|address| !address.is_empty())
            .ok_or(ConnectError::NoAuthorizedAccount)?;
        self.session.set_account(&address);

        let chain_id = self
            .gateway
            .chain_id()
            .await
            .map_err(ConnectError::UnknownProviderError)?;
        self.session.set_chain_id(chain_id);
        tracing::debug!(chain_id, "current chain");

        if self.network.matches(chain_id) {
            self.transition(NegotiationState::Connected { matched: true });
            return Ok(ConnectOutcome {
                address,
                chain_id,
                network_action: NetworkAction::AlreadyOnTarget,
            });
        }

        self.transition(NegotiationState::Connected { matched: false });
        let network_action = self.provision_network().await?;
        self.session.set_chain_id(self.network.numeric_id());
        self.transition(NegotiationState::Connected { matched: true });

        Ok(ConnectOutcome {
            address,
            chain_id: self.network.numeric_id(),
            network_action,
        })
    }

    async fn provision_network(&self) -> Result<NetworkAction, ConnectError> {
        self.transition(NegotiationState::SwitchingChain);
        tracing::info!(chain_id = self.network.hex_id(), "switching to {}", self.network.name());

        match self.gateway.switch_chain(&self.network).await {
            Ok(()) => Ok(NetworkAction::Switched),
            Err(ProviderError::ChainUnrecognized { .. }) => {
                self.transition(NegotiationState::AddingChain);
                tracing::info!("{} unknown to wallet, adding it", self.network.name());
                self.gateway
                    .add_chain(&self.network)
                    .await
                    .map_err(ConnectError::ChainAddFailed)?;
                Ok(NetworkAction::Added)
            }
            Err(ProviderError::UserRejected { .. }) => Err(ConnectError::UserRejected),
            Err(other) => Err(ConnectError::UnknownProviderError(other)),
        }
    }

    fn transition(&self, next: NegotiationState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "negotiation transition");
        }
    }
}

fn classify_request_error(error: ProviderError) -> ConnectError {
    match error {
        ProviderError::UserRejected { .. } => ConnectError::UserRejected,
        ProviderError::Unavailable => ConnectError::ProviderUnavailable,
        other => ConnectError::UnknownProviderError(other),
    }
}
