//! Wallet session: state, connect negotiation and provider event handling.
//!
//! [`WalletSession`] is what the rest of the application mounts. It owns the
//! [`SessionState`], a [`ConnectionNegotiator`] for user-initiated connects
//! and the [`ListenerGuard`] keeping provider notifications flowing in. The
//! state is never persisted; mounting re-reads whatever the wallet holds.

mod listener;
mod negotiator;
mod state;

use std::sync::Arc;

use tokio::sync::watch;

pub use self::listener::{EventListener, ListenerGuard, apply_event};
pub use self::negotiator::{ConnectOutcome, ConnectionNegotiator, NegotiationState, NetworkAction};
pub use self::state::{SessionSnapshot, SessionState};

use crate::error::ConnectError;
use crate::network::NetworkDescriptor;
use crate::provider::ProviderGateway;

/// One mounted wallet session pinned to one target network.
#[derive(Debug)]
pub struct WalletSession {
    state: SessionState,
    negotiator: ConnectionNegotiator,
    listener: Option<ListenerGuard>,
}

impl WalletSession {
    /// Create empty state, subscribe to provider events and pick up any
    /// session the wallet already authorized. Never prompts the user.
    pub async fn mount(gateway: ProviderGateway, network: Arc<NetworkDescriptor>) -> Self {
        let state = SessionState::new();
        let negotiator = ConnectionNegotiator::new(gateway.clone(), network, state.clone());
        let listener = EventListener::mount(gateway, state.clone()).await;
        Self {
            state,
            negotiator,
            listener: Some(listener),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn address(&self) -> String {
        self.state.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.state.chain_id()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    /// Observe state changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn network(&self) -> &NetworkDescriptor {
        self.negotiator.network()
    }

    pub fn negotiation_state(&self) -> NegotiationState {
        self.negotiator.state()
    }

    /// True while the current chain id is the target network's.
    pub fn is_on_target_network(&self) -> bool {
        self.network().matches(self.chain_id())
    }

    /// Request accounts and pin the wallet to the target network.
    pub async fn connect(&self) -> Result<ConnectOutcome, ConnectError> {
        self.negotiator.connect().await
    }

    /// Forget the account locally. Wallet-side authorization is untouched
    /// and the chain id is kept.
    pub fn disconnect(&self) {
        tracing::info!("wallet disconnected locally");
        self.state.clear_account();
    }

    /// Tear down: remove provider subscriptions and reset the state.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.release();
        }
        self.state.reset();
    }
}
