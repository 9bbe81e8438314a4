//! Observable session state.
//!
//! Every write replaces whole fields inside one `watch` update, so an
//! observer never sees an address without the matching connected flag.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_connected: bool,
    pub address: String,
    /// `0` means the chain was never queried.
    pub chain_id: u64,
}

/// Shared handle to the session state. Clones point at the same state.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that wakes on every effective change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_connected
    }

    pub fn address(&self) -> String {
        self.tx.borrow().address.clone()
    }

    pub fn chain_id(&self) -> u64 {
        self.tx.borrow().chain_id
    }

    /// Mark connected with `address`. An empty address clears the account
    /// instead, so `is_connected` never pairs with an empty address.
    pub fn set_account(&self, address: &str) {
        if address.is_empty() {
            self.clear_account();
            return;
        }
        self.tx.send_if_modified(|state| {
            if state.is_connected && state.address == address {
                return false;
            }
            state.is_connected = true;
            state.address = address.to_string();
            true
        });
    }

    /// Apply a provider account list: the first entry becomes the active
    /// account, an empty list disconnects.
    pub fn apply_accounts(&self, accounts: &[String]) {
        match accounts.first() {
            Some(primary) => self.set_account(primary),
            None => self.clear_account(),
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.tx.send_if_modified(|state| {
            if state.chain_id == chain_id {
                return false;
            }
            state.chain_id = chain_id;
            true
        });
    }

    /// Drop the account and leave the chain id alone. No-op when already
    /// disconnected.
    pub fn clear_account(&self) {
        self.tx.send_if_modified(|state| {
            if !state.is_connected && state.address.is_empty() {
                return false;
            }
            state.is_connected = false;
            state.address.clear();
            true
        });
    }

    /// Back to the freshly-mounted state.
    pub fn reset(&self) {
        self.tx.send_if_modified(|state| {
            if *state == SessionSnapshot::default() {
                return false;
            }
            *state = SessionSnapshot::default();
            true
        });
    }
}
