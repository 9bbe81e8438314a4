//! Provider notification handling.
//!
//! The listener installs one callback per event kind for the lifetime of the
//! mounted session and folds notifications into [`SessionState`]. A chain
//! change is only recorded; switching back to the target network is left to
//! an explicit `connect()`.

use std::sync::Arc;

use crate::error::ProviderError;
use crate::network::decode_chain_id;
use crate::provider::{
    EventCallback, ProviderEvent, ProviderEventKind, ProviderGateway, Subscription,
};
use crate::session::state::SessionState;

/// Subscribes to provider notifications on behalf of a session.
#[derive(Debug, Clone)]
pub struct EventListener {
    gateway: ProviderGateway,
    session: SessionState,
}

impl EventListener {
    pub fn new(gateway: ProviderGateway, session: SessionState) -> Self {
        Self { gateway, session }
    }

    /// Subscribe, then run one silent reconciliation pass. Reconciliation
    /// failures are logged; the subscriptions stay installed either way.
    pub async fn mount(gateway: ProviderGateway, session: SessionState) -> ListenerGuard {
        let listener = Self::new(gateway, session);
        let guard = listener.install();
        if listener.gateway.is_available()
            && let Err(e) = listener.reconcile().await
        {
            tracing::warn!("failed to reconcile existing wallet session: {e}");
        }
        guard
    }

    /// Register the account and chain callbacks. The returned guard removes
    /// them when released or dropped.
    pub fn install(&self) -> ListenerGuard {
        let mut subscriptions = Vec::with_capacity(2);
        for event in [
            ProviderEventKind::AccountsChanged,
            ProviderEventKind::ChainChanged,
        ] {
            let session = self.session.clone();
            let callback: EventCallback = Arc::new(move |notification: &ProviderEvent| {
                apply_event(&session, notification);
            });
            if let Some(subscription) = self.gateway.subscribe(event, callback) {
                subscriptions.push(subscription);
            }
        }
        if subscriptions.is_empty() {
            tracing::debug!("no wallet provider; event listeners not installed");
        }
        ListenerGuard {
            gateway: self.gateway.clone(),
            subscriptions,
        }
    }

    /// Pick up a session the wallet already holds. Only non-prompting reads:
    /// `eth_accounts`, then `eth_chainId` if an account is authorized.
    pub async fn reconcile(&self) -> Result<(), ProviderError> {
        let accounts = self.gateway.accounts().await?;
        let Some(primary) = accounts.first().filter(|address| !address.is_empty()) else {
            tracing::debug!("no previously authorized account");
            return Ok(());
        };
        tracing::info!(address = %primary, "found connected account");
        self.session.set_account(primary);

        let chain_id = self.gateway.chain_id().await?;
        self.session.set_chain_id(chain_id);
        tracing::debug!(chain_id, "current chain");
        Ok(())
    }
}

/// Fold one notification into the session.
pub fn apply_event(session: &SessionState, event: &ProviderEvent) {
    match event {
        ProviderEvent::AccountsChanged(accounts) => {
            tracing::info!(count = accounts.len(), "accounts changed");
            session.apply_accounts(accounts);
        }
        ProviderEvent::ChainChanged(raw) => match decode_chain_id(raw) {
            Ok(chain_id) => {
                tracing::info!(chain_id, "chain changed");
                session.set_chain_id(chain_id);
            }
            Err(reason) => {
                tracing::warn!(raw = %raw, "ignoring chain change: {reason}");
            }
        },
    }
}

/// Owns the provider subscriptions of a mounted session.
#[must_use = "dropping the guard removes the provider subscriptions"]
#[derive(Debug)]
pub struct ListenerGuard {
    gateway: ProviderGateway,
    subscriptions: Vec<Subscription>,
}

impl ListenerGuard {
    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Remove the subscriptions now.
    pub fn release(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            if !self.gateway.unsubscribe(subscription) {
                tracing::debug!(
                    event = subscription.event.as_str(),
                    "subscription already removed"
                );
            }
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderMethod;
    use crate::testing::FakeProvider;
    use serde_json::json;

    #[tokio::test]
    async fn install_registers_one_callback_per_event() {
        let fake = Arc::new(FakeProvider::new());
        let listener = EventListener::new(ProviderGateway::new(fake.clone()), SessionState::new());

        let guard = listener.install();
        assert!(guard.is_active());
        assert_eq!(fake.listener_count(ProviderEventKind::AccountsChanged), 1);
        assert_eq!(fake.listener_count(ProviderEventKind::ChainChanged), 1);

        guard.release();
        assert_eq!(fake.listener_count(ProviderEventKind::AccountsChanged), 0);
        assert_eq!(fake.listener_count(ProviderEventKind::ChainChanged), 0);
    }

    #[tokio::test]
    async fn dropping_guard_unsubscribes_on_early_exit() {
        let fake = Arc::new(FakeProvider::new());
        let listener = EventListener::new(ProviderGateway::new(fake.clone()), SessionState::new());

        let outcome: Result<(), &str> = (|| {
            let _guard = listener.install();
            Err("component failed before unmount")
        })();
        assert!(outcome.is_err());
        assert_eq!(fake.listener_count(ProviderEventKind::AccountsChanged), 0);
        assert_eq!(fake.listener_count(ProviderEventKind::ChainChanged), 0);
    }

    #[tokio::test]
    async fn reconcile_reads_chain_only_with_an_account() {
        let fake = Arc::new(FakeProvider::new());
        fake.respond(ProviderMethod::Accounts, Ok(json!([])));
        let session = SessionState::new();
        let listener = EventListener::new(ProviderGateway::new(fake.clone()), session.clone());

        listener.reconcile().await.expect("reconcile");
        assert_eq!(fake.calls(), vec!["eth_accounts".to_string()]);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn reconcile_restores_existing_session() {
        let fake = Arc::new(FakeProvider::new());
        fake.respond(ProviderMethod::Accounts, Ok(json!(["0xAA"])));
        fake.respond(ProviderMethod::ChainId, Ok(json!("0x1")));
        let session = SessionState::new();

        let _guard = EventListener::mount(ProviderGateway::new(fake.clone()), session.clone()).await;

        assert_eq!(
            fake.calls(),
            vec!["eth_accounts".to_string(), "eth_chainId".to_string()]
        );
        assert!(session.is_connected());
        assert_eq!(session.address(), "0xAA");
        assert_eq!(session.chain_id(), 1);
    }

    #[tokio::test]
    async fn reconcile_failure_keeps_listeners() {
        let fake = Arc::new(FakeProvider::new());
        fake.reject(ProviderMethod::Accounts, -32603, "Internal error");
        let session = SessionState::new();

        let guard = EventListener::mount(ProviderGateway::new(fake.clone()), session.clone()).await;
        assert!(guard.is_active());
        assert!(!session.is_connected());
    }

    #[test]
    fn chain_change_is_decoded_and_garbage_ignored() {
        let session = SessionState::new();
        apply_event(&session, &ProviderEvent::ChainChanged("0xA045C".to_string()));
        assert_eq!(session.chain_id(), 656_476);

        apply_event(&session, &ProviderEvent::ChainChanged("oops".to_string()));
        assert_eq!(session.chain_id(), 656_476);
    }

    #[test]
    fn account_change_switches_primary_address() {
        let session = SessionState::new();
        apply_event(
            &session,
            &ProviderEvent::AccountsChanged(vec!["0xCC".to_string(), "0xAA".to_string()]),
        );
        assert!(session.is_connected());
        assert_eq!(session.address(), "0xCC");
    }

    #[tokio::test]
    async fn absent_provider_installs_nothing() {
        let guard = EventListener::mount(ProviderGateway::absent(), SessionState::new()).await;
        assert!(!guard.is_active());
    }
}
