//! Test doubles for the provider seam.
//!
//! [`FakeProvider`] implements [`Eip1193Provider`] with scripted responses,
//! records every request and keeps a real listener registry so tests can
//! fire notifications and check that subscriptions were released.
//!
//! ```ignore
//! let fake = Arc::new(FakeProvider::new());
//! fake.respond(ProviderMethod::RequestAccounts, Ok(json!(["0xAA"])));
//! fake.respond(ProviderMethod::ChainId, Ok(json!("0x1")));
//! fake.reject(ProviderMethod::SwitchEthereumChain, 4902, "Unrecognized chain ID");
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderRejection;
use crate::provider::{
    Eip1193Provider, EventCallback, ListenerId, ProviderEvent, ProviderEventKind, ProviderMethod,
};

type Scripted = Result<Value, ProviderRejection>;

/// In-memory provider with scripted responses.
#[derive(Default)]
pub struct FakeProvider {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<(String, Value)>>,
    listeners: Mutex<Vec<(ProviderEventKind, ListenerId, EventCallback)>>,
    next_listener: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method`. Queued responses are consumed in
    /// order; the last one keeps answering once the queue is down to it.
    /// Unscripted methods answer `null`.
    pub fn respond(&self, method: ProviderMethod, response: Scripted) {
        lock(&self.responses)
            .entry(method.as_str().to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a coded rejection for `method`.
    pub fn reject(&self, method: ProviderMethod, code: i64, message: &str) {
        self.respond(method, Err(ProviderRejection::new(code, message)));
    }

    /// Method names of every request received, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.requests)
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Every request received with its params.
    pub fn requests(&self) -> Vec<(String, Value)> {
        lock(&self.requests).clone()
    }

    pub fn count(&self, method: ProviderMethod) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|(name, _)| name == method.as_str())
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.requests).clear();
    }

    pub fn listener_count(&self, event: ProviderEventKind) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|(kind, _, _)| *kind == event)
            .count()
    }

    /// Deliver `event` to every callback registered for its kind.
    pub fn emit(&self, event: ProviderEvent) {
        let callbacks: Vec<EventCallback> = lock(&self.listeners)
            .iter()
            .filter(|(kind, _, _)| *kind == event.kind())
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(&event);
        }
    }
}

#[async_trait]
impl Eip1193Provider for FakeProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRejection> {
        lock(&self.requests).push((method.to_string(), params));
        let mut responses = lock(&self.responses);
        match responses.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Ok(Value::Null),
        }
    }

    fn on(&self, event: ProviderEventKind, callback: EventCallback) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((event, id, callback));
        id
    }

    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(kind, existing, _)| !(*kind == event && *existing == id));
        listeners.len() != before
    }
}
