//! codexlink: wallet session and network provisioning for Open Campus Codex.
//!
//! The core is [`session::WalletSession`]: it negotiates a connection with an
//! injected EIP-1193 wallet provider, pins the wallet to the target
//! [`network::NetworkDescriptor`] (switching, or adding the network when the
//! wallet does not know it) and keeps local state in step with provider
//! notifications.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod persona;
pub mod probe;
pub mod provider;
pub mod session;
pub mod testing;
