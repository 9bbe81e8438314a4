//! RPC endpoint probe for the target network.
//!
//! Asks the descriptor's RPC endpoint for `eth_chainId` and checks it against
//! the descriptor's numeric id, so a misconfigured network definition is
//! caught before a wallet is asked to add it.

use std::error::Error as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::network::{NetworkDescriptor, decode_chain_id};

/// Typed probe outcome for operator surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcProbeState {
    Matched,
    Mismatched,
    InvalidUrl,
    Timeout,
    ConnectFailure,
    HttpFailure,
    InvalidResponse,
}

impl RpcProbeState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Mismatched => "mismatched",
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::ConnectFailure => "connect_failure",
            Self::HttpFailure => "http_failure",
            Self::InvalidResponse => "invalid_response",
        }
    }

    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// Probe result for one RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcProbe {
    pub url: String,
    pub state: RpcProbeState,
    pub detail: String,
    pub reported_chain_id: Option<u64>,
    pub http_status: Option<u16>,
}

impl RpcProbe {
    fn failed(url: &str, state: RpcProbeState, detail: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            state,
            detail: detail.into(),
            reported_chain_id: None,
            http_status: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.state.is_healthy()
    }
}

/// Probe the network's RPC endpoint with a JSON-RPC `eth_chainId` call.
pub async fn probe_rpc_endpoint(network: &NetworkDescriptor, timeout: Duration) -> RpcProbe {
    let url = network.rpc_url();
    if reqwest::Url::parse(url).is_err() {
        return RpcProbe::failed(url, RpcProbeState::InvalidUrl, "URL parse failed");
    }

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(error) => {
            return RpcProbe::failed(
                url,
                RpcProbeState::ConnectFailure,
                format!("HTTP client init failed: {error}"),
            );
        }
    };

    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": []});
    let response = match client.post(url).json(&body).send().await {
        Ok(response) => response,
        Err(error) => {
            return RpcProbe::failed(url, classify_transport_error(&error), error.to_string());
        }
    };

    let status = response.status();
    if !status.is_success() {
        return RpcProbe {
            http_status: Some(status.as_u16()),
            ..RpcProbe::failed(
                url,
                RpcProbeState::HttpFailure,
                format!("HTTP {}", status.as_u16()),
            )
        };
    }

    let payload: Value = match response.json().await {
        Ok(payload) => payload,
        Err(error) => {
            return RpcProbe::failed(
                url,
                RpcProbeState::InvalidResponse,
                format!("response is not JSON: {error}"),
            );
        }
    };

    let mut probe = classify_chain_id_payload(network, &payload, url);
    probe.http_status = Some(status.as_u16());
    probe
}

fn classify_chain_id_payload(network: &NetworkDescriptor, payload: &Value, url: &str) -> RpcProbe {
    if let Some(error) = payload.get("error") {
        return RpcProbe::failed(
            url,
            RpcProbeState::InvalidResponse,
            format!("JSON-RPC error: {error}"),
        );
    }

    let Some(raw) = payload.get("result").and_then(Value::as_str) else {
        return RpcProbe::failed(
            url,
            RpcProbeState::InvalidResponse,
            "missing string result",
        );
    };

    match decode_chain_id(raw) {
        Ok(chain_id) if network.matches(chain_id) => RpcProbe {
            url: url.to_string(),
            state: RpcProbeState::Matched,
            detail: format!("chain id {chain_id} ({raw})"),
            reported_chain_id: Some(chain_id),
            http_status: None,
        },
        Ok(chain_id) => RpcProbe {
            url: url.to_string(),
            state: RpcProbeState::Mismatched,
            detail: format!(
                "endpoint reports chain id {chain_id}, expected {}",
                network.numeric_id()
            ),
            reported_chain_id: Some(chain_id),
            http_status: None,
        },
        Err(reason) => RpcProbe::failed(url, RpcProbeState::InvalidResponse, reason),
    }
}

fn classify_transport_error(error: &reqwest::Error) -> RpcProbeState {
    if error.is_timeout() {
        return RpcProbeState::Timeout;
    }

    let mut source = error.source();
    while let Some(err) = source {
        if err.downcast_ref::<std::io::Error>().is_some() {
            return RpcProbeState::ConnectFailure;
        }
        source = err.source();
    }

    if error.is_connect() {
        RpcProbeState::ConnectFailure
    } else {
        RpcProbeState::HttpFailure
    }
}
