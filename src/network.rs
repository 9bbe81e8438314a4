//! Target network definition.
//!
//! The hex id is always derived from the numeric id, so the two can never
//! drift apart. Chain ids coming back from a provider are decoded to `u64`
//! before any comparison.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

pub const OPEN_CAMPUS_CODEX_CHAIN_ID: u64 = 656_476;
pub const OPEN_CAMPUS_CODEX_NAME: &str = "Open Campus Codex";
pub const OPEN_CAMPUS_CODEX_RPC_URL: &str = "https://rpc.open-campus-codex.gelato.digital";
pub const OPEN_CAMPUS_CODEX_EXPLORER_URL: &str = "https://opencampus-codex.blockscout.com";

static OPEN_CAMPUS_CODEX: LazyLock<NetworkDescriptor> = LazyLock::new(|| {
    NetworkDescriptor::new(
        OPEN_CAMPUS_CODEX_CHAIN_ID,
        OPEN_CAMPUS_CODEX_NAME,
        NativeCurrency::new("EDU", "EDU", 18),
        OPEN_CAMPUS_CODEX_RPC_URL,
        OPEN_CAMPUS_CODEX_EXPLORER_URL,
    )
});

/// Native gas currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Immutable definition of the chain a session is pinned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    numeric_id: u64,
    hex_id: String,
    name: String,
    native_currency: NativeCurrency,
    rpc_url: String,
    explorer_url: String,
}

impl NetworkDescriptor {
    pub fn new(
        numeric_id: u64,
        name: impl Into<String>,
        native_currency: NativeCurrency,
        rpc_url: impl Into<String>,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            numeric_id,
            hex_id: encode_chain_id(numeric_id),
            name: name.into(),
            native_currency,
            rpc_url: rpc_url.into(),
            explorer_url: explorer_url.into(),
        }
    }

    /// The Open Campus Codex network (chain id 656476).
    pub fn open_campus_codex() -> &'static NetworkDescriptor {
        &OPEN_CAMPUS_CODEX
    }

    pub fn numeric_id(&self) -> u64 {
        self.numeric_id
    }

    pub fn hex_id(&self) -> &str {
        &self.hex_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native_currency(&self) -> &NativeCurrency {
        &self.native_currency
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    /// True when a provider-reported chain id refers to this network.
    pub fn matches(&self, chain_id: u64) -> bool {
        chain_id == self.numeric_id
    }

    /// Parameter object for `wallet_switchEthereumChain`.
    pub fn switch_params(&self) -> SwitchChainParameter {
        SwitchChainParameter {
            chain_id: self.hex_id.clone(),
        }
    }

    /// Parameter object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> AddChainParameter {
        AddChainParameter {
            chain_id: self.hex_id.clone(),
            chain_name: self.name.clone(),
            native_currency: self.native_currency.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: vec![self.explorer_url.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParameter {
    pub chain_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

/// Canonical hex form: lowercase, `0x`-prefixed, no leading zeros.
pub fn encode_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

/// Decode a provider chain id. Accepts either case and an optional `0x`
/// prefix. Zero is rejected since it doubles as the "unknown" sentinel.
pub fn decode_chain_id(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err("chain id is empty".to_string());
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("chain id '{trimmed}' is not valid hex"));
    }
    let chain_id = u64::from_str_radix(digits, 16)
        .map_err(|e| format!("chain id '{trimmed}' is out of range: {e}"))?;
    if chain_id == 0 {
        return Err("chain id 0 is not a valid network".to_string());
    }
    Ok(chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn codex_hex_id_is_derived_from_numeric_id() {
        let codex = NetworkDescriptor::open_campus_codex();
        assert_eq!(codex.numeric_id(), 656_476);
        assert_eq!(codex.hex_id(), "0xa045c");
        assert_eq!(decode_chain_id(codex.hex_id()), Ok(656_476));
    }

    #[test]
    fn decode_normalizes_case_and_prefix() {
        assert_eq!(decode_chain_id("0xA045C"), Ok(656_476));
        assert_eq!(decode_chain_id("0XA045c"), Ok(656_476));
        assert_eq!(decode_chain_id("a045c"), Ok(656_476));
        assert_eq!(decode_chain_id(" 0x1 "), Ok(1));
    }

    #[test]
    fn decode_rejects_garbage_and_sentinel() {
        assert!(decode_chain_id("").is_err());
        assert!(decode_chain_id("0x").is_err());
        assert!(decode_chain_id("0xzz").is_err());
        assert!(decode_chain_id("0x0").is_err());
        assert!(decode_chain_id("0x1ffffffffffffffff").is_err());
        assert!(decode_chain_id("0x+a045c").is_err());
        assert!(decode_chain_id("+1").is_err());
        assert!(decode_chain_id("0x-1").is_err());
    }

    #[test]
    fn transposed_hex_is_a_different_chain() {
        // 0xa02bc is 656060, not the Codex id.
        let codex = NetworkDescriptor::open_campus_codex();
        assert_eq!(decode_chain_id("0xA02BC"), Ok(656_060));
        assert!(!codex.matches(656_060));
    }

    #[test]
    fn add_chain_params_use_provider_field_names() {
        let params = NetworkDescriptor::open_campus_codex().add_chain_params();
        let value = serde_json::to_value(&params).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "chainId": "0xa045c",
                "chainName": "Open Campus Codex",
                "nativeCurrency": {"name": "EDU", "symbol": "EDU", "decimals": 18},
                "rpcUrls": ["https://rpc.open-campus-codex.gelato.digital"],
                "blockExplorerUrls": ["https://opencampus-codex.blockscout.com"],
            })
        );
    }

    #[test]
    fn matches_compares_numerically() {
        let codex = NetworkDescriptor::open_campus_codex();
        assert!(codex.matches(decode_chain_id("0xA045C").expect("decode")));
        assert!(!codex.matches(1));
    }
}
