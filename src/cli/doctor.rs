//! `codexlink doctor` - active health diagnostics.
//!
//! Validates configuration and probes the target network's RPC endpoint so
//! problems surface before a wallet is asked to add or switch to it. Each
//! check reports pass/fail/skip with actionable detail.

use std::time::Duration;

use crate::config::{NetworkConfig, PersonaConfig};
use crate::probe::probe_rpc_endpoint;

const RPC_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run diagnostic checks and print results. Returns the number of failures.
pub async fn run_doctor_command() -> anyhow::Result<u32> {
    println!("codexlink doctor");
    println!("================\n");

    let mut passed = 0u32;
    let mut failed = 0u32;

    let network = NetworkConfig::resolve().map_err(|e| e.to_string());
    let persona = PersonaConfig::resolve().map_err(|e| e.to_string());

    check(
        "Network configuration",
        check_network_config(&network),
        &mut passed,
        &mut failed,
    );

    check(
        "RPC endpoint chain id",
        check_rpc_endpoint(&network).await,
        &mut passed,
        &mut failed,
    );

    check(
        "Persona configuration",
        check_persona_config(&persona),
        &mut passed,
        &mut failed,
    );

    println!("\n{passed} passed, {failed} failed");
    Ok(failed)
}

fn check(name: &str, result: CheckResult, passed: &mut u32, failed: &mut u32) {
    match result {
        CheckResult::Pass(detail) => {
            *passed += 1;
            println!("  [pass] {name}: {detail}");
        }
        CheckResult::Fail(detail) => {
            *failed += 1;
            println!("  [FAIL] {name}: {detail}");
        }
        CheckResult::Skip(reason) => {
            println!("  [skip] {name}: {reason}");
        }
    }
}

enum CheckResult {
    Pass(String),
    Fail(String),
    Skip(String),
}

fn check_network_config(network: &Result<NetworkConfig, String>) -> CheckResult {
    match network {
        Ok(cfg) => CheckResult::Pass(format!(
            "{} (chain id {}, {})",
            cfg.descriptor.name(),
            cfg.descriptor.numeric_id(),
            cfg.descriptor.hex_id()
        )),
        Err(e) => CheckResult::Fail(e.clone()),
    }
}

async fn check_rpc_endpoint(network: &Result<NetworkConfig, String>) -> CheckResult {
    let cfg = match network {
        Ok(cfg) => cfg,
        Err(_) => return CheckResult::Skip("network configuration invalid".to_string()),
    };

    let probe = probe_rpc_endpoint(&cfg.descriptor, RPC_PROBE_TIMEOUT).await;
    if probe.is_healthy() {
        CheckResult::Pass(format!("{} at {}", probe.detail, probe.url))
    } else {
        CheckResult::Fail(format!(
            "{}: {} ({})",
            probe.state.as_str(),
            probe.detail,
            probe.url
        ))
    }
}

fn check_persona_config(persona: &Result<PersonaConfig, String>) -> CheckResult {
    match persona {
        Ok(cfg) if cfg.has_api_key() => {
            CheckResult::Pass(format!("model {} via {}", cfg.model, cfg.base_url))
        }
        Ok(_) => CheckResult::Skip(
            "OPENAI_API_KEY not set; persona replies use fallback templates".to_string(),
        ),
        Err(e) => CheckResult::Fail(e.clone()),
    }
}
