//! Command-line surface.

pub mod doctor;

use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::network::NetworkDescriptor;
use crate::persona::{CompletionPersona, PersonaGenerator};

#[derive(Parser, Debug)]
#[command(name = "codexlink", version, about = "Open Campus Codex wallet session tooling")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "CODEXLINK_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the target network and its `wallet_addEthereumChain` parameters.
    Network {
        /// Print machine-readable JSON only.
        #[arg(long)]
        json: bool,
    },

    /// Check configuration and probe the target network's RPC endpoint.
    Doctor,

    /// Generate an agent persona reply.
    Persona {
        /// Agent display name.
        #[arg(long)]
        agent: String,

        /// Bio line (repeatable).
        #[arg(long = "bio")]
        bio: Vec<String>,

        /// Message from the user.
        message: String,
    },
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "codexlink=warn",
        1 => "codexlink=info",
        _ => "codexlink=debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .init();
    }
}

/// Run a parsed command. Returns the process exit code.
///
/// `doctor` resolves configuration itself so invalid values are reported as
/// failed checks instead of aborting.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Network { json } => {
            let config = Config::from_env()?;
            print_network(&config.network.descriptor, json)?;
            Ok(0)
        }
        Command::Doctor => {
            let failed = doctor::run_doctor_command().await?;
            Ok(if failed == 0 { 0 } else { 1 })
        }
        Command::Persona {
            agent,
            bio,
            message,
        } => {
            let config = Config::from_env()?;
            let persona = CompletionPersona::new(config.persona, config.network.descriptor);
            println!("{}", persona.generate(&agent, &bio, &message).await);
            Ok(0)
        }
    }
}

fn print_network(network: &NetworkDescriptor, json: bool) -> anyhow::Result<()> {
    let params = serde_json::to_string_pretty(&network.add_chain_params())?;
    if json {
        println!("{params}");
        return Ok(());
    }

    let currency = network.native_currency();
    println!("{}", network.name());
    println!("  chain id:  {} ({})", network.numeric_id(), network.hex_id());
    println!(
        "  currency:  {} ({}, {} decimals)",
        currency.name, currency.symbol, currency.decimals
    );
    println!("  rpc:       {}", network.rpc_url());
    println!("  explorer:  {}", network.explorer_url());
    println!("\nwallet_addEthereumChain params:\n{params}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn persona_collects_repeated_bio_lines() {
        let cli = Cli::try_parse_from([
            "codexlink",
            "persona",
            "--agent",
            "Ada",
            "--bio",
            "Calm.",
            "--bio",
            "Precise.",
            "hello",
        ])
        .expect("parse");
        match cli.command {
            Command::Persona { agent, bio, message } => {
                assert_eq!(agent, "Ada");
                assert_eq!(bio, vec!["Calm.".to_string(), "Precise.".to_string()]);
                assert_eq!(message, "hello");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["codexlink", "network", "-vv", "--json"]).expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Network { json: true }));
    }
}
