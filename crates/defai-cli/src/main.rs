//! DeFAI CLI - Terminal console for autonomous DeFi trading agents
//!
//! Talks to the agent backend (default: http://localhost:8002). Wallet
//! sign-in uses local keystore wallets; the session is kept in
//! `~/.defai/session.json` for seven days.
//!
//! # Quick Start
//!
//! ```bash
//! # Create a local Phantom-compatible wallet and sign in
//! defai wallet keygen --wallet phantom
//! defai wallet connect --chain solana --wallet phantom
//!
//! # Look around
//! defai dashboard
//! defai agent create
//! defai agent start <id>
//! ```

use clap::{Parser, Subcommand};
use defai_types::{Chain, LifecycleAction, WalletId};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod display;
mod form;
mod wizard;

use commands::{agent, dashboard, wallet, Console};
use config::{CliConfig, LoggingConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// DeFAI - Autonomous DeFi agents from your terminal
#[derive(Parser)]
#[command(name = "defai")]
#[command(author = "DeFAI Contributors")]
#[command(version)]
#[command(about = "Create, monitor and control autonomous DeFi trading agents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Backend URL (overrides config)
    #[arg(long, global = true, env = "DEFAI_API_URL")]
    api_url: Option<String>,

    /// Extra configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log format (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stats and agent overview
    Dashboard,

    /// Manage trading agents
    Agent {
        #[command(subcommand)]
        action: AgentCommands,
    },

    /// Connect and manage wallets
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Check backend health
    Health,
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List all agents
    List,

    /// Show one agent in detail
    Show { id: String },

    /// Create an agent (interactive unless --name and --strategy are given)
    Create(agent::CreateArgs),

    /// Update an agent's settings
    Update {
        id: String,
        #[command(flatten)]
        args: agent::UpdateArgs,
    },

    /// Delete an agent
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Start an agent
    Start { id: String },

    /// Pause a running agent
    Pause { id: String },

    /// Stop a running agent
    Stop { id: String },

    /// Recent strategy executions
    Executions { id: String },

    /// Performance history
    Performance { id: String },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// List wallets available for a chain
    List {
        #[arg(short, long, default_value = "solana")]
        chain: Chain,
    },

    /// Connect a wallet and sign in
    Connect {
        #[arg(short, long, default_value = "solana")]
        chain: Chain,

        /// phantom, metamask, coinbase, walletconnect, solflare or trust
        #[arg(short, long)]
        wallet: Option<WalletId>,
    },

    /// Sign out and forget the session
    Disconnect,

    /// Show the connected wallet and balance
    Status,

    /// Create a local keystore wallet
    Keygen {
        #[arg(short, long)]
        wallet: WalletId,
    },
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        display::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging);

    tracing::debug!(api = %config.api.base_url, "Starting DeFAI CLI");
    let console = Console::new(config)?;

    match cli.command {
        Commands::Dashboard => dashboard::show(&console).await,
        Commands::Health => dashboard::health(&console).await,
        Commands::Agent { action } => match action {
            AgentCommands::List => agent::list(&console).await,
            AgentCommands::Show { id } => agent::show(&console, &id).await,
            AgentCommands::Create(args) => agent::create(&console, args).await,
            AgentCommands::Update { id, args } => agent::update(&console, &id, args).await,
            AgentCommands::Delete { id, yes } => agent::delete(&console, &id, yes).await,
            AgentCommands::Start { id } => {
                agent::transition(&console, &id, LifecycleAction::Start).await
            }
            AgentCommands::Pause { id } => {
                agent::transition(&console, &id, LifecycleAction::Pause).await
            }
            AgentCommands::Stop { id } => {
                agent::transition(&console, &id, LifecycleAction::Stop).await
            }
            AgentCommands::Executions { id } => agent::executions(&console, &id).await,
            AgentCommands::Performance { id } => agent::performance(&console, &id).await,
        },
        Commands::Wallet { action } => match action {
            WalletCommands::List { chain } => wallet::list(&console, chain).await,
            WalletCommands::Connect { chain, wallet } => {
                wallet::connect(&console, chain, wallet).await
            }
            WalletCommands::Disconnect => wallet::disconnect(&console).await,
            WalletCommands::Status => wallet::status(&console).await,
            WalletCommands::Keygen { wallet } => wallet::keygen(&console, wallet).await,
        },
    }
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging on stderr
fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }
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
    fn parses_wallet_connect() {
        let cli = Cli::try_parse_from(["defai", "wallet", "connect", "--chain", "eth", "--wallet", "metamask"]).unwrap();
        match cli.command {
            Commands::Wallet { action: WalletCommands::Connect { chain, wallet } } => {
                assert_eq!(chain, Chain::Ethereum);
                assert_eq!(wallet, Some(WalletId::MetaMask));
            }
            _ => panic!("expected wallet connect"),
        }
    }

    #[test]
    fn parses_agent_create_flags() {
        let cli = Cli::try_parse_from([
            "defai", "agent", "create", "--name", "Arb", "--strategy", "arbitrage",
            "--risk", "high", "--protocol", "jupiter", "--protocol", "orca",
        ])
        .unwrap();
        let Commands::Agent { action: AgentCommands::Create(args) } = cli.command else {
            panic!("expected agent create");
        };
        assert_eq!(args.protocols, vec!["jupiter", "orca"]);
        assert_eq!(args.risk, Some(defai_types::RiskLevel::High));
    }
}
