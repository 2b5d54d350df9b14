//! Wallet commands - Connect, inspect and manage wallets

use anyhow::Context;
use colored::*;
use defai_session::ConnectOutcome;
use defai_types::format::short_address;
use defai_types::{Chain, WalletId};
use defai_wallet::{wallet_option, WalletProvider};
use dialoguer::Select;

use crate::commands::{spinner, Console};
use crate::display;

/// Wallets offered for `chain`
pub async fn list(console: &Console, chain: Chain) -> anyhow::Result<()> {
    let session = console.session()?;
    session.set_preferred_chain(chain);

    display::section(&format!("Wallets for {}", chain.as_str()));
    display::print_wallet_options(&session.flow().wallets());
    println!();
    println!(
        "  Create a local wallet with: {}",
        "defai wallet keygen --wallet phantom".bright_cyan()
    );
    Ok(())
}

/// Connect and sign in. Prompts for a wallet when none is given.
pub async fn connect(console: &Console, chain: Chain, wallet: Option<WalletId>) -> anyhow::Result<()> {
    let session = console.session()?;
    session.set_preferred_chain(chain);

    let wallet = match wallet {
        Some(wallet) => wallet,
        None => {
            let options = session.flow().wallets();
            let labels: Vec<String> = options
                .iter()
                .map(|o| {
                    let state = if o.installed { "" } else { " (not installed)" };
                    format!("{}{}", o.name, state)
                })
                .collect();
            let choice = Select::new()
                .with_prompt(format!("Connect a wallet on {}", chain.as_str()))
                .items(&labels)
                .default(0)
                .interact()?;
            options[choice].id
        }
    };

    let pb = spinner(&format!("Connecting {}...", wallet_option(wallet).name))?;
    let outcome = session.connect(wallet).await;
    pb.finish_and_clear();

    match outcome {
        Ok(ConnectOutcome::Authenticated(snapshot)) => {
            display::success(&format!("Connected {}", wallet_option(wallet).name));
            if let Err(e) = session.refresh_balance().await {
                tracing::warn!(error = %e, "Balance lookup failed");
            }
            let mut snapshot = snapshot;
            snapshot.balance = session.snapshot().balance;
            display::print_session(&snapshot);
        }
        Ok(ConnectOutcome::Rejected) => {
            display::error("Failed to authenticate with backend");
        }
        Ok(ConnectOutcome::InstallRequired { wallet, url }) => {
            display::warning(&format!("{} wallet not found. Please install it.", wallet_option(wallet).name));
            display::kv("Install", &url);
            display::info(&format!("Or create a local one: defai wallet keygen --wallet {wallet}"));
        }
        Ok(ConnectOutcome::Ignored) => {
            display::warning("Another wallet is already connecting.");
        }
        Err(e) => {
            display::error(&e.to_string());
        }
    }
    Ok(())
}

pub async fn disconnect(console: &Console) -> anyhow::Result<()> {
    let session = console.session()?;
    // restore first so the provider of the persisted session is told too
    if let Err(e) = session.restore().await {
        tracing::debug!(error = %e, "Nothing valid to restore before disconnect");
    }
    session
        .disconnect()
        .await
        .context("signed out, but the saved session could not be removed")?;
    display::success("Wallet disconnected");
    Ok(())
}

pub async fn status(console: &Console) -> anyhow::Result<()> {
    let session = console.session()?;
    display::section("Wallet Session");

    if !session.restore().await? {
        display::info("No wallet connected.");
        println!();
        println!("  Connect one with: {}", "defai wallet connect".bright_cyan());
        return Ok(());
    }
    if let Err(e) = session.refresh_balance().await {
        display::warning(&format!("Balance unavailable: {e}"));
    }
    display::print_session(&session.snapshot());
    println!();
    Ok(())
}

/// Create a local keystore wallet
pub async fn keygen(console: &Console, wallet: WalletId) -> anyhow::Result<()> {
    if wallet == WalletId::WalletConnect {
        anyhow::bail!("WalletConnect pairs with a remote wallet and has no local key");
    }
    let keystore = console.keystore();
    let created = keystore
        .generate(wallet)
        .with_context(|| format!("failed to create {wallet} key in {}", keystore.dir().display()))?;

    display::success(&format!("Created {} wallet", wallet_option(wallet).name));
    for chain in Chain::ALL {
        if created.supports(chain) {
            let address = created.address(chain);
            println!("      {:<9} {} ({})", chain.as_str(), address.bright_cyan(), short_address(&address));
        }
    }
    display::kv("Keystore", &keystore.dir().display().to_string());
    Ok(())
}
