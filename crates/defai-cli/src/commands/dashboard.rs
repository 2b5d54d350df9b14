//! Dashboard and health commands

use crate::commands::{spinner, Console};
use crate::display;

/// Stat cards followed by the agent cards
pub async fn show(console: &Console) -> anyhow::Result<()> {
    let session = console.restored_session().await?;

    let pb = spinner("Loading dashboard...")?;
    let (stats, agents) = tokio::join!(console.api.dashboard_stats(), console.api.list_agents());
    pb.finish_and_clear();

    display::section("Welcome to DeFAI");
    match stats {
        Ok(stats) => display::print_stats(&stats),
        Err(e) => display::error(&format!("Failed to load stats: {e}")),
    }

    if session.is_authenticated() {
        if let Err(e) = session.refresh_balance().await {
            tracing::warn!(error = %e, "Balance lookup failed");
        }
        println!();
        display::print_session(&session.snapshot());
    }

    display::section("Your Agents");
    match agents {
        Ok(agents) => display::print_agent_list(&agents),
        Err(e) => display::error(&format!("Failed to load agents: {e}")),
    }
    println!();
    Ok(())
}

/// Backend health
pub async fn health(console: &Console) -> anyhow::Result<()> {
    display::section("Backend Health");
    display::kv("URL", console.api.base_url());
    let health = console.api.health().await?;
    display::print_health(&health);
    Ok(())
}
