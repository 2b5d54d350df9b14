//! Display utilities for the CLI

use colored::*;
use defai_session::Session;
use defai_types::format::{format_balance, format_currency, format_number, format_percentage, short_address};
use defai_types::{
    Agent, AgentExecution, AgentPerformance, AgentStatus, DashboardStats, ExecutionStatus,
    HealthStatus, LifecycleAction, RiskLevel,
};
use defai_wallet::WalletOption;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

// ============================================================================
// Badges
// ============================================================================

pub fn status_badge(status: AgentStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        AgentStatus::Active => label.bright_green(),
        AgentStatus::Paused => label.yellow(),
        AgentStatus::Error => label.bright_red(),
        AgentStatus::Created => label.bright_blue(),
        AgentStatus::Stopped => label.bright_black(),
    }
}

pub fn risk_badge(risk: RiskLevel) -> ColoredString {
    let label = format!("{risk} risk");
    match risk {
        RiskLevel::Low => label.green(),
        RiskLevel::Medium => label.yellow(),
        RiskLevel::High => label.red(),
    }
}

fn execution_badge(status: ExecutionStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        ExecutionStatus::Completed => label.bright_green(),
        ExecutionStatus::Failed => label.bright_red(),
        ExecutionStatus::Executing | ExecutionStatus::Pending => label.bright_blue(),
        ExecutionStatus::Cancelled => label.bright_black(),
    }
}

fn signed_currency(amount: f64) -> ColoredString {
    let text = format_currency(amount);
    if amount > 0.0 {
        text.bright_green()
    } else if amount < 0.0 {
        text.bright_red()
    } else {
        text.normal()
    }
}

/// Command hint for each lifecycle action a card offers
pub fn action_hints(agent: &Agent) -> Vec<String> {
    agent
        .status
        .available_actions()
        .iter()
        .map(|action: &LifecycleAction| format!("defai agent {} {}", action, agent.id))
        .collect()
}

// ============================================================================
// Dashboard
// ============================================================================

/// The five dashboard stat cards as (title, value)
pub fn stat_cards(stats: &DashboardStats) -> [(&'static str, String); 5] {
    [
        ("Total Agents", stats.total_agents.to_string()),
        ("Active Agents", stats.active_agents.to_string()),
        ("Total Profit", format_currency(stats.total_profit)),
        ("Successful Trades", stats.successful_trades.to_string()),
        ("Success Rate", format_percentage(stats.success_rate)),
    ]
}

pub fn print_stats(stats: &DashboardStats) {
    for (title, value) in stat_cards(stats) {
        println!("  {:<20} {}", title.bright_black(), value.bright_white().bold());
    }
}

pub fn print_health(health: &HealthStatus) {
    if health.is_healthy() {
        success(&format!("{} is {}", health.service, health.status));
    } else {
        warning(&format!("{} reports {}", health.service, health.status));
    }
    let solana = if health.solana_connected { "connected".bright_green() } else { "disconnected".bright_red() };
    println!("      Solana: {solana}");
}

// ============================================================================
// Agents
// ============================================================================

pub fn print_agent_card(agent: &Agent) {
    println!();
    println!(
        "  {}  [{}] [{}]",
        agent.name.bright_white().bold(),
        status_badge(agent.status),
        risk_badge(agent.risk_level)
    );
    println!("  {}", agent.id.bright_black());
    if let Some(description) = agent.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {}", description);
    }
    kv("Strategy", &agent.strategy_type);
    kv("Max Investment", &format_currency(agent.max_investment));
    kv("Stop Loss", &format_percentage(agent.stop_loss_percent));
    println!(
        "      Profit: {}   Trades: {}   Success: {}",
        signed_currency(agent.total_profit),
        agent.total_trades.to_string().bright_cyan(),
        // success_rate is served as 0-100
        format_percentage(agent.success_rate / 100.0).bright_cyan()
    );
    if !agent.protocols.is_empty() {
        kv("Protocols", &agent.protocols.join(", "));
    }
    for hint in action_hints(agent) {
        println!("      {} {}", "$".bright_black(), hint.bright_black());
    }
}

pub fn print_agent_list(agents: &[Agent]) {
    if agents.is_empty() {
        info("No agents yet.");
        println!();
        println!("  Create one with: {}", "defai agent create".bright_cyan());
        return;
    }
    for agent in agents {
        print_agent_card(agent);
    }
}

pub fn print_agent_detail(agent: &Agent) {
    print_agent_card(agent);
    kv("Chain", &agent.chain);
    kv("Min Profit", &format_percentage(agent.min_profit_threshold));
    if !agent.watched_tokens.is_empty() {
        kv("Watched Tokens", &agent.watched_tokens.join(", "));
    }
    if let Some(wallet) = &agent.wallet_address {
        kv("Wallet", &short_address(wallet));
    }
    kv("Public", if agent.is_public { "yes" } else { "no" });
    kv("Created", &agent.created_at);
    if let Some(last) = &agent.last_active_at {
        kv("Last Active", last);
    }
    if !agent.strategy_config.is_empty() {
        let config = serde_json::Value::Object(agent.strategy_config.clone());
        kv("Strategy Config", &config.to_string());
    }
}

pub fn print_executions(executions: &[AgentExecution]) {
    if executions.is_empty() {
        info("No executions recorded.");
        return;
    }
    println!(
        "  {:<12} {:<12} {:<24} {:>14}",
        "STATUS", "PROTOCOL", "STARTED", "PROFIT"
    );
    println!("  {}", "─".repeat(64));
    for execution in executions {
        println!(
            "  {:<12} {:<12} {:<24} {:>14}",
            execution_badge(execution.status),
            execution.protocol.as_deref().unwrap_or("-"),
            execution.start_time,
            signed_currency(execution.profit)
        );
        if let Some(message) = &execution.error_message {
            println!("    {}", message.bright_red());
        }
    }
}

pub fn print_performance(rows: &[AgentPerformance]) {
    if rows.is_empty() {
        info("No performance data yet.");
        return;
    }
    println!(
        "  {:<12} {:<8} {:>8} {:>14} {:>10} {:>16}",
        "DATE", "PERIOD", "TRADES", "NET PROFIT", "ROI", "PORTFOLIO"
    );
    println!("  {}", "─".repeat(74));
    for row in rows {
        println!(
            "  {:<12} {:<8} {:>8} {:>14} {:>10} {:>16}",
            row.date,
            row.period_type,
            format_number(row.trades_count as f64),
            signed_currency(row.net_profit),
            format!("{:.2}%", row.roi_percent),
            format_currency(row.portfolio_value)
        );
    }
}

// ============================================================================
// Wallets
// ============================================================================

pub fn print_wallet_options(options: &[WalletOption]) {
    for option in options {
        let state = if option.installed {
            "installed".bright_green()
        } else {
            "not installed".bright_black()
        };
        let chains: Vec<&str> = option.chains.iter().map(|c| c.as_str()).collect();
        println!(
            "  {:<11} {:<16} {:<18} [{}]",
            option.id.as_str().bright_black(),
            option.name.bright_white(),
            chains.join(", "),
            state
        );
        if !option.installed {
            println!("      {}", option.download_url.bright_black());
        }
    }
}

pub fn print_session(session: &Session) {
    let (Some(address), Some(chain)) = (&session.address, session.chain) else {
        info("No wallet connected.");
        return;
    };
    kv("Address", &short_address(address));
    kv("Chain", chain.as_str());
    if let Some(wallet) = session.wallet_type {
        kv("Wallet", wallet.as_str());
    }
    kv("Balance", &format_balance(session.balance, chain.native_symbol()));
    let auth = if session.is_authenticated() { "authenticated" } else { "not authenticated" };
    kv("Session", auth);
    if let Some(expires) = session.expires_at {
        kv("Expires", &expires.format("%Y-%m-%d %H:%M UTC").to_string());
    }
}
