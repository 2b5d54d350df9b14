//! Agent commands - list, inspect, create and drive agents

use anyhow::bail;
use clap::Args;
use colored::*;
use defai_types::{Agent, LifecycleAction, RiskLevel, UpdateAgentRequest};
use dialoguer::Confirm;

use crate::commands::{spinner, Console};
use crate::display;
use crate::form::CreateAgentForm;
use crate::wizard;

/// Flags for `agent create`; without `--name` and `--strategy` the wizard runs
#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Agent name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Strategy: yield_farming, arbitrage or lending
    #[arg(short, long)]
    pub strategy: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Risk level: low, medium or high
    #[arg(long)]
    pub risk: Option<RiskLevel>,

    #[arg(long)]
    pub max_investment: Option<f64>,

    #[arg(long)]
    pub min_profit: Option<f64>,

    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Protocol to use (repeatable)
    #[arg(long = "protocol")]
    pub protocols: Vec<String>,

    /// Token to watch (repeatable)
    #[arg(long = "token")]
    pub tokens: Vec<String>,

    #[arg(long)]
    pub public: bool,
}

impl CreateArgs {
    fn is_complete(&self) -> bool {
        self.name.is_some() && self.strategy.is_some()
    }

    fn into_form(self) -> anyhow::Result<CreateAgentForm> {
        let mut form = CreateAgentForm::new();
        form.name = self.name.unwrap_or_default();
        form.description = self.description.unwrap_or_default();
        if let Some(strategy) = &self.strategy {
            form.set_strategy(strategy)?;
        }
        if let Some(risk) = self.risk {
            form.risk_level = risk;
        }
        if let Some(v) = self.max_investment {
            form.max_investment = v;
        }
        if let Some(v) = self.min_profit {
            form.min_profit_threshold = v;
        }
        if let Some(v) = self.stop_loss {
            form.stop_loss_percent = v;
        }
        for protocol in &self.protocols {
            form.toggle_protocol(protocol)?;
        }
        for token in &self.tokens {
            form.toggle_token(token)?;
        }
        form.is_public = self.public;
        Ok(form)
    }
}

/// Flags for `agent update`; only given fields change
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub risk: Option<RiskLevel>,

    #[arg(long)]
    pub max_investment: Option<f64>,

    #[arg(long)]
    pub min_profit: Option<f64>,

    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Replace the protocol list (repeatable)
    #[arg(long = "protocol")]
    pub protocols: Vec<String>,

    /// Replace the watched token list (repeatable)
    #[arg(long = "token")]
    pub tokens: Vec<String>,

    #[arg(long)]
    pub public: Option<bool>,
}

impl From<UpdateArgs> for UpdateAgentRequest {
    fn from(args: UpdateArgs) -> Self {
        UpdateAgentRequest {
            name: args.name,
            description: args.description,
            strategy_config: None,
            risk_level: args.risk,
            protocols: (!args.protocols.is_empty()).then_some(args.protocols),
            watched_tokens: (!args.tokens.is_empty()).then_some(args.tokens),
            max_investment: args.max_investment,
            min_profit_threshold: args.min_profit,
            stop_loss_percent: args.stop_loss,
            is_public: args.public,
        }
    }
}

pub async fn list(console: &Console) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let pb = spinner("Loading agents...")?;
    let agents = console.api.list_agents().await;
    pb.finish_and_clear();

    display::section("Your Agents");
    display::print_agent_list(&agents?);
    println!();
    Ok(())
}

pub async fn show(console: &Console, id: &str) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let agent = console.api.get_agent(id).await?;
    display::section(&format!("Agent: {}", agent.name));
    display::print_agent_detail(&agent);
    println!();
    Ok(())
}

pub async fn create(console: &Console, args: CreateArgs) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;

    let request = if args.is_complete() {
        args.into_form()?.submit()?
    } else {
        display::section("Create AI Agent");
        println!("  {}", "Configure your autonomous DeFi trading agent".bright_black());
        match wizard::run()? {
            Some(request) => request,
            None => {
                display::info("Cancelled.");
                return Ok(());
            }
        }
    };

    let pb = spinner("Creating agent...")?;
    let created = console.api.create_agent(&request).await;
    pb.finish_and_clear();
    let created = created?;
    display::success(&format!("Agent created: {}", created.name.bright_cyan()));

    let others = match console.api.list_agents().await {
        Ok(agents) => agents,
        Err(e) => {
            tracing::warn!(error = %e, "Could not refresh agent list");
            Vec::new()
        }
    };
    display::section("Your Agents");
    display::print_agent_list(&prepend(created, others));
    println!();
    Ok(())
}

/// `created` first, without duplicating it if the list already has it
fn prepend(created: Agent, others: Vec<Agent>) -> Vec<Agent> {
    let mut agents = Vec::with_capacity(others.len() + 1);
    let id = created.id.clone();
    agents.push(created);
    agents.extend(others.into_iter().filter(|a| a.id != id));
    agents
}

pub async fn update(console: &Console, id: &str, args: UpdateArgs) -> anyhow::Result<()> {
    let request = UpdateAgentRequest::from(args);
    if request.is_empty() {
        bail!("nothing to update; pass at least one field flag");
    }
    let _session = console.restored_session().await?;
    let agent = console.api.update_agent(id, &request).await?;
    display::success(&format!("Agent updated: {}", agent.name.bright_cyan()));
    display::print_agent_card(&agent);
    println!();
    Ok(())
}

pub async fn delete(console: &Console, id: &str, yes: bool) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let agent = console.api.get_agent(id).await?;
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete agent {}?", agent.name))
            .default(false)
            .interact()?;
        if !confirmed {
            display::info("Cancelled.");
            return Ok(());
        }
    }
    console.api.delete_agent(id).await?;
    display::success(&format!("Agent deleted: {}", agent.name));
    Ok(())
}

/// Start, pause or stop, when the agent's status offers it
pub async fn transition(console: &Console, id: &str, action: LifecycleAction) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let agent = console.api.get_agent(id).await?;
    if !agent.status.allows(action) {
        display::warning(&format!(
            "{} is {}; it can't be {}",
            agent.name,
            agent.status,
            past_tense(action)
        ));
        for hint in display::action_hints(&agent) {
            display::info(&hint);
        }
        return Ok(());
    }

    let updated = console.api.transition_agent(id, action).await?;
    display::success(&format!(
        "{} {} (now {})",
        updated.name.bright_cyan(),
        past_tense(action),
        display::status_badge(updated.status)
    ));
    Ok(())
}

fn past_tense(action: LifecycleAction) -> &'static str {
    match action {
        LifecycleAction::Start => "started",
        LifecycleAction::Pause => "paused",
        LifecycleAction::Stop => "stopped",
    }
}

pub async fn executions(console: &Console, id: &str) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let executions = console.api.agent_executions(id).await?;
    display::section("Executions");
    display::print_executions(&executions);
    println!();
    Ok(())
}

pub async fn performance(console: &Console, id: &str) -> anyhow::Result<()> {
    let _session = console.restored_session().await?;
    let rows = console.api.agent_performance(id).await?;
    display::section("Performance");
    display::print_performance(&rows);
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> Agent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "strategy_type": "lending",
            "risk_level": "low",
            "chain": "solana",
            "max_investment": 1000.0,
            "min_profit_threshold": 0.01,
            "stop_loss_percent": 0.1,
            "status": "created",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "owner_id": "u1"
        }))
        .unwrap()
    }

    #[test]
    fn created_agent_goes_first_once() {
        let list = prepend(agent("new"), vec![agent("old"), agent("new")]);
        let ids: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn flags_fill_the_form() {
        let args = CreateArgs {
            name: Some("Arb".into()),
            strategy: Some("arbitrage".into()),
            risk: Some(RiskLevel::High),
            protocols: vec!["jupiter".into(), "orca".into()],
            tokens: vec!["SOL".into()],
            ..Default::default()
        };
        assert!(args.is_complete());
        let request = args.into_form().unwrap().submit().unwrap();
        assert_eq!(request.strategy_type, "arbitrage");
        assert_eq!(request.risk_level, Some(RiskLevel::High));
        assert_eq!(request.protocols, Some(vec!["jupiter".into(), "orca".into()]));
        assert_eq!(request.stop_loss_percent, Some(0.1));
    }

    #[test]
    fn unknown_strategy_flag_fails() {
        let args = CreateArgs {
            name: Some("X".into()),
            strategy: Some("market_making".into()),
            ..Default::default()
        };
        assert!(args.into_form().is_err());
    }

    #[test]
    fn update_flags_only_set_given_fields() {
        let request = UpdateAgentRequest::from(UpdateArgs {
            stop_loss: Some(0.2),
            ..Default::default()
        });
        assert_eq!(request.stop_loss_percent, Some(0.2));
        assert!(request.protocols.is_none());
        assert!(UpdateAgentRequest::from(UpdateArgs::default()).is_empty());
    }
}
