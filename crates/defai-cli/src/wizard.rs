//! Interactive agent creation wizard

use colored::*;
use defai_types::{CreateAgentRequest, RiskLevel};
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::form::{CreateAgentForm, LAST_STEP, PROTOCOLS, STRATEGIES, TOKENS};

fn header(form: &CreateAgentForm, title: &str) {
    println!();
    println!(
        "{} {}",
        format!("Step {}/{}", form.step(), LAST_STEP).bright_black(),
        title.bright_white().bold()
    );
}

fn identity(form: &mut CreateAgentForm) -> anyhow::Result<()> {
    header(form, "Agent");
    form.name = Input::new()
        .with_prompt("Name")
        .with_initial_text(form.name.clone())
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("an agent name is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    form.description = Input::new()
        .with_prompt("Description (optional)")
        .with_initial_text(form.description.clone())
        .allow_empty(true)
        .interact_text()?;

    let labels: Vec<String> = STRATEGIES
        .iter()
        .map(|s| format!("{:<14} {} ({} risk, {} APY)", s.name, s.description, s.risk, s.apy))
        .collect();
    let current = STRATEGIES
        .iter()
        .position(|s| s.id == form.strategy_type)
        .unwrap_or(0);
    let choice = Select::new()
        .with_prompt("Strategy")
        .items(&labels)
        .default(current)
        .interact()?;
    form.set_strategy(STRATEGIES[choice].id)?;
    Ok(())
}

fn risk(form: &mut CreateAgentForm) -> anyhow::Result<()> {
    header(form, "Risk");
    let labels: Vec<&str> = RiskLevel::ALL.iter().map(|r| r.label()).collect();
    let current = RiskLevel::ALL
        .iter()
        .position(|r| *r == form.risk_level)
        .unwrap_or(1);
    let choice = Select::new()
        .with_prompt("Risk level")
        .items(&labels)
        .default(current)
        .interact()?;
    form.risk_level = RiskLevel::ALL[choice];

    form.max_investment = Input::new()
        .with_prompt("Max investment ($)")
        .default(form.max_investment)
        .interact_text()?;
    form.min_profit_threshold = Input::new()
        .with_prompt("Min profit threshold (ratio)")
        .default(form.min_profit_threshold)
        .interact_text()?;
    form.stop_loss_percent = Input::new()
        .with_prompt("Stop loss (ratio)")
        .default(form.stop_loss_percent)
        .interact_text()?;
    Ok(())
}

fn targets(form: &mut CreateAgentForm) -> anyhow::Result<()> {
    header(form, "Protocols & Tokens");

    let selected: Vec<bool> = PROTOCOLS
        .iter()
        .map(|p| form.protocols().iter().any(|s| s == p))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("Protocols (space to toggle)")
        .items(&PROTOCOLS)
        .defaults(&selected)
        .interact()?;
    for (index, protocol) in PROTOCOLS.iter().enumerate() {
        if chosen.contains(&index) != selected[index] {
            form.toggle_protocol(protocol)?;
        }
    }

    let selected: Vec<bool> = TOKENS
        .iter()
        .map(|t| form.watched_tokens().iter().any(|s| s == t))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("Watched tokens (space to toggle)")
        .items(&TOKENS)
        .defaults(&selected)
        .interact()?;
    for (index, token) in TOKENS.iter().enumerate() {
        if chosen.contains(&index) != selected[index] {
            form.toggle_token(token)?;
        }
    }
    Ok(())
}

/// Walk the three steps. `None` when the user declines to submit.
pub fn run() -> anyhow::Result<Option<CreateAgentRequest>> {
    let mut form = CreateAgentForm::new();
    loop {
        match form.step() {
            1 => identity(&mut form)?,
            2 => risk(&mut form)?,
            _ => targets(&mut form)?,
        }

        if form.step() < LAST_STEP {
            form.next()?;
            continue;
        }

        let submit = Confirm::new()
            .with_prompt("Create this agent?")
            .default(true)
            .interact()?;
        if submit {
            return Ok(Some(form.submit()?));
        }

        let back = Confirm::new()
            .with_prompt("Go back and edit?")
            .default(true)
            .interact()?;
        if !back {
            return Ok(None);
        }
        while form.step() > 1 {
            form.back();
        }
    }
}
