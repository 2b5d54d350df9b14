//! Agent creation form
//!
//! A three step form with no I/O. The wizard drives it from prompts; tests
//! drive it directly.
//!
//! 1. Identity: name, description, strategy
//! 2. Risk: risk level, max investment, min profit threshold, stop loss
//! 3. Targets: protocols and watched tokens

use defai_types::{CreateAgentRequest, RiskLevel};
use std::fmt;

/// A strategy the backend knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub risk: RiskLevel,
    pub apy: &'static str,
}

pub const STRATEGIES: [StrategyOption; 3] = [
    StrategyOption {
        id: "yield_farming",
        name: "Yield Farming",
        description: "Automatically stake tokens in high-yield pools",
        risk: RiskLevel::Medium,
        apy: "8-15%",
    },
    StrategyOption {
        id: "arbitrage",
        name: "Arbitrage",
        description: "Exploit price differences across DEXs",
        risk: RiskLevel::High,
        apy: "12-25%",
    },
    StrategyOption {
        id: "lending",
        name: "Lending",
        description: "Lend tokens to earn interest",
        risk: RiskLevel::Low,
        apy: "4-8%",
    },
];

pub const PROTOCOLS: [&str; 6] = ["jupiter", "raydium", "orca", "marginfi", "solend", "kamino"];

pub const TOKENS: [&str; 8] = ["SOL", "USDC", "USDT", "RAY", "ORCA", "MNGO", "SRM", "FTT"];

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 3;

const DEFAULT_MAX_INVESTMENT: f64 = 1000.0;
const DEFAULT_MIN_PROFIT_THRESHOLD: f64 = 0.01;
const DEFAULT_STOP_LOSS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingName,
    MissingStrategy,
    UnknownStrategy(String),
    UnknownProtocol(String),
    UnknownToken(String),
    LastStep,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("an agent name is required"),
            Self::MissingStrategy => f.write_str("a strategy must be selected"),
            Self::UnknownStrategy(s) => write!(f, "unknown strategy: {s}"),
            Self::UnknownProtocol(p) => write!(f, "unknown protocol: {p}"),
            Self::UnknownToken(t) => write!(f, "unknown token: {t}"),
            Self::LastStep => f.write_str("already on the last step"),
        }
    }
}

impl std::error::Error for FormError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAgentForm {
    step: u8,
    pub name: String,
    pub description: String,
    pub strategy_type: String,
    pub risk_level: RiskLevel,
    pub max_investment: f64,
    pub min_profit_threshold: f64,
    pub stop_loss_percent: f64,
    pub is_public: bool,
    protocols: Vec<String>,
    watched_tokens: Vec<String>,
}

impl Default for CreateAgentForm {
    fn default() -> Self {
        Self {
            step: FIRST_STEP,
            name: String::new(),
            description: String::new(),
            strategy_type: String::new(),
            risk_level: RiskLevel::Medium,
            max_investment: DEFAULT_MAX_INVESTMENT,
            min_profit_threshold: DEFAULT_MIN_PROFIT_THRESHOLD,
            stop_loss_percent: DEFAULT_STOP_LOSS,
            is_public: false,
            protocols: Vec::new(),
            watched_tokens: Vec::new(),
        }
    }
}

impl CreateAgentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    pub fn watched_tokens(&self) -> &[String] {
        &self.watched_tokens
    }

    pub fn set_strategy(&mut self, id: &str) -> Result<(), FormError> {
        if !STRATEGIES.iter().any(|s| s.id == id) {
            return Err(FormError::UnknownStrategy(id.to_string()));
        }
        self.strategy_type = id.to_string();
        Ok(())
    }

    /// Add the protocol if absent, remove it if present
    pub fn toggle_protocol(&mut self, protocol: &str) -> Result<(), FormError> {
        if !PROTOCOLS.contains(&protocol) {
            return Err(FormError::UnknownProtocol(protocol.to_string()));
        }
        toggle(&mut self.protocols, protocol);
        Ok(())
    }

    /// Add the token if absent, remove it if present
    pub fn toggle_token(&mut self, token: &str) -> Result<(), FormError> {
        if !TOKENS.contains(&token) {
            return Err(FormError::UnknownToken(token.to_string()));
        }
        toggle(&mut self.watched_tokens, token);
        Ok(())
    }

    fn check_identity(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        if self.strategy_type.is_empty() {
            return Err(FormError::MissingStrategy);
        }
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        match self.step {
            FIRST_STEP => self.check_identity().is_ok(),
            LAST_STEP => false,
            _ => true,
        }
    }

    /// Move to the next step. Leaving step 1 needs a name and a strategy.
    pub fn next(&mut self) -> Result<u8, FormError> {
        if self.step == LAST_STEP {
            return Err(FormError::LastStep);
        }
        if self.step == FIRST_STEP {
            self.check_identity()?;
        }
        self.step += 1;
        Ok(self.step)
    }

    /// Previous step; stays on step 1
    pub fn back(&mut self) -> u8 {
        if self.step > FIRST_STEP {
            self.step -= 1;
        }
        self.step
    }

    /// Build the request and reset the form for the next agent
    pub fn submit(&mut self) -> Result<CreateAgentRequest, FormError> {
        self.check_identity()?;
        let description = self.description.trim();
        let request = CreateAgentRequest {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            strategy_type: self.strategy_type.clone(),
            strategy_config: None,
            risk_level: Some(self.risk_level),
            protocols: Some(self.protocols.clone()),
            watched_tokens: Some(self.watched_tokens.clone()),
            max_investment: Some(self.max_investment),
            min_profit_threshold: Some(self.min_profit_threshold),
            stop_loss_percent: Some(self.stop_loss_percent),
            is_public: Some(self.is_public),
        };
        *self = Self::default();
        Ok(request)
    }
}

fn toggle(list: &mut Vec<String>, item: &str) {
    match list.iter().position(|existing| existing == item) {
        Some(index) => {
            list.remove(index);
        }
        None => list.push(item.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named() -> CreateAgentForm {
        let mut form = CreateAgentForm::new();
        form.name = "Yield Hunter".into();
        form.set_strategy("yield_farming").unwrap();
        form
    }

    #[test]
    fn defaults_match_the_wizard() {
        let form = CreateAgentForm::new();
        assert_eq!(form.step(), 1);
        assert_eq!(form.risk_level, RiskLevel::Medium);
        assert_eq!(form.max_investment, 1000.0);
        assert_eq!(form.min_profit_threshold, 0.01);
        assert_eq!(form.stop_loss_percent, 0.1);
        assert!(form.protocols().is_empty());
    }

    #[test]
    fn step_one_needs_name_and_strategy() {
        let mut form = CreateAgentForm::new();
        assert!(!form.can_advance());
        assert_eq!(form.next(), Err(FormError::MissingName));

        form.name = "   ".into();
        assert_eq!(form.next(), Err(FormError::MissingName));

        form.name = "Alpha".into();
        assert_eq!(form.next(), Err(FormError::MissingStrategy));
        assert_eq!(form.step(), 1);

        form.set_strategy("arbitrage").unwrap();
        assert!(form.can_advance());
        assert_eq!(form.next(), Ok(2));
        assert_eq!(form.next(), Ok(3));
        assert_eq!(form.next(), Err(FormError::LastStep));
        assert_eq!(form.back(), 2);
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let mut form = CreateAgentForm::new();
        assert!(form.set_strategy("market_making").is_err());
        assert!(form.toggle_protocol("uniswap").is_err());
        assert!(form.toggle_token("DOGE").is_err());
    }

    #[test]
    fn toggles_add_then_remove() {
        let mut form = named();
        form.toggle_protocol("orca").unwrap();
        form.toggle_protocol("jupiter").unwrap();
        form.toggle_protocol("orca").unwrap();
        assert_eq!(form.protocols(), &["jupiter".to_string()]);

        form.toggle_token("SOL").unwrap();
        form.toggle_token("SOL").unwrap();
        assert!(form.watched_tokens().is_empty());
    }

    #[test]
    fn submit_builds_request_and_resets() {
        let mut form = named();
        form.description = "  ".into();
        form.risk_level = RiskLevel::High;
        form.toggle_protocol("raydium").unwrap();
        form.toggle_token("USDC").unwrap();
        form.next().unwrap();

        let request = form.submit().unwrap();
        assert_eq!(request.name, "Yield Hunter");
        assert_eq!(request.description, None);
        assert_eq!(request.strategy_type, "yield_farming");
        assert_eq!(request.risk_level, Some(RiskLevel::High));
        assert_eq!(request.protocols, Some(vec!["raydium".to_string()]));
        assert_eq!(request.watched_tokens, Some(vec!["USDC".to_string()]));
        assert_eq!(request.max_investment, Some(1000.0));
        assert_eq!(request.is_public, Some(false));

        assert_eq!(form, CreateAgentForm::new());
    }

    #[test]
    fn submit_without_strategy_keeps_form() {
        let mut form = CreateAgentForm::new();
        form.name = "Alpha".into();
        assert_eq!(form.submit(), Err(FormError::MissingStrategy));
        assert_eq!(form.name, "Alpha");
    }
}
