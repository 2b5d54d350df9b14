//! DeFAI Types - Canonical domain types for the agent console
//!
//! This crate contains all foundational types with zero dependencies on
//! other defai crates. It defines:
//!
//! - Chain and wallet identifiers
//! - Agent, execution and performance records returned by the backend
//! - Dashboard aggregates and health status
//! - Wallet authentication request/response bodies
//! - Display formatting shared by every surface
//!
//! # Ownership
//!
//! Agents are owned and mutated by the backend. This workspace only reads
//! them and requests lifecycle transitions.

pub mod chain;
pub mod agent;
pub mod dashboard;
pub mod auth;
pub mod format;
pub mod error;

pub use chain::*;
pub use agent::*;
pub use dashboard::*;
pub use auth::*;
pub use error::*;

/// Version of the DeFAI types schema
pub const TYPES_VERSION: &str = "0.1.0";
