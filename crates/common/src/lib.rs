//! Gatecheck Common Library
//!
//! Entity classification, the backend data model, typed privilege lookup and
//! the visibility rule engine. Everything in this crate is synchronous and
//! free of I/O apart from loading configuration files.

pub mod config;
pub mod entity;
pub mod error;
pub mod privileges;
pub mod rules;
pub mod types;

// Re-export commonly used types
pub use config::{ExchangeConfig, GatecheckConfig, SurfaceConfig, TimingConfig};
pub use entity::{classify, EntityId, EntityKind};
pub use error::{Error, Result};
pub use privileges::{resolve_toggle, PrivilegeIndex};
pub use rules::{
    AffordanceRule, EvaluationContext, Expectation, Requirement, Rule, RuleTable, TextSource,
    ADMIN_DASHBOARD,
};
pub use types::*;

/// Gatecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
