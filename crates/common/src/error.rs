//! Error types for Gatecheck

use thiserror::Error;

/// Result type alias using Gatecheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// Gatecheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Privilege group not found: {group}")]
    MissingPrivilegeGroup { group: String },

    #[error("Action {action} not found in privilege group {group}")]
    MissingAction { group: String, action: String },

    #[error("{kind} {id} not found in user entities")]
    EntityNotFound { kind: String, id: String },

    #[error("Unknown affordance: {0}")]
    UnknownAffordance(String),

    #[error("Rule for {affordance} requires {requirement} which was not supplied")]
    MissingEvidence {
        affordance: String,
        requirement: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for structural gaps in an otherwise successful backend payload.
    pub fn is_rule_resolution(&self) -> bool {
        matches!(
            self,
            Error::MissingPrivilegeGroup { .. }
                | Error::MissingAction { .. }
                | Error::EntityNotFound { .. }
        )
    }
}
