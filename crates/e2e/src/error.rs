//! Error types for correlation, verification and scenario runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("No successful response matching '{fragment}' within {window_ms} ms")]
    CorrelationTimeout { fragment: String, window_ms: u64 },

    #[error("Response stream closed before a response matching '{0}' arrived")]
    StreamClosed(String),

    #[error("Rule error: {0}")]
    Rules(#[from] gatecheck_common::Error),

    #[error("Verification mismatch for {affordance}: expected {expected}, observed {observed}")]
    VerificationMismatch {
        affordance: String,
        expected: String,
        observed: String,
    },

    #[error("UI surface error: {0}")]
    Surface(String),

    #[error("Scenario spec parse error: {0}")]
    SpecParse(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl E2eError {
    /// True when the failure came from a bounded wait running out
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            E2eError::CorrelationTimeout { .. } | E2eError::Timeout(_)
        )
    }

    /// True when a backend payload broke the rule table's structural contract
    pub fn is_rule_resolution(&self) -> bool {
        matches!(self, E2eError::Rules(e) if e.is_rule_resolution())
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
