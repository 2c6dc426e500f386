//! Visibility verification
//!
//! Absence can only be proven by exhausting a deadline, so the wait is
//! asymmetric: a visible element resolves as soon as it renders, a hidden
//! one only once the full deadline has elapsed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use gatecheck_common::{Expectation, SurfaceConfig};

use crate::error::{E2eError, E2eResult};
use crate::surface::UiSurface;

/// Why a verification failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mismatch {
    TextMismatch,
    UnexpectedlyVisible,
    NotFound,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::TextMismatch => write!(f, "text mismatch"),
            Mismatch::UnexpectedlyVisible => write!(f, "unexpectedly visible"),
            Mismatch::NotFound => write!(f, "expected visible, not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail(Mismatch),
}

/// What the UI actually showed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.visible, &self.text) {
            (true, Some(text)) => write!(f, "visible with text {:?}", text),
            (true, None) => write!(f, "visible"),
            (false, _) => write!(f, "not visible"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub affordance: String,
    pub test_id: String,
    pub expected: Expectation,
    pub observed: Observation,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Turn a failed outcome into [`E2eError::VerificationMismatch`]
    pub fn into_result(self) -> E2eResult<Self> {
        match &self.outcome {
            Outcome::Pass => Ok(self),
            Outcome::Fail(reason) => Err(E2eError::VerificationMismatch {
                affordance: self.affordance.clone(),
                expected: describe_expectation(&self.expected),
                observed: format!("{} ({})", self.observed, reason),
            }),
        }
    }
}

fn describe_expectation(expected: &Expectation) -> String {
    match (expected.visible, &expected.expected_text) {
        (true, Some(text)) => format!("visible with text {:?}", text),
        (true, None) => "visible".to_string(),
        (false, _) => "not visible".to_string(),
    }
}

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls the UI for an affordance and judges it against an expectation
#[derive(Clone)]
pub struct VisibilityVerifier {
    surface: Arc<dyn UiSurface>,
    addressing: SurfaceConfig,
    poll_interval: Duration,
}

impl VisibilityVerifier {
    pub fn new(surface: Arc<dyn UiSurface>, addressing: SurfaceConfig, poll_interval: Duration) -> Self {
        Self {
            surface,
            addressing,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Poll a raw test id until it is visible or `deadline` elapses.
    ///
    /// Returns whether it became visible.
    pub async fn wait_visible(&self, test_id: &str, deadline: Duration) -> E2eResult<bool> {
        let start = Instant::now();
        loop {
            if self.surface.is_visible(test_id).await? {
                return Ok(true);
            }
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - elapsed)).await;
        }
    }

    /// Read the text of a visible element, re-reading until it equals
    /// `want` or the time left of `deadline` (measured from `start`) runs out
    async fn settle_text(
        &self,
        test_id: &str,
        want: Option<&str>,
        start: Instant,
        deadline: Duration,
    ) -> E2eResult<Option<String>> {
        loop {
            let text = self.surface.text(test_id).await?;
            let Some(want) = want else {
                return Ok(text);
            };
            let elapsed = start.elapsed();
            if text.as_deref() == Some(want) || elapsed >= deadline {
                return Ok(text);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - elapsed)).await;
        }
    }

    pub async fn verify(
        &self,
        affordance: &str,
        expected: &Expectation,
        deadline: Duration,
    ) -> E2eResult<VerificationResult> {
        let test_id = self.addressing.test_id(affordance);
        let start = Instant::now();

        let visible = self.wait_visible(&test_id, deadline).await?;
        let text = if visible && expected.visible {
            self.settle_text(&test_id, expected.expected_text.as_deref(), start, deadline)
                .await?
        } else if visible {
            self.surface.text(&test_id).await?
        } else {
            None
        };
        let observed = Observation { visible, text };

        let outcome = match (visible, expected.visible) {
            (true, true) => match &expected.expected_text {
                Some(want) if observed.text.as_deref() != Some(want.as_str()) => {
                    Outcome::Fail(Mismatch::TextMismatch)
                }
                _ => Outcome::Pass,
            },
            (true, false) => Outcome::Fail(Mismatch::UnexpectedlyVisible),
            (false, false) => Outcome::Pass,
            (false, true) => Outcome::Fail(Mismatch::NotFound),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Outcome::Pass => debug!("{} verified in {} ms", affordance, elapsed_ms),
            Outcome::Fail(reason) => warn!(
                "{} failed: {} (expected {}, observed {})",
                affordance,
                reason,
                describe_expectation(expected),
                observed
            ),
        }
        if !visible && !expected.visible {
            info!("{} absent for the full {:?} deadline", affordance, deadline);
        }

        Ok(VerificationResult {
            affordance: affordance.to_string(),
            test_id,
            expected: expected.clone(),
            observed,
            outcome,
            elapsed_ms,
        })
    }
}
