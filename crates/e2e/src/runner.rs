//! Scenario runner that sequences UI actions, evidence gathering and
//! visibility verification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use gatecheck_common::{EntityId, EvaluationContext, GatecheckConfig, Requirement, RuleTable};

use crate::correlator::EvidenceCorrelator;
use crate::error::{E2eError, E2eResult};
use crate::evidence::ScenarioEvidence;
use crate::scenario::{ScenarioSpec, ScenarioStep};
use crate::surface::{SessionFactory, UiSurface};
use crate::verifier::{VerificationResult, VisibilityVerifier};

/// Why a step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The UI disagreed with the computed expectation
    Mismatch,
    /// A backend exchange or UI element never showed up in time
    Timeout,
    /// A backend payload lacked a group, action or entity the rules rely on
    RuleResolution,
    Error,
}

impl From<&E2eError> for FailureKind {
    fn from(err: &E2eError) -> Self {
        if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_rule_resolution() {
            FailureKind::RuleResolution
        } else if matches!(err, E2eError::VerificationMismatch { .. }) {
            FailureKind::Mismatch
        } else {
            FailureKind::Error
        }
    }
}

/// Result of executing a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub settings: GatecheckConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            settings: GatecheckConfig::default(),
            specs_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs scenarios, each against a fresh session
pub struct ScenarioRunner<F> {
    factory: F,
    rules: RuleTable,
    config: RunnerConfig,
}

impl<F: SessionFactory> ScenarioRunner<F> {
    pub fn new(factory: F, rules: RuleTable, config: RunnerConfig) -> Self {
        Self {
            factory,
            rules,
            config,
        }
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a list of scenarios one after another
    pub async fn run_specs(&self, specs: &[ScenarioSpec]) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => TestResult {
                    name: spec.name.clone(),
                    success: false,
                    duration_ms: 0,
                    steps: vec![],
                    error: Some(e.to_string()),
                },
            };

            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario, stopping at its first failing step
    pub async fn run_spec(&self, spec: &ScenarioSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let session = self.factory.open(spec).await?;
        let scenario = ScenarioContext::new(
            &self.rules,
            &self.config.settings,
            session.surface,
            EvidenceCorrelator::new(session.responses),
        );

        let mut steps = Vec::with_capacity(spec.steps.len());
        let mut scenario_error = None;

        for step in &spec.steps {
            let result = scenario.execute_step(step).await;
            let failed = !result.success;
            if failed {
                scenario_error = result.error.clone();
            }
            steps.push(result);
            if failed {
                break;
            }
        }

        Ok(TestResult {
            name: spec.name.clone(),
            success: scenario_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: scenario_error,
        })
    }

    /// Write suite results to a JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.output_dir, results)
    }
}

/// Write suite results to `<dir>/test-results.json`
pub fn write_results(dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

/// Everything a scenario owns; dropped when the scenario ends
struct ScenarioContext<'a> {
    rules: &'a RuleTable,
    config: &'a GatecheckConfig,
    surface: Arc<dyn UiSurface>,
    evidence: ScenarioEvidence,
    verifier: VisibilityVerifier,
    active_entity: OnceCell<EntityId>,
}

impl<'a> ScenarioContext<'a> {
    fn new(
        rules: &'a RuleTable,
        config: &'a GatecheckConfig,
        surface: Arc<dyn UiSurface>,
        correlator: EvidenceCorrelator,
    ) -> Self {
        let evidence = ScenarioEvidence::new(
            correlator,
            config.exchanges.clone(),
            config.timing.correlation_window(),
        );
        let verifier = VisibilityVerifier::new(
            surface.clone(),
            config.surface.clone(),
            config.timing.poll_interval(),
        );
        Self {
            rules,
            config,
            surface,
            evidence,
            verifier,
            active_entity: OnceCell::new(),
        }
    }

    async fn execute_step(&self, step: &ScenarioStep) -> StepResult {
        let start = Instant::now();
        let step_name = step.name();
        debug!("Executing step: {}", step_name);

        let outcome = match step {
            ScenarioStep::Click { affordance } => {
                let test_id = self.config.surface.test_id(affordance);
                self.surface.click(&test_id).await.map(|_| None)
            }
            ScenarioStep::Verify {
                affordance,
                deadline_ms,
            } => {
                let deadline = deadline_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| self.config.timing.verify_deadline());
                self.verify(affordance, deadline).await.map(Some)
            }
            ScenarioStep::CaptureActiveEntity => self.active_entity().await.map(|_| None),
            ScenarioStep::Log { message } => {
                info!("[SCENARIO LOG] {}", message);
                Ok(None)
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let (verification, err) = match outcome {
            Ok(verification) => {
                let err = verification.clone().and_then(|v| v.into_result().err());
                (verification, err)
            }
            Err(e) => (None, Some(e)),
        };
        let failure = err.as_ref().map(FailureKind::from);
        if let Some(kind) = failure {
            warn!("Step {} failed ({:?})", step_name, kind);
        }

        StepResult {
            success: err.is_none(),
            step_name,
            duration_ms,
            error: err.map(|e| e.to_string()),
            failure,
            verification,
        }
    }

    /// Gather only the evidence the rule needs, evaluate it, then check the UI
    async fn verify(&self, affordance: &str, deadline: Duration) -> E2eResult<VerificationResult> {
        let rule = self.rules.get(affordance)?;
        let requirements = rule.requirements();

        let mut ctx = EvaluationContext::default();
        for requirement in &requirements {
            match requirement {
                Requirement::ClientSettings => ctx.settings = Some(self.evidence.settings().await?),
                Requirement::RolePrivileges => {
                    ctx.privileges = Some(self.evidence.privileges().await?)
                }
                Requirement::User => ctx.user = Some(self.evidence.user().await?),
                Requirement::ActiveEntity => ctx.active_entity = Some(self.active_entity().await?),
            }
        }

        let expected = rule.evaluate(&ctx)?;
        debug!(
            "{} expected visible={} text={:?}",
            affordance, expected.visible, expected.expected_text
        );
        self.verifier.verify(affordance, &expected, deadline).await
    }

    /// Open the popover, read the active entity identifier, close it again
    async fn active_entity(&self) -> E2eResult<&EntityId> {
        self.active_entity
            .get_or_try_init(|| async move {
                let surface = &self.config.surface;
                let toggle = surface.test_id(&surface.active_entity_toggle);
                let target = surface.active_entity_test_id.as_str();

                self.surface.click(&toggle).await?;
                let deadline = self.config.timing.active_entity_deadline();
                if !self.verifier.wait_visible(target, deadline).await? {
                    return Err(E2eError::Timeout(format!(
                        "{} after {} ms",
                        target,
                        deadline.as_millis()
                    )));
                }
                let raw = self
                    .surface
                    .attribute(target, &surface.active_entity_attribute)
                    .await?;
                self.surface.click(&toggle).await?;

                // A missing attribute classifies as unknown, like any
                // unrecognised identifier
                let id = EntityId::parse(raw.unwrap_or_default());
                info!("Active entity {} ({})", id, id.kind());
                Ok(id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::response_stream;
    use crate::scripted::{ScriptedElement, ScriptedSurface};
    use crate::surface::Session;
    use async_trait::async_trait;

    /// Page with only the popover toggle; the active entity never renders
    struct EmptyPage;

    #[async_trait]
    impl SessionFactory for EmptyPage {
        async fn open(&self, _scenario: &ScenarioSpec) -> E2eResult<Session> {
            let (recorder, responses) = response_stream();
            let surface = ScriptedSurface::new(recorder)
                .with_element(ScriptedElement::new("Dashboard-admin-Profile-PopOver"));
            Ok(Session {
                surface: Arc::new(surface),
                responses,
            })
        }
    }

    fn runner() -> ScenarioRunner<EmptyPage> {
        ScenarioRunner::new(EmptyPage, RuleTable::admin_dashboard(), RunnerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_entity_capture_times_out() {
        let spec = ScenarioSpec::from_yaml(
            "name: capture\nsteps:\n  - action: capture_active_entity\n  - action: log\n    message: unreachable\n",
        )
        .unwrap();

        let result = runner().run_spec(&spec).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].failure, Some(FailureKind::Timeout));
        assert!(result.error.unwrap().contains("Dashboard-active-organization"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_missing_element_fails_step() {
        let spec = ScenarioSpec::from_yaml(
            "name: click\nsteps:\n  - action: click\n    affordance: Avatar-Dropdown\n",
        )
        .unwrap();

        let result = runner().run_spec(&spec).await.unwrap();
        assert!(!result.success);
        assert!(result.steps[0].verification.is_none());
        assert_eq!(result.steps[0].failure, Some(FailureKind::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_affordance_fails_without_waiting() {
        let spec = ScenarioSpec::from_yaml(
            "name: unknown\nsteps:\n  - action: verify\n    affordance: billing\n",
        )
        .unwrap();

        let start = Instant::now();
        let suite = runner().run_specs(&[spec]).await;
        assert_eq!(suite.failed, 1);
        assert!(suite.results[0].error.as_deref().unwrap().contains("billing"));
        assert_eq!(suite.results[0].steps[0].failure, Some(FailureKind::Error));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let suite = TestSuiteResult {
            total: 0,
            passed: 0,
            failed: 0,
            duration_ms: 0,
            results: vec![],
        };
        let path = write_results(&dir.path().join("nested"), &suite).unwrap();
        assert!(path.ends_with("test-results.json"));
        assert!(std::fs::read_to_string(path).unwrap().contains("\"total\": 0"));
    }

    #[test]
    fn test_failure_kind_classification() {
        let missing_group = E2eError::Rules(gatecheck_common::Error::MissingPrivilegeGroup {
            group: "profile-dropdown".to_string(),
        });
        assert_eq!(FailureKind::from(&missing_group), FailureKind::RuleResolution);

        let unknown = E2eError::Rules(gatecheck_common::Error::UnknownAffordance("billing".into()));
        assert_eq!(FailureKind::from(&unknown), FailureKind::Error);

        let timeout = E2eError::CorrelationTimeout {
            fragment: "get-role".to_string(),
            window_ms: 10_000,
        };
        assert_eq!(FailureKind::from(&timeout), FailureKind::Timeout);

        let mismatch = E2eError::VerificationMismatch {
            affordance: "archive".to_string(),
            expected: "not visible".to_string(),
            observed: "visible".to_string(),
        };
        assert_eq!(FailureKind::from(&mismatch), FailureKind::Mismatch);
    }

    #[tokio::test]
    async fn test_run_all_with_missing_directory_fails() {
        let runner = ScenarioRunner::new(
            EmptyPage,
            RuleTable::admin_dashboard(),
            RunnerConfig {
                specs_dir: PathBuf::from("/nonexistent/gatecheck-scenarios"),
                ..Default::default()
            },
        );
        assert!(matches!(runner.run_all().await, Err(E2eError::Io(_))));
    }
}
