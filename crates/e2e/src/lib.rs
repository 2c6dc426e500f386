//! Gatecheck verification framework
//!
//! This crate confirms computed entitlements against a live UI:
//! - Correlates asynchronously arriving backend responses by URL and status
//! - Fetches client settings, role privileges and the user once per scenario
//! - Evaluates the visibility rules from `gatecheck-common`
//! - Polls the UI up to a deadline and judges expected against observed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SessionFactory::open() -> Session { surface, responses }   │
//! │  per step:                                                   │
//! │    ├── click { affordance }        -> UiSurface::click      │
//! │    ├── capture_active_entity       -> popover + data-key    │
//! │    └── verify { affordance }                                │
//! │          ├── RuleTable::get -> requirements                 │
//! │          ├── ScenarioEvidence (EvidenceCorrelator, lazy)    │
//! │          ├── AffordanceRule::evaluate -> Expectation        │
//! │          └── VisibilityVerifier::verify -> Result           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod correlator;
pub mod error;
pub mod evidence;
pub mod runner;
pub mod scenario;
pub mod scripted;
pub mod surface;
pub mod verifier;

pub use correlator::{response_stream, status_is, BackendResponse, EvidenceCorrelator};
pub use error::{E2eError, E2eResult};
pub use runner::{FailureKind, RunnerConfig, ScenarioRunner, StepResult, TestResult, TestSuiteResult};
pub use scenario::{ScenarioSpec, ScenarioStep};
pub use surface::{Session, SessionFactory, UiSurface};
pub use verifier::{Outcome, VerificationResult, VisibilityVerifier};
