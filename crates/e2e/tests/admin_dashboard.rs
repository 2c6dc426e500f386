//! Admin dashboard scenarios played against a scripted page
//!
//! Each scenario opens a fresh page whose backend responses arrive on their
//! own schedule, independently of the UI elements rendering.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use gatecheck_common::ADMIN_DASHBOARD;
use gatecheck_e2e::scripted::{ClickEffect, ScriptedElement, ScriptedSurface};
use gatecheck_e2e::verifier::Mismatch;
use gatecheck_e2e::{
    response_stream, BackendResponse, E2eResult, FailureKind, Outcome, RunnerConfig, ScenarioRunner,
    ScenarioSpec, Session, SessionFactory,
};

const API: &str = "https://api.dashboard.test/v1";

struct DashboardPage {
    settings: Option<Value>,
    role: Option<Value>,
    user: Value,
    active_entity: &'static str,
    rendered: Vec<(&'static str, &'static str)>,
}

impl DashboardPage {
    fn new() -> Self {
        Self {
            settings: Some(json!({ "permissions": { "ruleManagement": true, "showArchival": false } })),
            role: Some(json!({ "rolePrivileges": [
                { "name": "profile-dropdown", "actions": [
                    { "value": "settings", "toggle": true },
                    { "value": "profile", "toggle": true },
                    { "value": "user_management" },
                    { "value": "permission_management", "toggle": false }
                ] }
            ] })),
            user: json!({
                "name": "meera",
                "email": "meera@example.com",
                "entity": {
                    "organizations": [{ "organizationId": "org_42", "name": "FANCODE" }],
                    "workspaces": [{ "workspaceId": "ws_7", "name": "Cricket" }]
                }
            }),
            active_entity: "org_42",
            rendered: vec![],
        }
    }

    fn render(mut self, affordance: &'static str, text: &'static str) -> Self {
        self.rendered.push((affordance, text));
        self
    }
}

#[async_trait]
impl SessionFactory for DashboardPage {
    async fn open(&self, _scenario: &ScenarioSpec) -> E2eResult<Session> {
        let (recorder, responses) = response_stream();

        let mut surface = ScriptedSurface::new(recorder)
            .with_element(ScriptedElement::new("Dashboard-admin-Profile-PopOver"))
            .with_element(ScriptedElement::new("Dashboard-admin-Avatar-Dropdown"))
            .with_element(
                ScriptedElement::new("Dashboard-active-organization")
                    .attribute("data-key", self.active_entity)
                    .hidden(),
            )
            .on_click(
                "Dashboard-admin-Profile-PopOver",
                ClickEffect::Toggle {
                    test_id: "Dashboard-active-organization".to_string(),
                    delay: Duration::from_millis(50),
                },
            );

        if let Some(role) = &self.role {
            surface = surface.on_click(
                "Dashboard-admin-Avatar-Dropdown",
                ClickEffect::Respond {
                    response: BackendResponse::with_data(format!("{API}/get-role"), 200, role.clone()),
                    delay: Duration::from_millis(120),
                },
            );
        }

        for (affordance, text) in &self.rendered {
            surface = surface.with_element(
                ScriptedElement::new(format!("Dashboard-admin-{affordance}"))
                    .text(*text)
                    .appears_after(Duration::from_millis(300)),
            );
        }

        surface.emit_after(
            BackendResponse::with_data(format!("{API}/me"), 200, self.user.clone()),
            Duration::from_millis(80),
        );
        if let Some(settings) = &self.settings {
            // A failed attempt first; only the successful one may match
            surface.emit_after(
                BackendResponse::new(format!("{API}/get-client-settings"), 502, "bad gateway"),
                Duration::from_millis(100),
            );
            surface.emit_after(
                BackendResponse::with_data(format!("{API}/get-client-settings"), 200, settings.clone()),
                Duration::from_millis(400),
            );
        }

        Ok(Session {
            surface: Arc::new(surface),
            responses,
        })
    }
}

fn runner(page: DashboardPage) -> ScenarioRunner<DashboardPage> {
    ScenarioRunner::new(page, ADMIN_DASHBOARD.clone(), RunnerConfig::default())
}

fn scenario(yaml: &str) -> ScenarioSpec {
    ScenarioSpec::from_yaml(yaml).unwrap()
}

#[tokio::test(start_paused = true)]
async fn rules_icon_shown_when_rule_management_enabled() {
    let runner = runner(DashboardPage::new().render("rule-listing", "Rules"));
    let spec = scenario(
        "name: rules-icon\nsteps:\n  - action: verify\n    affordance: rule-listing\n",
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
    let verification = result.steps[0].verification.as_ref().unwrap();
    assert!(verification.expected.visible);
    assert_eq!(verification.observed.text.as_deref(), Some("Rules"));
}

#[tokio::test(start_paused = true)]
async fn archive_icon_rendered_without_permission_fails() {
    let runner = runner(DashboardPage::new().render("archive", "Archive"));
    let spec = scenario("name: archive-icon\nsteps:\n  - action: verify\n    affordance: archive\n");

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(!result.success);
    let verification = result.steps[0].verification.as_ref().unwrap();
    assert_eq!(verification.outcome, Outcome::Fail(Mismatch::UnexpectedlyVisible));
    assert_eq!(result.steps[0].failure, Some(FailureKind::Mismatch));
    assert!(result.error.unwrap().contains("archive"));
}

#[tokio::test(start_paused = true)]
async fn settings_icon_uses_role_fetched_after_click() {
    let runner = runner(DashboardPage::new().render("configuration/category", "Settings"));
    let spec = scenario(
        r#"
name: settings-icon
steps:
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: configuration/category
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test(start_paused = true)]
async fn role_exchange_never_triggered_times_out() {
    let runner = runner(DashboardPage::new().render("profile", "Profile"));
    let spec = scenario("name: no-click\nsteps:\n  - action: verify\n    affordance: profile\n");

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(!result.success);
    assert!(result.steps[0].verification.is_none());
    assert_eq!(result.steps[0].failure, Some(FailureKind::Timeout));
    assert!(result.error.unwrap().contains("get-role"));
}

#[tokio::test(start_paused = true)]
async fn dropdown_overview_in_allowed_organization() {
    let runner = runner(DashboardPage::new().render("dropdown-overview", "Overview"));
    let spec = scenario(
        r#"
name: dropdown-overview
steps:
  - action: capture_active_entity
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: dropdown-overview
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test(start_paused = true)]
async fn dropdown_overview_absent_for_excluded_organization() {
    let mut page = DashboardPage::new();
    page.user["entity"]["organizations"][0]["name"] = json!("ZEE AUTO SHOW");
    let runner = runner(page);
    let spec = scenario(
        r#"
name: dropdown-overview-excluded
steps:
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: dropdown-overview
"#,
    );

    let started = tokio::time::Instant::now();
    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);

    let verification = result.steps[1].verification.as_ref().unwrap();
    assert!(!verification.expected.visible);
    assert!(verification.elapsed_ms >= 2500);
    assert!(started.elapsed() >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn workspace_profile_hidden_in_organization_context() {
    let runner = runner(DashboardPage::new());
    let spec = scenario(
        r#"
name: workspace-profile
steps:
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: workspace-profile
  - action: verify
    affordance: organization-profile
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.steps.len(), 3);
    assert!(result.steps[1..]
        .iter()
        .all(|step| !step.verification.as_ref().unwrap().observed.visible));
}

#[tokio::test(start_paused = true)]
async fn missing_privilege_group_aborts_scenario() {
    let mut page = DashboardPage::new().render("profile", "Profile");
    page.role = Some(json!({ "rolePrivileges": [{ "name": "navbar", "actions": [] }] }));
    let runner = runner(page);
    let spec = scenario(
        r#"
name: broken-role
steps:
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: profile
  - action: verify
    affordance: Logout
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[1].failure, Some(FailureKind::RuleResolution));
    assert!(result.error.unwrap().contains("profile-dropdown"));
}

#[tokio::test(start_paused = true)]
async fn never_rules_need_no_backend() {
    let mut page = DashboardPage::new();
    page.settings = None;
    page.role = None;
    let runner = runner(page);
    let spec = scenario(
        r#"
name: hidden-admin-tools
steps:
  - action: verify
    affordance: users
  - action: verify
    affordance: user-management
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test(start_paused = true)]
async fn user_details_from_me_exchange() {
    let runner = runner(
        DashboardPage::new()
            .render("user-avatar", "M")
            .render("user-userName", "meera")
            .render("user-userEmail", "meera@example.com"),
    );
    let spec = scenario(
        r#"
name: avatar-details
steps:
  - action: click
    affordance: Avatar-Dropdown
  - action: verify
    affordance: user-avatar
  - action: verify
    affordance: user-userName
  - action: verify
    affordance: user-userEmail
"#,
    );

    let result = runner.run_spec(&spec).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test(start_paused = true)]
async fn suite_results_are_counted_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let specs_dir = dir.path().join("scenarios");
    std::fs::create_dir_all(&specs_dir).unwrap();
    std::fs::write(
        specs_dir.join("rules.yaml"),
        "name: rules\ntags: [navbar]\nsteps:\n  - action: verify\n    affordance: rule-listing\n",
    )
    .unwrap();
    std::fs::write(
        specs_dir.join("studio.yaml"),
        "name: studio\ntags: [navbar]\nsteps:\n  - action: verify\n    affordance: studio\n",
    )
    .unwrap();
    std::fs::write(
        specs_dir.join("logout.yaml"),
        "name: logout\ntags: [dropdown]\nsteps:\n  - action: verify\n    affordance: Logout\n",
    )
    .unwrap();

    // studio is rendered although advanceEditor is absent from the permissions
    let page = DashboardPage::new()
        .render("rule-listing", "Rules")
        .render("studio", "Studio");
    let runner = ScenarioRunner::new(
        page,
        ADMIN_DASHBOARD.clone(),
        RunnerConfig {
            specs_dir,
            output_dir: dir.path().join("out"),
            ..Default::default()
        },
    );

    let suite = runner.run_tagged("navbar").await.unwrap();
    assert_eq!(suite.total, 2);
    assert_eq!(suite.passed, 1);
    assert_eq!(suite.failed, 1);

    let all = runner.run_all().await.unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.failed, 2);

    let path = runner.write_results(&all).unwrap();
    let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written["total"], 3);
}

#[test]
fn bundled_scenarios_reference_known_affordances() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios");
    let specs = ScenarioSpec::load_all(&dir).unwrap();
    assert!(!specs.is_empty());

    for spec in &specs {
        for step in &spec.steps {
            if let gatecheck_e2e::ScenarioStep::Verify { affordance, .. } = step {
                assert!(ADMIN_DASHBOARD.get(affordance).is_ok(), "{}: {}", spec.name, affordance);
            }
        }
    }
}
