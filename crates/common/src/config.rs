//! Gatecheck configuration
//!
//! Loaded once at startup and treated as read-only afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::rules::{RuleTable, ADMIN_DASHBOARD};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatecheckConfig {
    /// Optional TOML rule table replacing the built-in admin dashboard rules
    pub rules_path: Option<PathBuf>,

    /// How affordances are addressed in the UI
    pub surface: SurfaceConfig,

    /// Backend exchanges to correlate against
    pub exchanges: ExchangeConfig,

    /// Deadlines and polling cadence
    pub timing: TimingConfig,
}

/// UI addressing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Leading segment of every affordance test id
    pub test_id_prefix: String,

    /// Role segment of every affordance test id
    pub role: String,

    /// Test id of the element carrying the active entity
    pub active_entity_test_id: String,

    /// Attribute holding the active entity identifier
    pub active_entity_attribute: String,

    /// Affordance that reveals the active entity element when clicked
    pub active_entity_toggle: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            test_id_prefix: "Dashboard".to_string(),
            role: "admin".to_string(),
            active_entity_test_id: "Dashboard-active-organization".to_string(),
            active_entity_attribute: "data-key".to_string(),
            active_entity_toggle: "Profile-PopOver".to_string(),
        }
    }
}

impl SurfaceConfig {
    /// Test id for an affordance, e.g. `Dashboard-admin-rule-listing`
    pub fn test_id(&self, affordance: &str) -> String {
        format!("{}-{}-{}", self.test_id_prefix, self.role, affordance)
    }
}

/// Backend exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// URL fragment of the client settings exchange
    pub client_settings: String,

    /// URL fragment of the role details exchange
    pub role: String,

    /// URL fragment of the current user exchange
    pub user: String,

    /// Status code treated as success
    pub success_status: u16,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            client_settings: "get-client-settings".to_string(),
            role: "get-role".to_string(),
            user: "me".to_string(),
            success_status: 200,
        }
    }
}

/// Timing configuration, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Shared deadline for a single visibility verification
    pub verify_deadline_ms: u64,

    /// Interval between visibility polls
    pub poll_interval_ms: u64,

    /// Window for a backend exchange to arrive
    pub correlation_window_ms: u64,

    /// Deadline for the active entity element to render
    pub active_entity_deadline_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            verify_deadline_ms: 2500,
            poll_interval_ms: 100,
            correlation_window_ms: 10_000,
            active_entity_deadline_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn verify_deadline(&self) -> Duration {
        Duration::from_millis(self.verify_deadline_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn correlation_window(&self) -> Duration {
        Duration::from_millis(self.correlation_window_ms)
    }

    pub fn active_entity_deadline(&self) -> Duration {
        Duration::from_millis(self.active_entity_deadline_ms)
    }
}

impl GatecheckConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured rule table, or the built-in admin dashboard table
    pub fn rule_table(&self) -> Result<RuleTable> {
        match &self.rules_path {
            Some(path) => RuleTable::load(path),
            None => Ok(ADMIN_DASHBOARD.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_id() {
        let surface = SurfaceConfig::default();
        assert_eq!(surface.test_id("rule-listing"), "Dashboard-admin-rule-listing");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatecheckConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timing.verify_deadline_ms, 2500);
        assert_eq!(config.exchanges.success_status, 200);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatecheck.toml");
        std::fs::write(&path, "[timing]\nverify_deadline_ms = 4000\n").unwrap();

        let config = GatecheckConfig::load(&path).unwrap();
        assert_eq!(config.timing.verify_deadline_ms, 4000);
        assert_eq!(config.timing.poll_interval_ms, 100);
        assert_eq!(config.surface.role, "admin");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gatecheck.toml");
        let mut config = GatecheckConfig::default();
        config.surface.role = "superadmin".to_string();
        config.save(&path).unwrap();

        let loaded = GatecheckConfig::load(&path).unwrap();
        assert_eq!(loaded.surface.role, "superadmin");
        assert!(loaded.rules_path.is_none());
    }

    #[test]
    fn test_rule_table_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "role = \"viewer\"\n[[affordance]]\nname = \"ops\"\nrule = { kind = \"never\" }\n",
        )
        .unwrap();

        let config = GatecheckConfig {
            rules_path: Some(path),
            ..Default::default()
        };
        let table = config.rule_table().unwrap();
        assert_eq!(table.role(), "viewer");
        assert_eq!(table.rules().len(), 1);
        assert_eq!(GatecheckConfig::default().rule_table().unwrap().role(), "admin");
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config: GatecheckConfig =
            toml::from_str(include_str!("../../../gatecheck.example.toml")).unwrap();
        let defaults = GatecheckConfig::default();

        assert!(config.rules_path.is_none());
        assert_eq!(config.surface.test_id("Logout"), defaults.surface.test_id("Logout"));
        assert_eq!(config.exchanges.user, defaults.exchanges.user);
        assert_eq!(config.timing.verify_deadline(), defaults.timing.verify_deadline());
        assert_eq!(config.timing.correlation_window(), defaults.timing.correlation_window());
    }
}
