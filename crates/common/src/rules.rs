//! Visibility rules
//!
//! A [`RuleTable`] maps affordance names to declarative [`Rule`]s. Evaluating
//! a rule is a pure function of the evidence in an [`EvaluationContext`]:
//! client settings, indexed role privileges, the user snapshot and the active
//! entity. Nothing here performs I/O or waits; gathering the evidence is the
//! caller's job, guided by [`AffordanceRule::requirements`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::entity::{EntityId, EntityKind};
use crate::error::{Error, Result};
use crate::privileges::PrivilegeIndex;
use crate::types::{ClientSettings, User};

/// Privilege group holding the avatar dropdown actions
pub const PROFILE_DROPDOWN_GROUP: &str = "profile-dropdown";

/// Organization for which the dropdown overview entry is never offered
pub const EXCLUDED_OVERVIEW_ORGANIZATION: &str = "ZEE AUTO SHOW";

/// Built-in rule table for the admin dashboard
pub static ADMIN_DASHBOARD: Lazy<RuleTable> = Lazy::new(RuleTable::admin_dashboard);

fn default_group() -> String {
    PROFILE_DROPDOWN_GROUP.to_string()
}

/// Evidence a rule needs before it can be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    ClientSettings,
    RolePrivileges,
    User,
    ActiveEntity,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::ClientSettings => write!(f, "client settings"),
            Requirement::RolePrivileges => write!(f, "role privileges"),
            Requirement::User => write!(f, "user"),
            Requirement::ActiveEntity => write!(f, "active entity"),
        }
    }
}

/// Visibility predicate for one affordance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Rendered for every user of this role tier
    Always,

    /// Never exposed to this role tier, whatever the backend says
    Never,

    /// Gated by a client feature permission
    Permission { permission: String },

    /// Gated by a role action toggle
    RoleAction {
        #[serde(default = "default_group")]
        group: String,
        action: String,
    },

    /// Gated by the active entity kind, a role action toggle and optionally
    /// the active entity's display name
    EntityScoped {
        scope: EntityKind,
        #[serde(default = "default_group")]
        group: String,
        action: String,
        #[serde(default)]
        excluded_names: Vec<String>,
    },

    /// Visible when the user has linked a social profile
    SocialProfileLinked,
}

impl Rule {
    fn requirements(&self) -> Vec<Requirement> {
        match self {
            Rule::Always | Rule::Never => vec![],
            Rule::Permission { .. } => vec![Requirement::ClientSettings],
            Rule::RoleAction { .. } => vec![Requirement::RolePrivileges],
            Rule::EntityScoped { excluded_names, .. } => {
                let mut reqs = vec![Requirement::RolePrivileges, Requirement::ActiveEntity];
                if !excluded_names.is_empty() {
                    reqs.push(Requirement::User);
                }
                reqs
            }
            Rule::SocialProfileLinked => vec![Requirement::User],
        }
    }
}

/// Where the expected display text comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Text is not validated
    #[default]
    Unchecked,
    Fixed(String),
    UserName,
    UserEmail,
    UserInitial,
}

impl TextSource {
    fn requirements(&self) -> Vec<Requirement> {
        match self {
            TextSource::Unchecked | TextSource::Fixed(_) => vec![],
            TextSource::UserName | TextSource::UserEmail | TextSource::UserInitial => {
                vec![Requirement::User]
            }
        }
    }
}

/// A named affordance with its rule and expected text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordanceRule {
    pub name: String,
    pub rule: Rule,
    #[serde(default)]
    pub text: TextSource,
}

/// Computed entitlement for one affordance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_text: Option<String>,
}

impl Expectation {
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            visible: true,
            expected_text: Some(text.into()),
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            expected_text: None,
        }
    }
}

/// Evidence available to rule evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    pub settings: Option<&'a ClientSettings>,
    pub privileges: Option<&'a PrivilegeIndex>,
    pub user: Option<&'a User>,
    pub active_entity: Option<&'a EntityId>,
}

impl<'a> EvaluationContext<'a> {
    fn require<T>(&self, value: Option<T>, affordance: &str, requirement: Requirement) -> Result<T> {
        value.ok_or_else(|| Error::MissingEvidence {
            affordance: affordance.to_string(),
            requirement: requirement.to_string(),
        })
    }

    fn settings(&self, affordance: &str) -> Result<&'a ClientSettings> {
        self.require(self.settings, affordance, Requirement::ClientSettings)
    }

    fn privileges(&self, affordance: &str) -> Result<&'a PrivilegeIndex> {
        self.require(self.privileges, affordance, Requirement::RolePrivileges)
    }

    fn user(&self, affordance: &str) -> Result<&'a User> {
        self.require(self.user, affordance, Requirement::User)
    }

    fn active_entity(&self, affordance: &str) -> Result<&'a EntityId> {
        self.require(self.active_entity, affordance, Requirement::ActiveEntity)
    }
}

impl AffordanceRule {
    pub fn new(name: impl Into<String>, rule: Rule, text: TextSource) -> Self {
        Self {
            name: name.into(),
            rule,
            text,
        }
    }

    /// Evidence needed to evaluate this affordance, sorted and deduplicated
    pub fn requirements(&self) -> Vec<Requirement> {
        let mut reqs = self.rule.requirements();
        reqs.extend(self.text.requirements());
        reqs.sort();
        reqs.dedup();
        reqs
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Expectation> {
        let visible = self.evaluate_visibility(ctx)?;
        let expected_text = self.evaluate_text(ctx)?;
        debug!("Rule {} evaluated: visible={}", self.name, visible);
        Ok(Expectation {
            visible,
            expected_text,
        })
    }

    fn evaluate_visibility(&self, ctx: &EvaluationContext<'_>) -> Result<bool> {
        let name = self.name.as_str();
        match &self.rule {
            Rule::Always => Ok(true),
            Rule::Never => Ok(false),
            Rule::Permission { permission } => Ok(ctx.settings(name)?.is_enabled(permission)),
            Rule::RoleAction { group, action } => ctx.privileges(name)?.toggle(group, action),
            Rule::EntityScoped {
                scope,
                group,
                action,
                excluded_names,
            } => {
                let enabled = ctx.privileges(name)?.toggle(group, action)?;
                let active = ctx.active_entity(name)?;
                if active.kind() != *scope {
                    return Ok(false);
                }
                if excluded_names.is_empty() {
                    return Ok(enabled);
                }
                let entity_name = ctx
                    .user(name)?
                    .entity_name(active.kind(), active.as_str())
                    .ok_or_else(|| Error::EntityNotFound {
                        kind: active.kind().to_string(),
                        id: active.as_str().to_string(),
                    })?;
                Ok(enabled && !excluded_names.iter().any(|n| n == entity_name))
            }
            Rule::SocialProfileLinked => Ok(ctx.user(name)?.has_social_profile()),
        }
    }

    fn evaluate_text(&self, ctx: &EvaluationContext<'_>) -> Result<Option<String>> {
        let name = self.name.as_str();
        Ok(match &self.text {
            TextSource::Unchecked => None,
            TextSource::Fixed(label) => Some(label.clone()),
            TextSource::UserName => Some(ctx.user(name)?.name.clone()),
            TextSource::UserEmail => Some(ctx.user(name)?.email.clone()),
            TextSource::UserInitial => Some(ctx.user(name)?.initial()),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct RuleTableFile {
    #[serde(default)]
    role: String,
    #[serde(default, rename = "affordance")]
    affordances: Vec<AffordanceRule>,
}

/// Declarative rule table keyed by affordance name
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    role: String,
    rules: Vec<AffordanceRule>,
    by_name: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new(role: impl Into<String>, rules: Vec<AffordanceRule>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if let Rule::EntityScoped { scope, .. } = &rule.rule {
                if *scope == EntityKind::Unknown {
                    return Err(Error::InvalidConfig(format!(
                        "{}: entity_scoped rules must target organization or workspace",
                        rule.name
                    )));
                }
            }
            if by_name.insert(rule.name.clone(), i).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "duplicate affordance: {}",
                    rule.name
                )));
            }
        }
        Ok(Self {
            role: role.into(),
            rules,
            by_name,
        })
    }

    /// Parse a rule table from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RuleTableFile = toml::from_str(content)?;
        Self::new(file.role, file.affordances)
    }

    /// Load a rule table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        let file = RuleTableFile {
            role: self.role.clone(),
            affordances: self.rules.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn rules(&self) -> &[AffordanceRule] {
        &self.rules
    }

    pub fn get(&self, affordance: &str) -> Result<&AffordanceRule> {
        self.by_name
            .get(affordance)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| Error::UnknownAffordance(affordance.to_string()))
    }

    pub fn evaluate(&self, affordance: &str, ctx: &EvaluationContext<'_>) -> Result<Expectation> {
        self.get(affordance)?.evaluate(ctx)
    }

    /// Evaluate every rule, in table order
    pub fn evaluate_all(&self, ctx: &EvaluationContext<'_>) -> Vec<(String, Result<Expectation>)> {
        self.rules
            .iter()
            .map(|rule| (rule.name.clone(), rule.evaluate(ctx)))
            .collect()
    }

    /// Rules for the admin dashboard navigation and avatar dropdown
    pub fn admin_dashboard() -> Self {
        use Rule::*;

        let fixed = |label: &str| TextSource::Fixed(label.to_string());
        let permission = |p: &str| Permission {
            permission: p.to_string(),
        };
        let role_action = |a: &str| RoleAction {
            group: default_group(),
            action: a.to_string(),
        };
        let scoped = |scope: EntityKind, a: &str, excluded: &[&str]| EntityScoped {
            scope,
            group: default_group(),
            action: a.to_string(),
            excluded_names: excluded.iter().map(|s| s.to_string()).collect(),
        };

        let rules = vec![
            AffordanceRule::new("dashboard", Always, fixed("Home")),
            AffordanceRule::new("videos", Always, fixed("Videos")),
            AffordanceRule::new("my-highlights", Always, fixed("Highlights")),
            AffordanceRule::new("rule-listing", permission("ruleManagement"), fixed("Rules")),
            AffordanceRule::new("archive", permission("showArchival"), fixed("Archive")),
            AffordanceRule::new("studio", permission("advanceEditor"), fixed("Studio")),
            AffordanceRule::new("configuration/category", role_action("settings"), fixed("Settings")),
            AffordanceRule::new("overview", Never, fixed("Overview")),
            AffordanceRule::new("organizations", Never, fixed("Organizations")),
            AffordanceRule::new("users", Never, fixed("Users")),
            AffordanceRule::new("ops", Never, fixed("Ops")),
            AffordanceRule::new("Process", Always, fixed("Process")),
            AffordanceRule::new("Profile-PopOver", Always, TextSource::Unchecked),
            AffordanceRule::new("Avatar-Dropdown", Always, TextSource::Unchecked),
            AffordanceRule::new("Logout", Always, fixed("Logout")),
            AffordanceRule::new("profile", role_action("profile"), fixed("Profile")),
            AffordanceRule::new(
                "dropdown-overview",
                scoped(
                    EntityKind::Organization,
                    "profile",
                    &[EXCLUDED_OVERVIEW_ORGANIZATION],
                ),
                fixed("Overview"),
            ),
            AffordanceRule::new(
                "organization-profile",
                scoped(EntityKind::Organization, "user_management", &[]),
                fixed("Organization Profile"),
            ),
            AffordanceRule::new(
                "workspace-profile",
                scoped(EntityKind::Workspace, "user_management", &[]),
                fixed("Workspace Profile"),
            ),
            AffordanceRule::new("user-avatar", Always, TextSource::UserInitial),
            AffordanceRule::new("user-userName", Always, TextSource::UserName),
            AffordanceRule::new("user-userEmail", Always, TextSource::UserEmail),
            AffordanceRule::new(
                "roles-permission",
                role_action("permission_management"),
                fixed("Roles & Permission"),
            ),
            AffordanceRule::new("workspace", Never, fixed("Workspace Management")),
            AffordanceRule::new("user-management", Never, fixed("User Management")),
            AffordanceRule::new("configuration", Never, fixed("Configuration")),
            AffordanceRule::new("publish-history", SocialProfileLinked, fixed("Publish History")),
        ];

        // Names above are unique and no rule targets EntityKind::Unknown
        let by_name = rules
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        Self {
            role: "admin".to_string(),
            rules,
            by_name,
        }
    }
}
