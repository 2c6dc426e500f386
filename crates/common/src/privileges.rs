//! Typed privilege lookup
//!
//! `get-role` returns a list of privilege groups, each holding a list of
//! actions. The list is flattened once at ingestion into a map keyed by
//! `(group, action)`, so rule evaluation never scans it again and a missing
//! group is distinguishable from a missing action.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Action, RoleDetails, RolePrivilege};

/// Default policy for an action's toggle: absent means disabled.
///
/// A missing `toggle` field is a legitimate default, unlike a missing group
/// or action, which are contract breaks and surface as errors from
/// [`PrivilegeIndex::toggle`].
pub fn resolve_toggle(action: &Action) -> bool {
    action.toggle.unwrap_or(false)
}

/// `(group, action) -> toggle` index built from role privileges
#[derive(Debug, Clone, Default)]
pub struct PrivilegeIndex {
    groups: HashSet<String>,
    toggles: HashMap<(String, String), bool>,
}

impl PrivilegeIndex {
    pub fn new(privileges: &[RolePrivilege]) -> Self {
        let mut index = Self::default();
        for privilege in privileges {
            index.groups.insert(privilege.name.clone());
            for action in &privilege.actions {
                // First occurrence wins, matching a linear find
                index
                    .toggles
                    .entry((privilege.name.clone(), action.value.clone()))
                    .or_insert_with(|| resolve_toggle(action));
            }
        }
        debug!(
            "Indexed {} privilege groups, {} actions",
            index.groups.len(),
            index.toggles.len()
        );
        index
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Resolved toggle for an action in a group
    pub fn toggle(&self, group: &str, action: &str) -> Result<bool> {
        if !self.has_group(group) {
            return Err(Error::MissingPrivilegeGroup {
                group: group.to_string(),
            });
        }
        self.toggles
            .get(&(group.to_string(), action.to_string()))
            .copied()
            .ok_or_else(|| Error::MissingAction {
                group: group.to_string(),
                action: action.to_string(),
            })
    }
}

impl From<&RoleDetails> for PrivilegeIndex {
    fn from(role: &RoleDetails) -> Self {
        Self::new(&role.role_privileges)
    }
}
