//! Wire types for the backend exchanges Gatecheck correlates against

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entity::EntityKind;

/// Every backend body wraps its payload in `data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Authenticated user snapshot (`me`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id", alias = "userId")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub entity: UserEntities,
    #[serde(default)]
    pub social_profile_key: Option<String>,
}

impl User {
    /// First character of the name, upper-cased, as rendered in the avatar
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }

    pub fn has_social_profile(&self) -> bool {
        self.social_profile_key
            .as_deref()
            .map_or(false, |key| !key.is_empty())
    }

    /// Find the display name of an organization or workspace by id
    pub fn entity_name(&self, kind: EntityKind, id: &str) -> Option<&str> {
        match kind {
            EntityKind::Organization => self
                .entity
                .organizations
                .iter()
                .find(|o| o.id == id)
                .map(|o| o.name.as_str()),
            EntityKind::Workspace => self
                .entity
                .workspaces
                .iter()
                .find(|w| w.id == id)
                .map(|w| w.name.as_str()),
            EntityKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserEntities {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "organizationId", alias = "id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(rename = "workspaceId", alias = "id")]
    pub id: String,
    pub name: String,
}

/// Role details (`get-role`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetails {
    #[serde(default)]
    pub role_privileges: Vec<RolePrivilege>,
}

/// A named privilege group, e.g. `profile-dropdown`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePrivilege {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A single action inside a privilege group.
///
/// `toggle` stays optional on the wire; use
/// [`resolve_toggle`](crate::privileges::resolve_toggle) to turn it into a
/// decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub value: String,
    #[serde(default)]
    pub toggle: Option<bool>,
}

/// Client feature settings (`get-client-settings`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub permissions: HashMap<String, bool>,
}

impl ClientSettings {
    /// A permission is enabled only when explicitly `true`
    pub fn is_enabled(&self, permission: &str) -> bool {
        self.permissions.get(permission).copied().unwrap_or(false)
    }
}
