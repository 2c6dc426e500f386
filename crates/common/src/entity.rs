//! Entity identifiers and classification
//!
//! The backend never tags organizations and workspaces explicitly. The kind
//! is carried by a token embedded in the identifier itself (`org_` or `ws_`),
//! so classification happens once here and the rest of the crate matches on
//! [`EntityId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token marking an organization identifier
pub const ORGANIZATION_TOKEN: &str = "org_";

/// Token marking a workspace identifier
pub const WORKSPACE_TOKEN: &str = "ws_";

/// Semantic kind of an entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    Workspace,
    Unknown,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Workspace => "workspace",
            EntityKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw identifier.
///
/// The organization token is checked first; `None` and identifiers carrying
/// neither token are [`EntityKind::Unknown`].
pub fn classify(identifier: Option<&str>) -> EntityKind {
    match identifier {
        Some(id) if id.contains(ORGANIZATION_TOKEN) => EntityKind::Organization,
        Some(id) if id.contains(WORKSPACE_TOKEN) => EntityKind::Workspace,
        _ => EntityKind::Unknown,
    }
}

/// An identifier tagged with its kind at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Organization(String),
    Workspace(String),
    Opaque(String),
}

impl EntityId {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match classify(Some(&raw)) {
            EntityKind::Organization => EntityId::Organization(raw),
            EntityKind::Workspace => EntityId::Workspace(raw),
            EntityKind::Unknown => EntityId::Opaque(raw),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Organization(_) => EntityKind::Organization,
            EntityId::Workspace(_) => EntityKind::Workspace,
            EntityId::Opaque(_) => EntityKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Organization(id) | EntityId::Workspace(id) | EntityId::Opaque(id) => id,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
