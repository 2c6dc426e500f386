//! Expect Command
//!
//! Evaluates rules against backend responses captured to JSON files, either
//! as the raw `{ "data": ... }` envelope or as the bare payload.

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use gatecheck_common::{
    ClientSettings, EntityId, EvaluationContext, Expectation, GatecheckConfig, PrivilegeIndex,
    RoleDetails, User,
};

use crate::output::{print_list, print_warning, yes_no, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ExpectArgs {
    /// Captured client settings response
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Captured role details response
    #[arg(long)]
    pub role: Option<PathBuf>,

    /// Captured current user response
    #[arg(long)]
    pub user: Option<PathBuf>,

    /// Active organization or workspace identifier
    #[arg(long)]
    pub active_entity: Option<String>,

    /// Only evaluate these affordances
    #[arg(short, long)]
    pub affordance: Vec<String>,
}

#[derive(Serialize)]
pub struct ExpectationDisplay {
    pub affordance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectation: Option<Expectation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableDisplay for ExpectationDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Affordance", "Visible", "Text", "Error"]
    }

    fn row(&self) -> Vec<String> {
        let (visible, text) = match &self.expectation {
            Some(e) => (
                yes_no(e.visible),
                e.expected_text.clone().unwrap_or_else(|| "-".to_string()),
            ),
            None => ("?".to_string(), "-".to_string()),
        };
        vec![
            self.affordance.clone(),
            visible,
            text,
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Read a captured response body, unwrapping the `data` envelope if present
pub fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let value = if value.get("data").is_some() {
        value["data"].take()
    } else {
        value
    };
    serde_json::from_value(value).with_context(|| format!("Unexpected shape in {}", path.display()))
}

fn load<T: DeserializeOwned>(path: Option<&PathBuf>) -> Result<Option<T>> {
    path.map(|p| {
        debug!("Loading {}", p.display());
        read_payload(p)
    })
    .transpose()
}

pub fn execute(args: ExpectArgs, settings: &GatecheckConfig, format: OutputFormat) -> Result<()> {
    let table = settings.rule_table()?;

    let client_settings: Option<ClientSettings> = load(args.settings.as_ref())?;
    let privileges = load::<RoleDetails>(args.role.as_ref())?.map(|role| PrivilegeIndex::from(&role));
    let user: Option<User> = load(args.user.as_ref())?;
    let active_entity = args.active_entity.map(EntityId::parse);

    let ctx = EvaluationContext {
        settings: client_settings.as_ref(),
        privileges: privileges.as_ref(),
        user: user.as_ref(),
        active_entity: active_entity.as_ref(),
    };

    let evaluated = if args.affordance.is_empty() {
        table.evaluate_all(&ctx)
    } else {
        args.affordance
            .iter()
            .map(|name| (name.clone(), table.evaluate(name, &ctx)))
            .collect()
    };

    let rows: Vec<ExpectationDisplay> = evaluated
        .into_iter()
        .map(|(affordance, result)| match result {
            Ok(expectation) => ExpectationDisplay {
                affordance,
                expectation: Some(expectation),
                error: None,
            },
            Err(e) => ExpectationDisplay {
                affordance,
                expectation: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    print_list(&rows, format);

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 && matches!(format, OutputFormat::Table) {
        print_warning(&format!("{} affordance(s) could not be evaluated", failed));
    }
    Ok(())
}
