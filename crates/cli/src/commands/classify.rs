//! Classify Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use gatecheck_common::EntityId;

use crate::output::{print_item, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Identifiers to classify, e.g. org_42 or ws_7
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct Classification {
    pub id: String,
    pub kind: String,
}

impl From<&EntityId> for Classification {
    fn from(id: &EntityId) -> Self {
        Self {
            id: id.as_str().to_string(),
            kind: id.kind().to_string(),
        }
    }
}

impl TableDisplay for Classification {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Kind"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.kind.clone()]
    }
}

pub fn execute(args: ClassifyArgs, format: OutputFormat) -> Result<()> {
    let rows: Vec<Classification> = args
        .ids
        .into_iter()
        .map(EntityId::parse)
        .map(|id| Classification::from(&id))
        .collect();
    match rows.as_slice() {
        [single] => print_item(single, format),
        _ => print_list(&rows, format),
    }
    Ok(())
}
