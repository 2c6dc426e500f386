//! Scenarios Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use gatecheck_e2e::{ScenarioSpec, ScenarioStep};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ScenariosArgs {
    /// Directory containing YAML scenarios
    #[arg(default_value = "scenarios")]
    pub dir: PathBuf,

    /// Only list scenarios with this tag
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub tags: Vec<String>,
    pub steps: usize,
    pub verifies: Vec<String>,
}

impl From<&ScenarioSpec> for ScenarioDisplay {
    fn from(spec: &ScenarioSpec) -> Self {
        Self {
            name: spec.name.clone(),
            tags: spec.tags.clone(),
            steps: spec.steps.len(),
            verifies: spec
                .steps
                .iter()
                .filter_map(|step| match step {
                    ScenarioStep::Verify { affordance, .. } => Some(affordance.clone()),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Tags", "Steps", "Verifies"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.tags.join(", "),
            self.steps.to_string(),
            self.verifies.join(", "),
        ]
    }
}

pub fn execute(args: ScenariosArgs, format: OutputFormat) -> Result<()> {
    let specs = ScenarioSpec::load_all(&args.dir)?;
    let selected: Vec<&ScenarioSpec> = match &args.tag {
        Some(tag) => ScenarioSpec::filter_by_tag(&specs, tag),
        None => specs.iter().collect(),
    };

    let rows: Vec<ScenarioDisplay> = selected.into_iter().map(ScenarioDisplay::from).collect();
    print_list(&rows, format);
    Ok(())
}
