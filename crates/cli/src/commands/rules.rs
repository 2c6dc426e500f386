//! Rules Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use gatecheck_common::{AffordanceRule, GatecheckConfig, Rule, TextSource};

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RulesArgs {
    /// Print the table as TOML, ready to be customised and set as `rules_path`
    #[arg(long)]
    pub toml: bool,
}

/// Rule display wrapper for serialization
#[derive(Serialize)]
pub struct RuleDisplay {
    pub affordance: String,
    pub test_id: String,
    pub rule: String,
    pub text: String,
    pub requires: Vec<String>,
}

impl RuleDisplay {
    fn new(rule: &AffordanceRule, settings: &GatecheckConfig) -> Self {
        Self {
            affordance: rule.name.clone(),
            test_id: settings.surface.test_id(&rule.name),
            rule: describe_rule(&rule.rule),
            text: describe_text(&rule.text),
            requires: rule.requirements().iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl TableDisplay for RuleDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Affordance", "Test ID", "Rule", "Text", "Requires"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.affordance.clone(),
            self.test_id.clone(),
            self.rule.clone(),
            self.text.clone(),
            if self.requires.is_empty() {
                "-".to_string()
            } else {
                self.requires.join(", ")
            },
        ]
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::Always => "always".to_string(),
        Rule::Never => "never".to_string(),
        Rule::Permission { permission } => format!("permission {}", permission),
        Rule::RoleAction { group, action } => format!("{}/{}", group, action),
        Rule::EntityScoped {
            scope,
            group,
            action,
            excluded_names,
        } => {
            let mut desc = format!("{} only, {}/{}", scope, group, action);
            if !excluded_names.is_empty() {
                desc.push_str(&format!(", except {}", excluded_names.join(", ")));
            }
            desc
        }
        Rule::SocialProfileLinked => "social profile linked".to_string(),
    }
}

fn describe_text(text: &TextSource) -> String {
    match text {
        TextSource::Unchecked => "-".to_string(),
        TextSource::Fixed(label) => format!("{:?}", label),
        TextSource::UserName => "user name".to_string(),
        TextSource::UserEmail => "user email".to_string(),
        TextSource::UserInitial => "user initial".to_string(),
    }
}

pub fn execute(args: RulesArgs, settings: &GatecheckConfig, format: OutputFormat) -> Result<()> {
    let table = settings.rule_table()?;

    if args.toml {
        print!("{}", table.to_toml()?);
        return Ok(());
    }

    let rows: Vec<RuleDisplay> = table
        .rules()
        .iter()
        .map(|rule| RuleDisplay::new(rule, settings))
        .collect();
    print_list(&rows, format);
    if matches!(format, OutputFormat::Table) {
        print_info(&format!("{} rules for role {}", rows.len(), table.role()));
    }
    Ok(())
}
