//! Epicenter Analysis — domain inference, rule extraction, impact
//! simulation, and architectural checks over a parsed project
//!
//! The pipeline runs strictly forward: parse, enrich, infer the domain
//! model, extract rules, then simulate impact and detect violations. All
//! AST borrows stay inside one invocation; reports carry owned data only.

pub mod architecture;
pub mod confidence;
pub mod domain;
pub mod impact;
pub mod report;
pub mod rules;

use epicenter_core::{ImpactSimulationResult, Result, TechnicalReport};
use epicenter_parser::{ParserConfig, enrich, load_project};
use std::path::Path;

/// Run the full pipeline and return the report. The first extracted rule, if
/// any, seeds the report's impact simulation.
pub fn analyze(project_root: &Path) -> Result<TechnicalReport> {
    analyze_with_config(project_root, &ParserConfig::default())
}

pub fn analyze_with_config(
    project_root: &Path,
    config: &ParserConfig,
) -> Result<TechnicalReport> {
    let project = load_project(project_root, config)?;
    let semantic = enrich(&project.files);
    let model = domain::build(&semantic);
    let rules = rules::extract_rules(&semantic, &model);
    let violations = architecture::detect(&model, &rules, &semantic);
    let impact = match rules.first() {
        Some(first) => Some(impact::simulate(&first.id, &rules, &model)?),
        None => None,
    };
    Ok(report::generate(model, rules, impact, violations))
}

/// Rerun stages one through four, then simulate the given rule.
pub fn simulate_rule_impact(
    project_root: &Path,
    rule_id: &str,
) -> Result<ImpactSimulationResult> {
    let project = load_project(project_root, &ParserConfig::default())?;
    let semantic = enrich(&project.files);
    let model = domain::build(&semantic);
    let rules = rules::extract_rules(&semantic, &model);
    impact::simulate(rule_id, &rules, &model)
}
