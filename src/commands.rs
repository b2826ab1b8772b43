//! CLI command implementations

use std::path::PathBuf;

pub fn analyze(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("analyzing project: {}", root.display());

    let report = epicenter_analysis::analyze(&root)?;

    tracing::info!(
        "found {} entities, {} relations, {} rules, {} violations",
        report.entities.len(),
        report.relations.len(),
        report.rules.len(),
        report.architectural_violations.len()
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn impact(root: PathBuf, rule_id: String) -> anyhow::Result<()> {
    tracing::info!("simulating impact of {} in {}", rule_id, root.display());

    let result = epicenter_analysis::simulate_rule_impact(&root, &rule_id)?;

    tracing::info!(
        "{} impacted nodes, risk {}",
        result.impacted_nodes.len(),
        result.risk_score
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
