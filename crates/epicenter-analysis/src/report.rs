//! Report assembly

use crate::domain::DomainModel;
use epicenter_core::{ArchitecturalViolation, BusinessRule, ImpactSimulationResult, TechnicalReport};

/// Pure projection of the pipeline outputs into the report value.
pub fn generate(
    model: DomainModel,
    rules: Vec<BusinessRule>,
    impact: Option<ImpactSimulationResult>,
    architectural_violations: Vec<ArchitecturalViolation>,
) -> TechnicalReport {
    TechnicalReport {
        entities: model.entities,
        relations: model.relations,
        rules,
        impact,
        architectural_violations,
    }
}
