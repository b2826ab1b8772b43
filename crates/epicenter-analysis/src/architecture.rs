//! Architectural violation detection over the built model

use crate::domain::DomainModel;
use epicenter_core::{
    ArchitecturalViolation, BusinessRule, RelationType, RuleType, SemanticKind, ViolationType,
};
use epicenter_parser::semantic::SemanticModel;
use std::collections::{BTreeMap, BTreeSet};

/// Inspect the model, the rules, and the import declarations; emit the
/// canonical violations. Deterministic, no source text parsing.
pub fn detect(
    model: &DomainModel,
    rules: &[BusinessRule],
    semantic: &SemanticModel<'_>,
) -> Vec<ArchitecturalViolation> {
    let mut violations = Vec::new();

    // DOMAIN_CALLING_INFRA: domain callables reaching into infrastructure
    for relation in &model.relations {
        if relation.relation_type != RelationType::Calls {
            continue;
        }
        let from = relation.from.to_lowercase();
        let to = relation.to.to_lowercase();
        if from.contains("domain") && to.contains("infra") {
            violations.push(ArchitecturalViolation {
                id: format!(
                    "{}:{}->{}",
                    ViolationType::DomainCallingInfra.as_str(),
                    relation.from,
                    relation.to
                ),
                violation_type: ViolationType::DomainCallingInfra,
                message: format!(
                    "domain code {} calls into infrastructure {}",
                    relation.from, relation.to
                ),
                file_path: None,
                related: vec![relation.from.clone(), relation.to.clone()],
            });
        }
    }

    // RULE_IN_CONTROLLER: business logic living at the transport edge
    for rule in rules {
        let in_controller = rule
            .method
            .as_deref()
            .is_some_and(|m| m.ends_with("Controller"))
            || rule.file_path.to_lowercase().contains("controller");
        if in_controller {
            violations.push(ArchitecturalViolation {
                id: format!("{}:{}", ViolationType::RuleInController.as_str(), rule.id),
                violation_type: ViolationType::RuleInController,
                message: format!("business rule {} is implemented in a controller", rule.id),
                file_path: Some(rule.file_path.clone()),
                related: vec![rule.id.clone()],
            });
        }
    }

    // ANEMIC_ENTITY: state fields that nothing in the entity modifies
    for entity in &model.entities {
        if entity.state_fields.is_empty() {
            continue;
        }
        let prefix = format!("{}.", entity.name);
        let has_modifier = model.relations.iter().any(|r| {
            r.relation_type == RelationType::Modifies && r.from.starts_with(&prefix)
        });
        if !has_modifier {
            violations.push(ArchitecturalViolation {
                id: format!("{}:{}", ViolationType::AnemicEntity.as_str(), entity.name),
                violation_type: ViolationType::AnemicEntity,
                message: format!(
                    "entity {} declares state but no method modifies it",
                    entity.name
                ),
                file_path: Some(entity.file_path.clone()),
                related: vec![entity.name.clone()],
            });
        }
    }

    // FAT_SERVICE: services accumulating too many responsibilities
    for class in &model.classes {
        if class.name.ends_with("Service") && class.methods.len() >= 8 {
            violations.push(ArchitecturalViolation {
                id: format!("{}:{}", ViolationType::FatService.as_str(), class.name),
                violation_type: ViolationType::FatService,
                message: format!(
                    "service {} declares {} methods",
                    class.name,
                    class.methods.len()
                ),
                file_path: Some(class.file_path.clone()),
                related: vec![class.name.clone()],
            });
        }
    }

    // LAYER_VIOLATION: domain files importing infrastructure modules
    for node in &semantic.nodes {
        if node.kind != SemanticKind::Import {
            continue;
        }
        let in_domain = node
            .file
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case("domain"));
        let Some(specifier) = node.name.as_deref() else {
            continue;
        };
        if in_domain && specifier.to_lowercase().contains("infra") {
            violations.push(ArchitecturalViolation {
                id: format!(
                    "{}:{}:{}",
                    ViolationType::LayerViolation.as_str(),
                    node.file,
                    specifier
                ),
                violation_type: ViolationType::LayerViolation,
                message: format!("domain file {} imports {}", node.file, specifier),
                file_path: Some(node.file.to_string()),
                related: vec![specifier.to_string()],
            });
        }
    }

    // SCATTERED_RULE: one (entity, type) group spread across three files
    let mut groups: BTreeMap<(String, RuleType), BTreeSet<String>> = BTreeMap::new();
    for rule in rules {
        if let Some(entity) = &rule.entity {
            groups
                .entry((entity.clone(), rule.rule_type))
                .or_default()
                .insert(rule.file_path.clone());
        }
    }
    for ((entity, rule_type), files) in groups {
        if files.len() >= 3 {
            violations.push(ArchitecturalViolation {
                id: format!(
                    "{}:{}:{}",
                    ViolationType::ScatteredRule.as_str(),
                    entity,
                    rule_type.as_str()
                ),
                violation_type: ViolationType::ScatteredRule,
                message: format!(
                    "{} rules for {} are scattered across {} files",
                    rule_type.as_str(),
                    entity,
                    files.len()
                ),
                file_path: None,
                related: files.into_iter().collect(),
            });
        }
    }

    violations
}
