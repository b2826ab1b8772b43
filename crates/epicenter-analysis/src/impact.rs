//! Impact simulation over the relation graph

use crate::domain::DomainModel;
use epicenter_core::{
    BusinessRule, Error, ImpactExplanation, ImpactNode, ImpactNodeKind, ImpactSimulationResult,
    RelationGraph, Result, RuleType, normalize, round2,
};
use epicenter_parser::SOURCE_EXTENSIONS;
use std::collections::BTreeSet;

/// Traversal stops beyond this depth.
const MAX_DEPTH: usize = 5;

/// Simulate the blast radius of changing one rule. The rule id must name an
/// extracted rule; anything else is fatal.
pub fn simulate(
    rule_id: &str,
    rules: &[BusinessRule],
    model: &DomainModel,
) -> Result<ImpactSimulationResult> {
    let rule = rules
        .iter()
        .find(|r| r.id == rule_id)
        .ok_or_else(|| Error::UnknownRule(rule_id.to_string()))?;
    let graph = RelationGraph::from_relations(&model.relations);

    let root = resolve_root(rule);
    let reach = graph.bounded_reach(&root, MAX_DEPTH);
    let direct = reach.values().filter(|&&d| d == 1).count();
    let indirect = reach.values().filter(|&&d| d >= 2).count();
    let depth = reach.values().copied().max().unwrap_or(0);

    let mut impacted: BTreeSet<String> = reach.into_keys().collect();
    if let Some(entity) = &rule.entity {
        impacted.insert(entity.clone());
        if let Some(method) = &rule.method {
            impacted.insert(format!("{entity}.{method}"));
        }
    }

    let fan_out = direct + indirect;
    let fan_out_weight = normalize(fan_out, graph.max_fan_out()) * 0.25;
    let call_depth_weight = normalize(depth, graph.max_reach_depth(MAX_DEPTH)) * 0.15;
    let mutation_weight = mutation_factor(rule.rule_type) * 0.20;
    let layer_weight = layer_factor(&rule.file_path, rule.entity.is_some()) * 0.20;
    let criticality_weight = criticality(rule, rules, model, &graph) * 0.20;

    let mut risk =
        fan_out_weight + call_depth_weight + mutation_weight + layer_weight + criticality_weight;
    if rule.entity.is_none() {
        risk = risk.max(0.85);
    }
    let risk = round2(risk.clamp(0.0, 1.0));

    let explanation = ImpactExplanation {
        fan_out,
        call_depth: depth,
        affected_files: impacted.iter().filter(|v| is_file_like(v)).count(),
        affected_entities: impacted.iter().filter(|v| model.is_entity(v)).count(),
        cross_layer_violations: impacted.iter().filter(|v| crosses_layer(v)).count(),
    };

    // root rule first, everything else ascending; all carry the global score
    let mut nodes = vec![ImpactNode {
        id: rule.id.clone(),
        kind: ImpactNodeKind::Rule,
        risk_score: risk,
    }];
    for id in &impacted {
        if *id == rule.id {
            continue;
        }
        nodes.push(ImpactNode {
            id: id.clone(),
            kind: classify(id, model),
            risk_score: risk,
        });
    }

    Ok(ImpactSimulationResult {
        rule: rule.clone(),
        impacted_nodes: nodes,
        risk_score: risk,
        explanation,
    })
}

/// `<Entity>.<method>`, else `<filePath>#<method>`, else `<Entity>`, else
/// the rule id itself.
fn resolve_root(rule: &BusinessRule) -> String {
    match (&rule.entity, &rule.method) {
        (Some(entity), Some(method)) => format!("{entity}.{method}"),
        (None, Some(method)) => format!("{}#{}", rule.file_path, method),
        (Some(entity), None) => entity.clone(),
        (None, None) => rule.id.clone(),
    }
}

fn mutation_factor(rule_type: RuleType) -> f64 {
    match rule_type {
        RuleType::StateTransition => 1.0,
        RuleType::Invariant => 0.9,
        RuleType::Policy => 0.7,
        RuleType::Calculation => 0.6,
        RuleType::ContextRestriction => 0.5,
    }
}

fn layer_factor(file_path: &str, has_entity: bool) -> f64 {
    let lower = file_path.to_lowercase();
    if lower.contains("controller") {
        1.0
    } else if lower.contains("service") {
        0.7
    } else if has_entity {
        0.2
    } else {
        1.0
    }
}

/// Mean of normalized rules-per-entity and entity fan-in; 1.0 without an
/// owning entity.
fn criticality(
    rule: &BusinessRule,
    rules: &[BusinessRule],
    model: &DomainModel,
    graph: &RelationGraph,
) -> f64 {
    let Some(entity) = rule.entity.as_deref() else {
        return 1.0;
    };
    let rules_for = |name: &str| {
        rules
            .iter()
            .filter(|r| r.entity.as_deref() == Some(name))
            .count()
    };
    let fan_in_for = |name: &str| {
        let mut sources = BTreeSet::new();
        for (from, to, _) in graph.edges() {
            if to == name || to.strip_prefix(name).is_some_and(|rest| rest.starts_with('.')) {
                sources.insert(from);
            }
        }
        sources.len()
    };
    let max_rules = model
        .entities
        .iter()
        .map(|e| rules_for(&e.name))
        .max()
        .unwrap_or(0);
    let max_fan_in = model
        .entities
        .iter()
        .map(|e| fan_in_for(&e.name))
        .max()
        .unwrap_or(0);
    (normalize(rules_for(entity), max_rules) + normalize(fan_in_for(entity), max_fan_in)) / 2.0
}

fn is_file_like(id: &str) -> bool {
    id.contains('/')
        || id.contains('\\')
        || SOURCE_EXTENSIONS
            .iter()
            .any(|ext| id.ends_with(&format!(".{ext}")))
}

fn crosses_layer(id: &str) -> bool {
    let lower = id.to_lowercase();
    lower.contains("controller") || lower.contains("infra")
}

fn classify(id: &str, model: &DomainModel) -> ImpactNodeKind {
    if model.is_entity(id) {
        ImpactNodeKind::Entity
    } else if is_file_like(id) {
        ImpactNodeKind::File
    } else {
        ImpactNodeKind::Method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain, rules};
    use epicenter_parser::{enrich, parse_source, typescript_parser};

    fn pipeline(sources: &[(&str, &str)]) -> (Vec<BusinessRule>, DomainModel) {
        let mut parser = typescript_parser().unwrap();
        let files: Vec<_> = sources
            .iter()
            .map(|(path, text)| {
                parse_source(&mut parser, path.to_string(), text.to_string()).unwrap()
            })
            .collect();
        let semantic = enrich(&files);
        let model = domain::build(&semantic);
        let extracted = rules::extract_rules(&semantic, &model);
        (extracted, model)
    }

    const ORDER: &str = r#"
class Order {
    status: "NEW" | "SHIPPED" | "CANCELLED" = "NEW";
    ship() {
        if (this.status !== "NEW") {
            throw new Error("not new");
        }
        this.status = "SHIPPED";
        this.notifyWarehouse();
    }
    notifyWarehouse() {
        this.audit();
    }
    audit() {}
}
"#;

    #[test]
    fn unknown_rule_id_is_fatal() {
        let (extracted, model) = pipeline(&[("src/order.ts", ORDER)]);
        let err = simulate("POLICY:nope.ts:0", &extracted, &model).unwrap_err();
        assert!(matches!(err, Error::UnknownRule(_)));
    }

    #[test]
    fn root_rule_comes_first_then_sorted_identifiers() {
        let (extracted, model) = pipeline(&[("src/order.ts", ORDER)]);
        let transition = extracted
            .iter()
            .find(|r| r.rule_type == RuleType::StateTransition)
            .unwrap();
        let result = simulate(&transition.id, &extracted, &model).unwrap();

        assert_eq!(result.impacted_nodes[0].id, transition.id);
        assert_eq!(result.impacted_nodes[0].kind, ImpactNodeKind::Rule);
        let rest: Vec<&str> = result.impacted_nodes[1..]
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        let mut sorted = rest.clone();
        sorted.sort_unstable();
        assert_eq!(rest, sorted);
        // the root rule appears exactly once
        let occurrences = result
            .impacted_nodes
            .iter()
            .filter(|n| n.id == transition.id)
            .count();
        assert_eq!(occurrences, 1);
        // every node carries the global score
        assert!(
            result
                .impacted_nodes
                .iter()
                .all(|n| n.risk_score == result.risk_score)
        );
    }

    #[test]
    fn entity_and_method_are_injected_into_the_impacted_set() {
        let (extracted, model) = pipeline(&[("src/order.ts", ORDER)]);
        let transition = extracted
            .iter()
            .find(|r| r.rule_type == RuleType::StateTransition)
            .unwrap();
        let result = simulate(&transition.id, &extracted, &model).unwrap();
        let ids: Vec<&str> = result
            .impacted_nodes
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert!(ids.contains(&"Order"));
        assert!(ids.contains(&"Order.ship"));
        let entity_node = result
            .impacted_nodes
            .iter()
            .find(|n| n.id == "Order")
            .unwrap();
        assert_eq!(entity_node.kind, ImpactNodeKind::Entity);
    }

    #[test]
    fn traversal_follows_call_chains() {
        let (extracted, model) = pipeline(&[("src/order.ts", ORDER)]);
        let transition = extracted
            .iter()
            .find(|r| r.rule_type == RuleType::StateTransition)
            .unwrap();
        let result = simulate(&transition.id, &extracted, &model).unwrap();
        // ship -> this.notifyWarehouse (verbatim callee text), plus the
        // MODIFIES edge to the status field
        let ids: Vec<&str> = result
            .impacted_nodes
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert!(ids.contains(&"this.notifyWarehouse"));
        assert!(ids.contains(&"Order.status"));
        assert!(result.explanation.fan_out >= 2);
        assert!(result.explanation.call_depth >= 1);
    }

    #[test]
    fn rules_without_an_entity_floor_at_eighty_five() {
        let (extracted, model) = pipeline(&[(
            "src/tax.ts",
            "function withTax(price: number): number { return price * 1.21; }",
        )]);
        assert_eq!(extracted.len(), 1);
        let result = simulate(&extracted[0].id, &extracted, &model).unwrap();
        assert!(result.risk_score >= 0.85);
        assert!(result.risk_score <= 1.0);
    }

    #[test]
    fn risk_score_is_bounded_and_rounded() {
        let (extracted, model) = pipeline(&[("src/order.ts", ORDER)]);
        for rule in &extracted {
            let result = simulate(&rule.id, &extracted, &model).unwrap();
            assert!((0.0..=1.0).contains(&result.risk_score));
            assert_eq!(result.risk_score, round2(result.risk_score));
        }
    }
}
