//! Business-rule extraction and classification

use crate::confidence::{self, RuleContext};
use crate::domain::{ClassInfo, DomainModel};
use epicenter_core::{AstSpan, BusinessRule, RuleType, SemanticKind};
use epicenter_parser::ast;
use epicenter_parser::semantic::{SemanticModel, SemanticNode};
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;

/// Walk the semantic nodes and produce classified rules. Identifiers are
/// `<TYPE>:<filePath>:<astStart>`; duplicates under that key collapse,
/// first wins.
pub fn extract_rules(semantic: &SemanticModel<'_>, model: &DomainModel) -> Vec<BusinessRule> {
    let mut rules = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    for node in &semantic.nodes {
        let candidate = match node.kind {
            SemanticKind::If => classify_conditional(node, semantic, model),
            SemanticKind::Binary => classify_binary(node, semantic, model),
            _ => None,
        };
        if let Some(rule) = candidate {
            if seen_ids.insert(rule.id.clone()) {
                rules.push(rule);
            }
        }
    }
    rules
}

/// Ownership of a rule node: the enclosing callable, the class around it,
/// and the entity when the class qualifies.
struct Owner<'t> {
    callable: Node<'t>,
    method_name: Option<String>,
    class_name: Option<String>,
    entity_name: Option<String>,
    state_fields: Vec<String>,
}

fn resolve_owner<'t>(node: Node<'t>, source: &str, model: &DomainModel) -> Option<Owner<'t>> {
    if let Some(method) = ast::enclosing_method(node) {
        let class_name = ast::enclosing_class(method).and_then(|c| ast::node_name(c, source));
        let entity_name = class_name
            .as_deref()
            .filter(|name| model.is_entity(name))
            .map(str::to_string);
        let state_fields = entity_name
            .as_deref()
            .and_then(|name| model.entity(name))
            .map(|e| e.state_fields.clone())
            .unwrap_or_default();
        return Some(Owner {
            callable: method,
            method_name: ast::node_name(method, source),
            class_name,
            entity_name,
            state_fields,
        });
    }
    let function = ast::enclosing_callable(node)?;
    Some(Owner {
        callable: function,
        method_name: ast::node_name(function, source),
        class_name: None,
        entity_name: None,
        state_fields: Vec::new(),
    })
}

fn classify_conditional(
    node: &SemanticNode<'_>,
    semantic: &SemanticModel<'_>,
    model: &DomainModel,
) -> Option<BusinessRule> {
    let owner = resolve_owner(node.node, node.source, model)?;
    let condition = ast::if_condition(node.node).map(ast::unparenthesized);
    let consequence = ast::if_consequence(node.node);
    let alternative = ast::if_alternative(node.node);

    let then_throws = consequence
        .is_some_and(|c| ast::subtree_contains(c, |n| n.kind() == "throw_statement"));
    let then_returns = consequence
        .is_some_and(|c| ast::subtree_contains(c, |n| n.kind() == "return_statement"));
    let guards_mutation = owner.entity_name.is_some()
        && mutates_state_after(
            owner.callable,
            node.node.end_byte(),
            node.source,
            &owner.state_fields,
        );

    let rule_type = if alternative.is_none() && (then_throws || then_returns || guards_mutation) {
        RuleType::Invariant
    } else if condition.is_some_and(|c| is_context_condition(c, node.source, &owner)) {
        RuleType::ContextRestriction
    } else if alternative.is_some() {
        RuleType::Policy
    } else {
        return None;
    };

    let strong_pattern = match rule_type {
        RuleType::Invariant => then_throws || then_returns,
        _ => true,
    };
    let context = RuleContext {
        in_entity: owner.entity_name.is_some(),
        mutates_state: mutates_state(owner.callable, node.source, &owner.state_fields),
        has_throw: ast::subtree_contains(node.node, |n| n.kind() == "throw_statement"),
        method_public: owner_is_public(&owner, node.source),
        uses_enum: uses_enum(
            node.node,
            node.source,
            &semantic.enums,
            owner.class_name.as_deref().and_then(|n| model.class(n)),
        ),
        outside_infra_dir: outside_infra_dir(node.file),
        in_controller_path: looks_like_controller(node.file),
        strong_pattern,
        in_conditional: ast::inside_conditional(node.node),
    };

    let condition_text = condition
        .map(|c| ast::text(c, node.source).to_string())
        .unwrap_or_default();
    let consequence_text = consequence
        .map(|c| ast::text(c, node.source).to_string())
        .unwrap_or_default();
    Some(make_rule(
        rule_type,
        node,
        &owner,
        condition_text,
        consequence_text,
        context,
    ))
}

fn classify_binary(
    node: &SemanticNode<'_>,
    semantic: &SemanticModel<'_>,
    model: &DomainModel,
) -> Option<BusinessRule> {
    let owner = resolve_owner(node.node, node.source, model)?;

    if ast::is_assignment(node.node.kind()) {
        let field = ast::this_assignment_target(node.node, node.source)?;
        if owner.entity_name.is_none() || !owner.state_fields.contains(&field) {
            return None;
        }
        let context = RuleContext {
            in_entity: true,
            mutates_state: true,
            has_throw: false,
            method_public: owner_is_public(&owner, node.source),
            uses_enum: uses_enum(
                node.node,
                node.source,
                &semantic.enums,
                owner.class_name.as_deref().and_then(|n| model.class(n)),
            ),
            outside_infra_dir: outside_infra_dir(node.file),
            in_controller_path: looks_like_controller(node.file),
            strong_pattern: true,
            in_conditional: ast::inside_conditional(node.node),
        };
        return Some(make_rule(
            RuleType::StateTransition,
            node,
            &owner,
            format!("{field} assignment"),
            node.text().to_string(),
            context,
        ));
    }

    let operator = ast::binary_operator(node.node, node.source)?;
    if !ast::ARITHMETIC_OPS.contains(&operator) {
        return None;
    }
    let has_number = ast::subtree_contains(node.node, |n| n.kind() == "number");
    let touches_entity_property = owner
        .entity_name
        .as_deref()
        .and_then(|name| model.entity(name))
        .is_some_and(|entity| {
            ast::subtree(node.node).into_iter().any(|n| {
                ast::this_member_property(n, node.source)
                    .is_some_and(|prop| entity.properties.contains(&prop))
            })
        });
    if !(has_number || touches_entity_property) {
        return None;
    }

    let context = RuleContext {
        in_entity: owner.entity_name.is_some(),
        mutates_state: mutates_state(owner.callable, node.source, &owner.state_fields),
        has_throw: false,
        method_public: owner_is_public(&owner, node.source),
        uses_enum: uses_enum(
            node.node,
            node.source,
            &semantic.enums,
            owner.class_name.as_deref().and_then(|n| model.class(n)),
        ),
        outside_infra_dir: outside_infra_dir(node.file),
        in_controller_path: looks_like_controller(node.file),
        strong_pattern: true,
        in_conditional: ast::inside_conditional(node.node),
    };
    let condition = nearest_condition_text(node.node, node.source)
        .unwrap_or_else(|| "unconditional".to_string());
    Some(make_rule(
        RuleType::Calculation,
        node,
        &owner,
        condition,
        node.text().to_string(),
        context,
    ))
}

fn make_rule(
    rule_type: RuleType,
    node: &SemanticNode<'_>,
    owner: &Owner<'_>,
    condition: String,
    consequence: String,
    context: RuleContext,
) -> BusinessRule {
    let start = node.node.start_byte();
    BusinessRule {
        id: format!("{}:{}:{}", rule_type.as_str(), node.file, start),
        rule_type,
        entity: owner.entity_name.clone(),
        method: owner.method_name.clone(),
        file_path: node.file.to_string(),
        condition,
        consequence,
        ast_location: AstSpan {
            start,
            end: node.node.end_byte(),
        },
        confidence: confidence::score(rule_type, &context),
    }
}

// ── Context signals ─────────────────────────────────────

fn owner_is_public(owner: &Owner<'_>, source: &str) -> bool {
    if ast::is_method(owner.callable.kind()) {
        ast::method_is_public(owner.callable, source)
    } else {
        true
    }
}

fn mutates_state(callable: Node<'_>, source: &str, state_fields: &[String]) -> bool {
    mutates_state_after(callable, 0, source, state_fields)
}

fn mutates_state_after(
    callable: Node<'_>,
    position: usize,
    source: &str,
    state_fields: &[String],
) -> bool {
    if state_fields.is_empty() {
        return false;
    }
    ast::subtree(callable).into_iter().any(|n| {
        n.start_byte() >= position
            && ast::this_assignment_target(n, source)
                .is_some_and(|field| state_fields.iter().any(|f| *f == field))
    })
}

fn uses_enum(
    node: Node<'_>,
    source: &str,
    enums: &BTreeSet<String>,
    class: Option<&ClassInfo>,
) -> bool {
    ast::subtree(node).into_iter().any(|n| match n.kind() {
        "identifier" | "type_identifier" => enums.contains(ast::text(n, source)),
        "member_expression" => ast::this_member_property(n, source).is_some_and(|prop| {
            class.is_some_and(|c| c.properties.iter().any(|p| p.name == prop && p.enum_typed))
        }),
        _ => false,
    })
}

fn outside_infra_dir(file: &str) -> bool {
    let lower = file.to_lowercase();
    !(lower.contains("controller") || lower.contains("infra") || lower.contains("adapter"))
}

fn looks_like_controller(file: &str) -> bool {
    file.to_lowercase().contains("controller")
}

fn is_context_condition(condition: Node<'_>, source: &str, owner: &Owner<'_>) -> bool {
    mentions_datetime(condition, source)
        || mentions_status(condition, source)
        || mentions_feature_flag(condition, source)
        || (owner.entity_name.is_some()
            && references_param_or_global(
                condition,
                source,
                &ast::parameter_names(owner.callable, source),
            )
            && !touches_own_state(condition, source, &owner.state_fields))
}

fn mentions_datetime(condition: Node<'_>, source: &str) -> bool {
    ast::subtree(condition).into_iter().any(|n| match n.kind() {
        "new_expression" => {
            ast::field(n, "constructor").is_some_and(|c| ast::text(c, source) == "Date")
        }
        "member_expression" => {
            ast::field(n, "object").is_some_and(|o| ast::text(o, source) == "Date")
                && ast::field(n, "property").is_some_and(|p| ast::text(p, source) == "now")
        }
        _ => false,
    })
}

fn mentions_status(condition: Node<'_>, source: &str) -> bool {
    ast::subtree(condition).into_iter().any(|n| {
        matches!(n.kind(), "identifier" | "property_identifier")
            && ast::text(n, source).to_lowercase().contains("status")
    })
}

fn mentions_feature_flag(condition: Node<'_>, source: &str) -> bool {
    ast::subtree(condition).into_iter().any(|n| match n.kind() {
        "member_expression" => {
            ast::field(n, "object").is_some_and(|o| ast::text(o, source) == "process")
                && ast::field(n, "property").is_some_and(|p| ast::text(p, source) == "env")
        }
        "identifier" | "property_identifier" => {
            let lower = ast::text(n, source).to_lowercase();
            lower.contains("flag") || lower.contains("feature")
        }
        _ => false,
    })
}

fn references_param_or_global(condition: Node<'_>, source: &str, params: &[String]) -> bool {
    ast::subtree(condition).into_iter().any(|n| {
        n.kind() == "identifier" && {
            let text = ast::text(n, source);
            params.iter().any(|p| p == text)
                || matches!(text, "process" | "globalThis" | "window")
        }
    })
}

fn touches_own_state(condition: Node<'_>, source: &str, state_fields: &[String]) -> bool {
    ast::subtree(condition).into_iter().any(|n| {
        ast::this_member_property(n, source)
            .is_some_and(|prop| state_fields.iter().any(|f| *f == prop))
    })
}

fn nearest_condition_text(node: Node<'_>, source: &str) -> Option<String> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ast::is_callable(ancestor.kind()) {
            return None;
        }
        if ancestor.kind() == "if_statement" {
            return ast::if_condition(ancestor)
                .map(|c| ast::text(ast::unparenthesized(c), source).to_string());
        }
        current = ancestor.parent();
    }
    None
}
