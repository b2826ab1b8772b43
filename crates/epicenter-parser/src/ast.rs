//! Tree-sitter node helpers shared by the enricher and the analysis stages

use tree_sitter::Node;

pub const ARITHMETIC_OPS: [&str; 5] = ["+", "-", "*", "/", "%"];
pub const COMPOUND_ASSIGN_OPS: [&str; 5] = ["+=", "-=", "*=", "/=", "%="];

/// Verbatim source text of a node.
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub fn field<'t>(node: Node<'t>, name: &str) -> Option<Node<'t>> {
    node.child_by_field_name(name)
}

/// Symbol name via the grammar's `name` field, where the node has one.
pub fn node_name(node: Node<'_>, source: &str) -> Option<String> {
    field(node, "name").map(|n| text(n, source).to_string())
}

pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Pre-order subtree, the node itself first.
pub fn subtree<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        for i in (0..current.child_count()).rev() {
            if let Some(child) = current.child(i) {
                stack.push(child);
            }
        }
    }
    out
}

pub fn subtree_contains<'t>(node: Node<'t>, pred: impl Fn(Node<'t>) -> bool) -> bool {
    subtree(node).into_iter().any(pred)
}

// ── Kind predicates ─────────────────────────────────────

pub fn is_class(kind: &str) -> bool {
    matches!(kind, "class_declaration" | "abstract_class_declaration")
}

pub fn is_method(kind: &str) -> bool {
    kind == "method_definition"
}

pub fn is_function(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
    )
}

pub fn is_callable(kind: &str) -> bool {
    is_method(kind) || is_function(kind)
}

pub fn is_property(kind: &str) -> bool {
    matches!(kind, "public_field_definition" | "field_definition")
}

// ── Ancestor walks ──────────────────────────────────────

pub fn enclosing<'t>(node: Node<'t>, pred: impl Fn(&str) -> bool) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if pred(ancestor.kind()) {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}

pub fn enclosing_class<'t>(node: Node<'t>) -> Option<Node<'t>> {
    enclosing(node, is_class)
}

pub fn enclosing_method<'t>(node: Node<'t>) -> Option<Node<'t>> {
    enclosing(node, is_method)
}

pub fn enclosing_function<'t>(node: Node<'t>) -> Option<Node<'t>> {
    enclosing(node, is_function)
}

pub fn enclosing_callable<'t>(node: Node<'t>) -> Option<Node<'t>> {
    enclosing(node, is_callable)
}

/// True when the node sits under an `if` without an intervening callable
/// boundary, i.e. it executes conditionally within its own callable.
pub fn inside_conditional(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if is_callable(ancestor.kind()) {
            return false;
        }
        if ancestor.kind() == "if_statement" {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

// ── Expressions ─────────────────────────────────────────

pub fn is_assignment(kind: &str) -> bool {
    matches!(
        kind,
        "assignment_expression" | "augmented_assignment_expression"
    )
}

/// Operator text: `=` for plain assignment, the compound token otherwise.
pub fn assignment_operator<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "assignment_expression" => Some("="),
        "augmented_assignment_expression" => field(node, "operator").map(|op| text(op, source)),
        _ => None,
    }
}

/// For a `this.<prop>` member expression, the property name.
pub fn this_member_property(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = field(node, "object")?;
    if object.kind() != "this" {
        return None;
    }
    field(node, "property").map(|p| text(p, source).to_string())
}

/// For `this.<field> = …` or a compound-assignment counterpart, the assigned
/// field name.
pub fn this_assignment_target(node: Node<'_>, source: &str) -> Option<String> {
    if !is_assignment(node.kind()) {
        return None;
    }
    let op = assignment_operator(node, source)?;
    if op != "=" && !COMPOUND_ASSIGN_OPS.contains(&op) {
        return None;
    }
    this_member_property(field(node, "left")?, source)
}

pub fn binary_operator<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    if node.kind() != "binary_expression" {
        return None;
    }
    field(node, "operator").map(|op| text(op, source))
}

/// Strip one level of parentheses, as around `if` conditions.
pub fn unparenthesized<'t>(node: Node<'t>) -> Node<'t> {
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = named_children(node).into_iter().next() {
            return inner;
        }
    }
    node
}

// ── Declarations ────────────────────────────────────────

pub fn property_is_readonly(node: Node<'_>) -> bool {
    children(node).into_iter().any(|c| c.kind() == "readonly")
}

/// Public when unscoped or explicitly `public`.
pub fn method_is_public(node: Node<'_>, source: &str) -> bool {
    !children(node).into_iter().any(|c| {
        c.kind() == "accessibility_modifier" && matches!(text(c, source), "private" | "protected")
    })
}

/// The declared type text of a property, when annotated.
pub fn type_annotation_text(node: Node<'_>, source: &str) -> Option<String> {
    let annotation = field(node, "type")?;
    named_children(annotation)
        .into_iter()
        .next_back()
        .map(|t| text(t, source).to_string())
}

/// Declared parameter names of a callable.
pub fn parameter_names(callable: Node<'_>, source: &str) -> Vec<String> {
    let Some(params) = field(callable, "parameters") else {
        return Vec::new();
    };
    named_children(params)
        .into_iter()
        .filter_map(|p| match p.kind() {
            "required_parameter" | "optional_parameter" => {
                field(p, "pattern").map(|pat| text(pat, source).to_string())
            }
            "identifier" => Some(text(p, source).to_string()),
            _ => None,
        })
        .collect()
}

// ── If statements ───────────────────────────────────────

pub fn if_condition<'t>(node: Node<'t>) -> Option<Node<'t>> {
    field(node, "condition")
}

pub fn if_consequence<'t>(node: Node<'t>) -> Option<Node<'t>> {
    field(node, "consequence")
}

/// The statement under `else`, unwrapping the else_clause node.
pub fn if_alternative<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let alt = field(node, "alternative")?;
    named_children(alt).into_iter().next().or(Some(alt))
}
