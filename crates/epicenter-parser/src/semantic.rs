//! Semantic enrichment: tagged nodes, the call graph, and the enum table

use crate::ast;
use crate::parser::ParsedFile;
use epicenter_core::SemanticKind;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::{Node, TreeCursor};

/// A tagged handle on a syntax node within one parsed file. Borrows the
/// file's tree and source; must not outlive the pipeline invocation.
#[derive(Debug, Clone)]
pub struct SemanticNode<'t> {
    pub kind: SemanticKind,
    pub file: &'t str,
    pub source: &'t str,
    /// Resolved symbol name; lookup may fail silently.
    pub name: Option<String>,
    /// Resolved static type text; lookup may fail silently.
    pub type_text: Option<String>,
    pub node: Node<'t>,
}

impl SemanticNode<'_> {
    pub fn text(&self) -> &str {
        ast::text(self.node, self.source)
    }
}

/// Directed edge from an enclosing callable to a verbatim callee expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallGraphEdge {
    pub from: String,
    pub to: String,
}

/// Stage-two output: flat node list in traversal order, deduplicated call
/// graph, and the declared-enum name table.
pub struct SemanticModel<'t> {
    pub nodes: Vec<SemanticNode<'t>>,
    pub call_graph: Vec<CallGraphEdge>,
    pub enums: BTreeSet<String>,
}

/// Identifier of the callable enclosing `node`: the nearest enclosing class
/// method as `<Class>.<method>` (a method wins over any nested function),
/// else the nearest named function as `<filePath>#<name>`, else
/// `<filePath>#<anonymous>`.
pub fn enclosing_callable_id(node: Node<'_>, file_path: &str, source: &str) -> String {
    if let Some(method) = ast::enclosing_method(node) {
        if let Some(method_name) = ast::node_name(method, source) {
            if let Some(class_name) =
                ast::enclosing_class(method).and_then(|c| ast::node_name(c, source))
            {
                return format!("{class_name}.{method_name}");
            }
            return format!("{file_path}#{method_name}");
        }
    }
    if let Some(function) = ast::enclosing_function(node) {
        if let Some(name) = ast::node_name(function, source) {
            return format!("{file_path}#{name}");
        }
    }
    format!("{file_path}#<anonymous>")
}

/// Depth-first walk of every parsed file, emitting a `SemanticNode` per
/// tracked kind. Single-threaded and deterministic.
pub fn enrich(files: &[ParsedFile]) -> SemanticModel<'_> {
    let mut model = SemanticModel {
        nodes: Vec::new(),
        call_graph: Vec::new(),
        enums: BTreeSet::new(),
    };
    let mut seen_edges: HashSet<(String, String)> = HashSet::new();
    for file in files {
        let root = file.tree.root_node();
        let mut cursor = root.walk();
        visit(&mut cursor, file, &mut model, &mut seen_edges);
    }
    model
}

fn visit<'t>(
    cursor: &mut TreeCursor<'t>,
    file: &'t ParsedFile,
    model: &mut SemanticModel<'t>,
    seen_edges: &mut HashSet<(String, String)>,
) {
    inspect(cursor.node(), file, model, seen_edges);
    if cursor.goto_first_child() {
        loop {
            visit(cursor, file, model, seen_edges);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn inspect<'t>(
    node: Node<'t>,
    file: &'t ParsedFile,
    model: &mut SemanticModel<'t>,
    seen_edges: &mut HashSet<(String, String)>,
) {
    let source = file.source.as_str();
    let (kind, name, type_text) = match node.kind() {
        kind if ast::is_class(kind) => (SemanticKind::Class, ast::node_name(node, source), None),
        "method_definition" => (SemanticKind::Method, ast::node_name(node, source), None),
        kind if ast::is_property(kind) => (
            SemanticKind::Property,
            ast::node_name(node, source),
            ast::type_annotation_text(node, source),
        ),
        "import_statement" => (SemanticKind::Import, import_specifier(node, source), None),
        "if_statement" => (SemanticKind::If, None, None),
        "throw_statement" => (SemanticKind::Throw, None, None),
        "return_statement" => (SemanticKind::Return, None, None),
        "new_expression" => (
            SemanticKind::New,
            ast::field(node, "constructor").map(|c| ast::text(c, source).to_string()),
            None,
        ),
        "call_expression" => {
            let callee = ast::field(node, "function").map(|f| ast::text(f, source).to_string());
            if let Some(to) = callee.clone() {
                let from = enclosing_callable_id(node, &file.path, source);
                if seen_edges.insert((from.clone(), to.clone())) {
                    model.call_graph.push(CallGraphEdge { from, to });
                }
            }
            (SemanticKind::Call, callee, None)
        }
        "binary_expression" | "assignment_expression" | "augmented_assignment_expression" => {
            (SemanticKind::Binary, None, None)
        }
        "enum_declaration" => {
            if let Some(name) = ast::node_name(node, source) {
                model.enums.insert(name);
            }
            return;
        }
        _ => return,
    };
    model.nodes.push(SemanticNode {
        kind,
        file: &file.path,
        source,
        name,
        type_text,
        node,
    });
}

fn import_specifier(node: Node<'_>, source: &str) -> Option<String> {
    ast::field(node, "source")
        .map(|s| ast::text(s, source).trim_matches(['"', '\'']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_source, typescript_parser};

    fn enriched(source: &str) -> (Vec<ParsedFile>, Vec<(SemanticKind, Option<String>)>) {
        let mut parser = typescript_parser().unwrap();
        let parsed =
            parse_source(&mut parser, "src/test.ts".to_string(), source.to_string()).unwrap();
        let files = vec![parsed];
        let tags = enrich(&files)
            .nodes
            .iter()
            .map(|n| (n.kind, n.name.clone()))
            .collect();
        (files, tags)
    }

    #[test]
    fn emits_tracked_kinds_in_traversal_order() {
        let (_files, tags) = enriched(
            r#"
import { Money } from "./money";
class Order {
    status: string = "NEW";
    ship() {
        if (this.status === "SHIPPED") {
            throw new Error("already shipped");
        }
        this.status = "SHIPPED";
        this.notify();
    }
}
"#,
        );
        let kinds: Vec<SemanticKind> = tags.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                SemanticKind::Import,
                SemanticKind::Class,
                SemanticKind::Property,
                SemanticKind::Method,
                SemanticKind::If,
                SemanticKind::Binary,
                SemanticKind::Throw,
                SemanticKind::New,
                SemanticKind::Binary,
                SemanticKind::Call,
            ]
        );
        assert_eq!(tags[0].1.as_deref(), Some("./money"));
        assert_eq!(tags[1].1.as_deref(), Some("Order"));
        assert_eq!(tags[9].1.as_deref(), Some("this.notify"));
    }

    #[test]
    fn call_edges_prefer_the_enclosing_method() {
        let mut parser = typescript_parser().unwrap();
        let source = r#"
class Order {
    ship() {
        const send = function dispatch() { post(); };
        send();
    }
}
function topLevel() { helper(); }
callAtTopLevel();
"#;
        let files = vec![
            parse_source(&mut parser, "src/order.ts".to_string(), source.to_string()).unwrap(),
        ];
        let model = enrich(&files);
        let edges: Vec<(&str, &str)> = model
            .call_graph
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert!(edges.contains(&("Order.ship", "post")));
        assert!(edges.contains(&("Order.ship", "send")));
        assert!(edges.contains(&("src/order.ts#topLevel", "helper")));
        assert!(edges.contains(&("src/order.ts#<anonymous>", "callAtTopLevel")));
    }

    #[test]
    fn call_edges_deduplicate_by_endpoints() {
        let mut parser = typescript_parser().unwrap();
        let source = "function f() { g(); g(); g(1); }";
        let files = vec![
            parse_source(&mut parser, "a.ts".to_string(), source.to_string()).unwrap(),
        ];
        let model = enrich(&files);
        assert_eq!(model.call_graph.len(), 1);
        assert_eq!(model.call_graph[0].from, "a.ts#f");
        assert_eq!(model.call_graph[0].to, "g");
    }

    #[test]
    fn collects_declared_enums_and_property_types() {
        let mut parser = typescript_parser().unwrap();
        let source = r#"
enum OrderStatus { New, Shipped }
class Order {
    status: OrderStatus = OrderStatus.New;
    mark() { this.status = OrderStatus.Shipped; }
}
"#;
        let files = vec![
            parse_source(&mut parser, "a.ts".to_string(), source.to_string()).unwrap(),
        ];
        let model = enrich(&files);
        assert!(model.enums.contains("OrderStatus"));
        let property = model
            .nodes
            .iter()
            .find(|n| n.kind == SemanticKind::Property)
            .unwrap();
        assert_eq!(property.type_text.as_deref(), Some("OrderStatus"));
    }
}
