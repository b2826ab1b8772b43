//! Domain model inference: class inventory, entity qualification, relations

use epicenter_core::{
    DomainEntity, DomainRelation, RelationType, SemanticKind, TECHNICAL_SUFFIXES,
};
use epicenter_parser::ast;
use epicenter_parser::semantic::{SemanticModel, SemanticNode};
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::Node;

#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub name: String,
    pub readonly: bool,
    pub type_text: Option<String>,
    /// Declared as an enum, or as a union of literal types (the TypeScript
    /// idiom standing in for one).
    pub enum_typed: bool,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub public: bool,
}

/// Every class in the project, entity or not. The architectural analyzer
/// needs the full inventory.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub file_path: String,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
}

/// Stage-three output.
#[derive(Debug)]
pub struct DomainModel {
    pub classes: Vec<ClassInfo>,
    pub entities: Vec<DomainEntity>,
    pub relations: Vec<DomainRelation>,
}

impl DomainModel {
    pub fn entity(&self, name: &str) -> Option<&DomainEntity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn is_entity(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name == name)
    }
}

#[derive(Debug)]
struct AssignmentRecord {
    method: String,
    field: String,
    in_conditional: bool,
}

#[derive(Debug)]
struct ClassAccumulator {
    name: String,
    file_path: String,
    properties: Vec<PropertyInfo>,
    methods: Vec<MethodInfo>,
    assignments: Vec<AssignmentRecord>,
    has_conditional: bool,
}

/// Build the domain model from the enriched semantic nodes.
pub fn build(semantic: &SemanticModel<'_>) -> DomainModel {
    // Class accumulators keyed by (file, class AST node id); classes precede
    // their members in traversal order.
    let mut accumulators: HashMap<(&str, usize), ClassAccumulator> = HashMap::new();
    let mut order: Vec<(&str, usize)> = Vec::new();

    for node in &semantic.nodes {
        match node.kind {
            SemanticKind::Class => {
                let Some(name) = node.name.clone() else {
                    continue;
                };
                let key = (node.file, node.node.id());
                accumulators.entry(key).or_insert_with(|| {
                    order.push(key);
                    ClassAccumulator {
                        name,
                        file_path: node.file.to_string(),
                        properties: Vec::new(),
                        methods: Vec::new(),
                        assignments: Vec::new(),
                        has_conditional: false,
                    }
                });
            }
            SemanticKind::Property => {
                let Some((key, _)) = owning_class(node.node, node.file) else {
                    continue;
                };
                let Some(name) = node.name.clone() else {
                    continue;
                };
                if let Some(accumulator) = accumulators.get_mut(&key) {
                    accumulator.properties.push(PropertyInfo {
                        name,
                        readonly: ast::property_is_readonly(node.node),
                        type_text: node.type_text.clone(),
                        enum_typed: is_enum_like(node, &semantic.enums),
                    });
                }
            }
            SemanticKind::Method => {
                let Some((key, _)) = owning_class(node.node, node.file) else {
                    continue;
                };
                let Some(name) = node.name.clone() else {
                    continue;
                };
                if let Some(accumulator) = accumulators.get_mut(&key) {
                    accumulator.methods.push(MethodInfo {
                        name,
                        public: ast::method_is_public(node.node, node.source),
                    });
                }
            }
            SemanticKind::Binary => {
                let Some(field) = ast::this_assignment_target(node.node, node.source) else {
                    continue;
                };
                let Some(method) = ast::enclosing_method(node.node) else {
                    continue;
                };
                let Some(method_name) = ast::node_name(method, node.source) else {
                    continue;
                };
                let Some((key, _)) = owning_class(method, node.file) else {
                    continue;
                };
                if let Some(accumulator) = accumulators.get_mut(&key) {
                    accumulator.assignments.push(AssignmentRecord {
                        method: method_name,
                        field,
                        in_conditional: ast::inside_conditional(node.node),
                    });
                }
            }
            SemanticKind::If => {
                let Some(method) = ast::enclosing_method(node.node) else {
                    continue;
                };
                if let Some((key, _)) = owning_class(method, node.file) {
                    if let Some(accumulator) = accumulators.get_mut(&key) {
                        accumulator.has_conditional = true;
                    }
                }
            }
            _ => {}
        }
    }

    let mut classes = Vec::new();
    let mut entities = Vec::new();
    let mut relations = Vec::new();
    let mut seen: HashSet<(RelationType, String, String)> = HashSet::new();

    for key in &order {
        let Some(accumulator) = accumulators.get(key) else {
            continue;
        };
        if let Some(entity) = qualify(accumulator) {
            // MODIFIES: one edge per state-field assignment, deduplicated
            for assignment in &accumulator.assignments {
                if !entity.state_fields.contains(&assignment.field) {
                    continue;
                }
                push_relation(
                    &mut relations,
                    &mut seen,
                    RelationType::Modifies,
                    format!("{}.{}", entity.name, assignment.method),
                    format!("{}.{}", entity.name, assignment.field),
                );
            }
            entities.push(entity);
        }
        classes.push(ClassInfo {
            name: accumulator.name.clone(),
            file_path: accumulator.file_path.clone(),
            properties: accumulator.properties.clone(),
            methods: accumulator.methods.clone(),
        });
    }

    // Every call expression contributes both a CALLS and a USES edge.
    for edge in &semantic.call_graph {
        push_relation(
            &mut relations,
            &mut seen,
            RelationType::Calls,
            edge.from.clone(),
            edge.to.clone(),
        );
        push_relation(
            &mut relations,
            &mut seen,
            RelationType::Uses,
            edge.from.clone(),
            edge.to.clone(),
        );
    }

    DomainModel {
        classes,
        entities,
        relations,
    }
}

fn push_relation(
    relations: &mut Vec<DomainRelation>,
    seen: &mut HashSet<(RelationType, String, String)>,
    relation_type: RelationType,
    from: String,
    to: String,
) {
    if seen.insert((relation_type, from.clone(), to.clone())) {
        relations.push(DomainRelation {
            relation_type,
            from,
            to,
        });
    }
}

fn owning_class<'t>(node: Node<'t>, file: &'t str) -> Option<((&'t str, usize), Node<'t>)> {
    let class = ast::enclosing_class(node)?;
    Some(((file, class.id()), class))
}

/// A class qualifies as a domain entity iff it is non-technical, has mutable
/// properties, mutates at least one of them in its own methods, and shows a
/// conditional signal (enum-typed property, a conditional in a method, or a
/// mutation inside a conditional branch).
fn qualify(accumulator: &ClassAccumulator) -> Option<DomainEntity> {
    let technical = TECHNICAL_SUFFIXES
        .iter()
        .any(|suffix| accumulator.name.ends_with(suffix));
    if technical {
        return None;
    }

    let mutable: Vec<&PropertyInfo> = accumulator
        .properties
        .iter()
        .filter(|p| !p.readonly)
        .collect();
    if mutable.is_empty() {
        return None;
    }

    let assigned: BTreeSet<&str> = accumulator
        .assignments
        .iter()
        .filter(|a| mutable.iter().any(|p| p.name == a.field))
        .map(|a| a.field.as_str())
        .collect();
    if assigned.is_empty() {
        return None;
    }

    let enum_signal = accumulator.properties.iter().any(|p| p.enum_typed);
    let conditional_assignment = accumulator
        .assignments
        .iter()
        .any(|a| a.in_conditional && mutable.iter().any(|p| p.name == a.field));
    if !(enum_signal || accumulator.has_conditional || conditional_assignment) {
        return None;
    }

    // declaration order, filtered to what is actually assigned
    let state_fields: Vec<String> = mutable
        .iter()
        .filter(|p| assigned.contains(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect();

    Some(DomainEntity {
        name: accumulator.name.clone(),
        properties: accumulator
            .properties
            .iter()
            .map(|p| p.name.clone())
            .collect(),
        methods: accumulator.methods.iter().map(|m| m.name.clone()).collect(),
        state_fields,
        file_path: accumulator.file_path.clone(),
    })
}

/// Enum-typed outright, or a union made only of literal types.
fn is_enum_like(property: &SemanticNode<'_>, enums: &BTreeSet<String>) -> bool {
    if property
        .type_text
        .as_deref()
        .is_some_and(|t| enums.contains(t))
    {
        return true;
    }
    let Some(annotation) = ast::field(property.node, "type") else {
        return false;
    };
    ast::named_children(annotation)
        .into_iter()
        .next_back()
        .is_some_and(|ty| {
            ty.kind() == "union_type" && {
                let leaves = union_leaves(ty);
                !leaves.is_empty() && leaves.iter().all(|l| l.kind() == "literal_type")
            }
        })
}

fn union_leaves(node: Node<'_>) -> Vec<Node<'_>> {
    if node.kind() == "union_type" {
        ast::named_children(node)
            .into_iter()
            .flat_map(union_leaves)
            .collect()
    } else {
        vec![node]
    }
}
