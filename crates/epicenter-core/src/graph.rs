//! Relation graph wrapper using petgraph::StableDiGraph keyed by identifier

use crate::model::{DomainRelation, RelationType};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Relation kinds that propagate impact during traversal. USES mirrors CALLS
/// in the serialized output but does not carry impact on its own.
pub fn is_impact_bearing(kind: RelationType) -> bool {
    matches!(
        kind,
        RelationType::Calls | RelationType::DependsOn | RelationType::Modifies
    )
}

/// A directed multigraph over string identifiers. Nodes are identifier
/// strings (entity, `<Class>.<method>`, `<file>#<callable>`, field targets,
/// verbatim callee text); edges are relation labels.
pub struct RelationGraph {
    inner: StableDiGraph<String, RelationType>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for RelationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl RelationGraph {
    pub fn new() -> Self {
        RelationGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_relations(relations: &[DomainRelation]) -> Self {
        let mut graph = Self::new();
        for relation in relations {
            graph.add_relation(relation);
        }
        graph
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Insert an edge, deduplicating by `(type, from, to)`.
    pub fn add_relation(&mut self, relation: &DomainRelation) {
        let source = self.ensure_node(&relation.from);
        let target = self.ensure_node(&relation.to);
        let duplicate = self
            .inner
            .edges_directed(source, Direction::Outgoing)
            .any(|e| e.target() == target && *e.weight() == relation.relation_type);
        if !duplicate {
            self.inner.add_edge(source, target, relation.relation_type);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// All identifiers, sorted ascending.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Every `(from, to, type)` triple in the graph.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, RelationType)> + '_ {
        self.inner.edge_indices().filter_map(move |edge| {
            let (source, target) = self.inner.edge_endpoints(edge)?;
            Some((
                self.inner.node_weight(source)?.as_str(),
                self.inner.node_weight(target)?.as_str(),
                *self.inner.edge_weight(edge)?,
            ))
        })
    }

    /// Distinct impact-bearing targets of `id`, sorted ascending.
    pub fn impact_targets(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut targets: Vec<&str> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| is_impact_bearing(*e.weight()))
            .filter_map(|e| self.inner.node_weight(e.target()).map(String::as_str))
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    /// Number of distinct outgoing impact-bearing targets.
    pub fn fan_out(&self, id: &str) -> usize {
        self.impact_targets(id).len()
    }

    pub fn max_fan_out(&self) -> usize {
        self.identifiers()
            .iter()
            .map(|id| self.fan_out(id))
            .max()
            .unwrap_or(0)
    }

    /// Breadth-first reach from `root` along impact-bearing edges, stopping
    /// beyond `max_depth`. Returns identifier → depth, root at depth zero.
    /// An unknown root yields a map containing only the root itself.
    pub fn bounded_reach(&self, root: &str, max_depth: usize) -> BTreeMap<String, usize> {
        let mut depths = BTreeMap::new();
        depths.insert(root.to_string(), 0);
        if !self.contains(root) {
            return depths;
        }
        let mut queue = VecDeque::new();
        queue.push_back((root.to_string(), 0usize));
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for target in self.impact_targets(&current) {
                if !depths.contains_key(target) {
                    depths.insert(target.to_string(), depth + 1);
                    queue.push_back((target.to_string(), depth + 1));
                }
            }
        }
        depths
    }

    /// Deepest bounded reach from any identifier in the graph.
    pub fn max_reach_depth(&self, max_depth: usize) -> usize {
        self.identifiers()
            .iter()
            .map(|id| {
                self.bounded_reach(id, max_depth)
                    .values()
                    .copied()
                    .max()
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0)
    }
}

impl Default for RelationGraph {
    fn default() -> Self {
        Self::new()
    }
}
