use crate::error::{GraphError, Result};
use crate::rules::RelationshipRule;
use crate::store::{Adjacency, EdgeMode, GraphStore, InsertOutcome, StoreStats};
use crate::types::{Entity, EntityKind, GraphEdge, RelationshipType};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// In-memory administrative graph backed by petgraph.
pub struct PsgcGraph {
    /// Directed graph (parent -> child)
    graph: DiGraph<Entity, GraphEdge>,

    /// Code -> NodeIndex (uniqueness index)
    code_index: HashMap<String, NodeIndex>,

    /// Kind -> nodes, for rule joins
    kind_index: HashMap<EntityKind, Vec<NodeIndex>>,

    /// Existing (parent, child, relationship) triples
    edge_index: HashSet<(NodeIndex, NodeIndex, RelationshipType)>,
}

impl PsgcGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            code_index: HashMap::new(),
            kind_index: HashMap::new(),
            edge_index: HashSet::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn find_node(&self, code: &str) -> Option<NodeIndex> {
        self.code_index.get(code).copied()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&Entity> {
        self.graph.node_weight(idx)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.graph.node_weights()
    }

    /// Every edge as (parent code, child code, relationship), duplicates included.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, RelationshipType)> {
        self.graph.edge_references().filter_map(move |edge| {
            let parent = self.graph.node_weight(edge.source())?;
            let child = self.graph.node_weight(edge.target())?;
            Some((
                parent.code.as_str(),
                child.code.as_str(),
                edge.weight().relationship,
            ))
        })
    }

    /// Add a single edge between stored entities. Returns whether an edge was created.
    pub fn add_edge(
        &mut self,
        parent: &str,
        child: &str,
        relationship: RelationshipType,
        mode: EdgeMode,
    ) -> Result<bool> {
        let from = self
            .find_node(parent)
            .ok_or_else(|| GraphError::NodeNotFound(parent.to_string()))?;
        let to = self
            .find_node(child)
            .ok_or_else(|| GraphError::NodeNotFound(child.to_string()))?;
        Ok(self.connect(from, to, relationship, mode))
    }

    fn connect(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        relationship: RelationshipType,
        mode: EdgeMode,
    ) -> bool {
        let fresh = self.edge_index.insert((from, to, relationship));
        if !fresh && mode == EdgeMode::Dedupe {
            return false;
        }
        self.graph.add_edge(from, to, GraphEdge { relationship });
        true
    }

    fn nodes_of_kind(&self, kind: EntityKind) -> &[NodeIndex] {
        self.kind_index.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn sorted_by_code(&self, nodes: impl Iterator<Item = NodeIndex>) -> Vec<Entity> {
        let mut entities: Vec<Entity> = nodes
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect();
        entities.sort_by(|a, b| a.code.cmp(&b.code));
        entities
    }

    fn adjacent(&self, code: &str, direction: Direction) -> Vec<Adjacency> {
        let Some(idx) = self.find_node(code) else {
            return Vec::new();
        };
        let mut adjacent: Vec<Adjacency> = self
            .graph
            .edges_directed(idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                self.graph.node_weight(other).map(|entity| Adjacency {
                    relationship: edge.weight().relationship,
                    entity: entity.clone(),
                })
            })
            .collect();
        adjacent.sort_by(|a, b| {
            a.entity
                .code
                .cmp(&b.entity.code)
                .then(a.relationship.cmp(&b.relationship))
        });
        adjacent
    }
}

impl Default for PsgcGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for PsgcGraph {
    fn insert_entities(&mut self, batch: Vec<Entity>) -> Result<InsertOutcome> {
        let mut outcome = InsertOutcome::default();
        for entity in batch {
            if self.code_index.contains_key(&entity.code) {
                outcome.duplicates.push(entity.code);
                continue;
            }
            let code = entity.code.clone();
            let kind = entity.kind;
            let idx = self.graph.add_node(entity);
            self.code_index.insert(code, idx);
            self.kind_index.entry(kind).or_default().push(idx);
            outcome.inserted += 1;
        }
        Ok(outcome)
    }

    fn link_where(&mut self, rule: &RelationshipRule, mode: EdgeMode) -> Result<usize> {
        let predicate = rule.predicate;

        // Hash join: index parents by shared-segment key, then probe with each child.
        let mut parents: HashMap<String, Vec<NodeIndex>> = HashMap::new();
        for &idx in self.nodes_of_kind(rule.parent) {
            let Some(parent) = self.graph.node_weight(idx) else {
                continue;
            };
            if predicate.accepts_parent(&parent.segments) {
                parents
                    .entry(predicate.key(&parent.segments))
                    .or_default()
                    .push(idx);
            }
        }

        let mut pairs = Vec::new();
        for &idx in self.nodes_of_kind(rule.child) {
            let Some(child) = self.graph.node_weight(idx) else {
                continue;
            };
            if !predicate.accepts_child(&child.segments) {
                continue;
            }
            if let Some(matches) = parents.get(&predicate.key(&child.segments)) {
                pairs.extend(matches.iter().map(|&parent| (parent, idx)));
            }
        }

        let mut created = 0;
        for (from, to) in pairs {
            if self.connect(from, to, rule.relationship, mode) {
                created += 1;
            }
        }
        Ok(created)
    }

    fn shortest_path(
        &self,
        sources: &[String],
        target: &str,
        max_edges: usize,
    ) -> Result<Option<Vec<Entity>>> {
        let Some(target_idx) = self.find_node(target) else {
            return Ok(None);
        };
        let sources: HashSet<NodeIndex> = sources
            .iter()
            .filter_map(|code| self.find_node(code))
            .collect();

        // Walk parents breadth-first from the target; the first source reached ends the
        // shortest path. `toward_target[n]` is n's successor on the way back down.
        let mut toward_target: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited = HashSet::from([target_idx]);
        let mut queue = VecDeque::from([(target_idx, 0usize)]);
        let mut found = None;

        while let Some((current, depth)) = queue.pop_front() {
            if sources.contains(&current) {
                found = Some(current);
                break;
            }
            if depth == max_edges {
                continue;
            }
            for edge in self.graph.edges_directed(current, Direction::Incoming) {
                let parent = edge.source();
                if visited.insert(parent) {
                    toward_target.insert(parent, current);
                    queue.push_back((parent, depth + 1));
                }
            }
        }

        let Some(mut current) = found else {
            return Ok(None);
        };
        let mut path = Vec::new();
        loop {
            let entity = self
                .graph
                .node_weight(current)
                .ok_or_else(|| GraphError::Other(format!("dangling node {current:?}")))?;
            path.push(entity.clone());
            match toward_target.get(&current) {
                Some(&next) => current = next,
                None => break,
            }
        }
        Ok(Some(path))
    }

    fn entity(&self, code: &str) -> Result<Option<Entity>> {
        Ok(self
            .find_node(code)
            .and_then(|idx| self.graph.node_weight(idx))
            .cloned())
    }

    fn entities_of_kind(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        Ok(self.sorted_by_code(self.nodes_of_kind(kind).iter().copied()))
    }

    fn search(&self, needle: &str, kind: Option<EntityKind>) -> Result<Vec<Entity>> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self.graph.node_indices().filter(|&idx| {
            self.graph.node_weight(idx).is_some_and(|entity| {
                kind.map_or(true, |k| entity.kind == k)
                    && (entity.code == needle || entity.name.to_lowercase().contains(&needle))
            })
        });
        Ok(self.sorted_by_code(matches))
    }

    fn incoming(&self, code: &str) -> Result<Vec<Adjacency>> {
        Ok(self.adjacent(code, Direction::Incoming))
    }

    fn outgoing(&self, code: &str) -> Result<Vec<Adjacency>> {
        Ok(self.adjacent(code, Direction::Outgoing))
    }

    fn clear(&mut self) -> Result<()> {
        self.graph.clear();
        self.code_index.clear();
        self.kind_index.clear();
        self.edge_index.clear();
        Ok(())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            entities: self.node_count(),
            edges: self.edge_count(),
            by_kind: self
                .kind_index
                .iter()
                .map(|(kind, nodes)| (*kind, nodes.len()))
                .collect(),
        }
    }
}
