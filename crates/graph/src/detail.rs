use crate::error::ResolveError;
use crate::resolver::{canonical_code, HierarchyNode, HierarchyResolver};
use crate::store::{Adjacency, GraphStore};
use crate::types::{EntityKind, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Neighbour of a node across one edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub relationship: RelationshipType,
    pub kind: EntityKind,
    pub code: String,
    pub name: String,
}

/// "Describe this node": the node, its direct parents and children, and its hierarchy path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    pub node: HierarchyNode,
    pub parents: Vec<Neighbor>,
    pub children: Vec<Neighbor>,
    pub hierarchy: Vec<HierarchyNode>,
}

impl<S: GraphStore + ?Sized> HierarchyResolver<'_, S> {
    pub fn describe(&self, code: &str) -> Result<NodeDetail, ResolveError> {
        let code = canonical_code(code);
        let entity = self
            .store()
            .entity(&code)?
            .ok_or_else(|| ResolveError::NotFound(code.clone()))?;

        let parents = dedup_neighbors(self.store().incoming(&code)?);
        let children = dedup_neighbors(self.store().outgoing(&code)?);
        let hierarchy = self.resolve(&code)?.path;

        Ok(NodeDetail {
            node: HierarchyNode::from(&entity),
            parents,
            children,
            hierarchy,
        })
    }
}

fn dedup_neighbors(adjacent: Vec<Adjacency>) -> Vec<Neighbor> {
    let mut seen = HashSet::new();
    adjacent
        .into_iter()
        .filter(|a| seen.insert((a.relationship, a.entity.code.clone())))
        .map(|a| Neighbor {
            relationship: a.relationship,
            kind: a.entity.kind,
            code: a.entity.code,
            name: a.entity.name,
        })
        .collect()
}
