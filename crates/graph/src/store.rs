use crate::error::Result;
use crate::rules::RelationshipRule;
use crate::types::{Entity, EntityKind, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How relationship passes treat an edge that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Create an edge only if (parent, child, relationship) is absent.
    #[default]
    Dedupe,

    /// Always create; re-running without clearing accumulates duplicate edges.
    Append,
}

/// Result of a bulk entity insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,

    /// Codes rejected by the uniqueness index
    pub duplicates: Vec<String>,
}

/// One neighbour across a single edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacency {
    pub relationship: RelationshipType,
    pub entity: Entity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub entities: usize,
    pub edges: usize,
    pub by_kind: BTreeMap<EntityKind, usize>,
}

/// Graph-capable storage used by the importer and the resolver.
///
/// Any backend works as long as it offers bulk typed inserts with a unique code,
/// predicate-driven bulk edge creation, a bounded path search and plain lookups.
pub trait GraphStore {
    /// Insert a batch; codes already present are reported, not inserted.
    fn insert_entities(&mut self, batch: Vec<Entity>) -> Result<InsertOutcome>;

    /// Create every edge `rule` derives between the stored collections. Returns edges created.
    fn link_where(&mut self, rule: &RelationshipRule, mode: EdgeMode) -> Result<usize>;

    /// Shortest directed path of at most `max_edges` from any of `sources` to `target`,
    /// in path order. `Some(vec![target])` when the target is itself a source.
    fn shortest_path(
        &self,
        sources: &[String],
        target: &str,
        max_edges: usize,
    ) -> Result<Option<Vec<Entity>>>;

    fn entity(&self, code: &str) -> Result<Option<Entity>>;

    /// All entities of one kind, ordered by code.
    fn entities_of_kind(&self, kind: EntityKind) -> Result<Vec<Entity>>;

    /// Case-insensitive name substring (or exact code) lookup, ordered by code.
    fn search(&self, needle: &str, kind: Option<EntityKind>) -> Result<Vec<Entity>>;

    /// Parents of `code` via incoming edges.
    fn incoming(&self, code: &str) -> Result<Vec<Adjacency>>;

    /// Children of `code` via outgoing edges, ordered by child code.
    fn outgoing(&self, code: &str) -> Result<Vec<Adjacency>>;

    fn clear(&mut self) -> Result<()>;

    fn stats(&self) -> StoreStats;
}
