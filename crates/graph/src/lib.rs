//! # PSGC Graph
//!
//! The Philippine Standard Geographic Code hierarchy as a labeled property graph.
//!
//! ## Features
//!
//! - **Code classification** - one entity kind per record, from level tag, flags or code shape
//! - **Rule-driven relationships** - parent/child edges derived from code-segment equality
//! - **Hierarchy resolution** - root-to-node ancestor chain for a code of unknown kind
//! - **Node detail** - direct parents, children and hierarchy path in one lookup
//!
//! ## Architecture
//!
//! ```text
//! RawRecord[]
//!     │
//!     ├──> Classifier
//!     │      └─ Entity (kind, segments, filtered attributes)
//!     │
//!     ├──> GraphStore (petgraph)
//!     │      ├─ Nodes: Region, Province, CityMunicipality, Barangay, SubMunicipality
//!     │      └─ Edges: HAS_PROVINCE, HAS_CITY_MUNICIPALITY, HAS_BARANGAY, HAS_SUBMUNICIPALITY
//!     │
//!     ├──> Relationship Builder
//!     │      └─ one batch join per RelationshipRule (NCR: region -> city directly)
//!     │
//!     └──> Hierarchy Resolver
//!            ├─ bounded path from any region to the target
//!            └─ ordered by kind rank
//! ```

mod builder;
mod classifier;
mod code;
mod detail;
mod error;
mod graph;
mod resolver;
mod rules;
mod snapshot;
mod store;
mod types;

pub use builder::{PassStats, RelationshipBuilder};
pub use classifier::{classify, RawRecord};
pub use code::{normalize_code, CodeSegments, Segment, CODE_WIDTH, NCR_REGION};
pub use detail::{Neighbor, NodeDetail};
pub use error::{ClassificationError, GraphError, ResolveError, Result};
pub use graph::PsgcGraph;
pub use resolver::{HierarchyNode, HierarchyPath, HierarchyResolver, MAX_PATH_EDGES};
pub use rules::{RelationshipRule, SegmentPredicate, RELATIONSHIP_RULES};
pub use snapshot::{SnapshotFile, SNAPSHOT_SCHEMA_VERSION};
pub use store::{Adjacency, EdgeMode, GraphStore, InsertOutcome, StoreStats};
pub use types::{AttributeField, CityType, Entity, EntityKind, GraphEdge, RelationshipType};
