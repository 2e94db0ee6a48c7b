use crate::error::{GraphError, Result};
use crate::graph::PsgcGraph;
use crate::store::{EdgeMode, GraphStore};
use crate::types::{Entity, RelationshipType};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// JSON file holding a whole [`PsgcGraph`] between imports.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Load the graph. A missing, unreadable or incompatible file means the store is unavailable.
    pub async fn load(&self) -> Result<PsgcGraph> {
        let data = fs::read(&self.path).await.map_err(|err| {
            GraphError::StoreUnavailable(format!(
                "cannot read snapshot {}: {err}",
                self.path.display()
            ))
        })?;

        let snapshot: GraphSnapshot = serde_json::from_slice(&data).map_err(|err| {
            GraphError::StoreUnavailable(format!(
                "snapshot {} is corrupted: {err}",
                self.path.display()
            ))
        })?;

        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(GraphError::StoreUnavailable(format!(
                "snapshot {} has schema version {} (expected {})",
                self.path.display(),
                snapshot.schema_version,
                SNAPSHOT_SCHEMA_VERSION
            )));
        }

        let graph = snapshot.into_graph()?;
        debug!(
            "Loaded snapshot {}: {} entities, {} edges",
            self.path.display(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Write via a temporary file so readers never observe a half-written snapshot.
    pub async fn save(&self, graph: &PsgcGraph) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let snapshot = GraphSnapshot::from_graph(graph);
        let data = serde_json::to_vec(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.path).await?;
        info!(
            "Saved snapshot {} ({} entities, {} edges)",
            self.path.display(),
            snapshot.entities.len(),
            snapshot.edges.len()
        );
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    schema_version: u32,
    created_ms: u64,
    entities: Vec<Entity>,
    edges: Vec<SnapshotEdge>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEdge {
    parent: String,
    child: String,
    relationship: RelationshipType,
}

impl GraphSnapshot {
    fn from_graph(graph: &PsgcGraph) -> Self {
        let mut entities: Vec<Entity> = graph.entities().cloned().collect();
        entities.sort_by(|a, b| a.code.cmp(&b.code));
        let edges = graph
            .edges()
            .map(|(parent, child, relationship)| SnapshotEdge {
                parent: parent.to_string(),
                child: child.to_string(),
                relationship,
            })
            .collect();
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            created_ms: unix_ms_now(),
            entities,
            edges,
        }
    }

    fn into_graph(self) -> Result<PsgcGraph> {
        let mut graph = PsgcGraph::new();
        let outcome = graph.insert_entities(self.entities)?;
        if !outcome.duplicates.is_empty() {
            return Err(GraphError::StoreUnavailable(format!(
                "snapshot repeats {} codes",
                outcome.duplicates.len()
            )));
        }
        // Append keeps duplicate edges exactly as they were saved.
        for edge in self.edges {
            graph
                .add_edge(&edge.parent, &edge.child, edge.relationship, EdgeMode::Append)
                .map_err(|err| match err {
                    GraphError::NodeNotFound(code) => GraphError::StoreUnavailable(format!(
                        "snapshot edge {} {} -> {} references unknown code {code}",
                        edge.relationship, edge.parent, edge.child
                    )),
                    other => other,
                })?;
        }
        Ok(graph)
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeSegments;
    use crate::types::EntityKind;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn entity(code: &str, kind: EntityKind) -> Entity {
        Entity {
            code: code.to_string(),
            name: code.to_string(),
            kind,
            population: Some(1),
            city_type: None,
            attributes: BTreeMap::new(),
            segments: CodeSegments::parse(code).unwrap(),
        }
    }

    #[tokio::test]
    async fn save_then_load_preserves_edges() {
        let dir = tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested/graph.json"));

        let mut graph = PsgcGraph::new();
        graph
            .insert_entities(vec![
                entity("0300000000", EntityKind::Region),
                entity("0301400000", EntityKind::Province),
            ])
            .unwrap();
        graph
            .add_edge(
                "0300000000",
                "0301400000",
                RelationshipType::HasProvince,
                EdgeMode::Dedupe,
            )
            .unwrap();

        file.save(&graph).await.unwrap();
        assert!(file.exists().await);

        let loaded = file.load().await.unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(
            loaded.entity("0301400000").unwrap().unwrap().population,
            Some(1)
        );
    }

    #[tokio::test]
    async fn missing_or_corrupt_snapshot_is_store_unavailable() {
        let dir = tempdir().unwrap();
        let missing = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(matches!(
            missing.load().await,
            Err(GraphError::StoreUnavailable(_))
        ));

        let corrupt_path = dir.path().join("corrupt.json");
        tokio::fs::write(&corrupt_path, b"{not json").await.unwrap();
        assert!(matches!(
            SnapshotFile::new(corrupt_path).load().await,
            Err(GraphError::StoreUnavailable(_))
        ));

        let dangling_path = dir.path().join("dangling.json");
        let dangling = serde_json::json!({
            "schema_version": SNAPSHOT_SCHEMA_VERSION,
            "created_ms": 0,
            "entities": [],
            "edges": [{"parent": "0300000000", "child": "0301400000", "relationship": "HAS_PROVINCE"}],
        });
        tokio::fs::write(&dangling_path, dangling.to_string()).await.unwrap();
        match SnapshotFile::new(dangling_path).load().await {
            Err(GraphError::StoreUnavailable(msg)) => assert!(msg.contains("0300000000")),
            other => panic!("expected store unavailable, got {:?}", other.map(|g| g.node_count())),
        }
    }
}
