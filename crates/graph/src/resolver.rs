use crate::code::normalize_code;
use crate::error::ResolveError;
use crate::store::GraphStore;
use crate::types::{AttributeField, CityType, Entity, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Longest region -> leaf chain: Region, Province, CityMunicipality, Barangay/SubMunicipality.
pub const MAX_PATH_EDGES: usize = 4;

/// One element of a hierarchy path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub kind: EntityKind,
    pub code: String,
    pub name: String,
    pub population: Option<u64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub city_type: Option<CityType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<AttributeField, String>,
}

impl From<&Entity> for HierarchyNode {
    fn from(entity: &Entity) -> Self {
        Self {
            kind: entity.kind,
            code: entity.code.clone(),
            name: entity.name.clone(),
            population: entity.population,
            city_type: entity.city_type,
            attributes: entity.attributes.clone(),
        }
    }
}

/// Root-to-target chain for one code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyPath {
    pub code: String,
    pub path: Vec<HierarchyNode>,
}

impl HierarchyPath {
    pub fn target(&self) -> Option<&HierarchyNode> {
        self.path.last()
    }
}

/// Answers "which chain of ancestors leads to this code" for any entity kind.
///
/// Borrows its store; construct one per request.
pub struct HierarchyResolver<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> HierarchyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn resolve(&self, code: &str) -> Result<HierarchyPath, ResolveError> {
        let code = canonical_code(code);
        let target = self
            .store
            .entity(&code)?
            .ok_or_else(|| ResolveError::NotFound(code.clone()))?;

        if target.kind == EntityKind::Region {
            return Ok(HierarchyPath {
                path: vec![HierarchyNode::from(&target)],
                code,
            });
        }

        let regions: Vec<String> = self
            .store
            .entities_of_kind(EntityKind::Region)?
            .into_iter()
            .map(|region| region.code)
            .collect();

        let mut nodes = self
            .store
            .shortest_path(&regions, &code, MAX_PATH_EDGES)?
            .ok_or_else(|| ResolveError::Unreachable(code.clone()))?;

        // Rank, not path position, decides order. The sort is stable.
        nodes.sort_by_key(Entity::rank);
        let mut seen = HashSet::new();
        nodes.retain(|entity| seen.insert(entity.code.clone()));

        log::debug!("Resolved {code}: {} levels", nodes.len());
        Ok(HierarchyPath {
            path: nodes.iter().map(HierarchyNode::from).collect(),
            code,
        })
    }
}

/// Normalized code when the input looks like one; otherwise the trimmed input,
/// which simply will not be found.
pub(crate) fn canonical_code(code: &str) -> String {
    normalize_code(code).unwrap_or_else(|_| code.trim().to_string())
}
