use crate::cache::HierarchyCache;
use psgc_graph::{
    normalize_code, EntityKind, GraphError, GraphStore, HierarchyNode, HierarchyPath,
    HierarchyResolver, NodeDetail, PsgcGraph, RelationshipType, ResolveError, StoreStats,
};
use psgc_protocol::{ErrorEnvelope, Page, PageRequest};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Failure of a read operation, already classified for the response envelope.
#[derive(Debug)]
pub(crate) enum ServiceError {
    NotFound(String),
    Unreachable(String),
    InvalidRequest(String),
    StoreUnavailable(String),
    Internal(String),
}

impl ServiceError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unreachable(_) => "unreachable",
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::StoreUnavailable(_) => "store_unavailable",
            ServiceError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(msg)
            | ServiceError::Unreachable(msg)
            | ServiceError::InvalidRequest(msg)
            | ServiceError::StoreUnavailable(msg)
            | ServiceError::Internal(msg) => msg,
        }
    }

    pub(crate) fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.code(), self.message());
        match self {
            ServiceError::NotFound(_) => {
                envelope.with_hint("Use a 10-digit PSGC code, e.g. 0301401007.")
            }
            ServiceError::Unreachable(_) => envelope.with_hint(
                "The entity exists but no region reaches it. Re-run `psgc import --clear`.",
            ),
            ServiceError::StoreUnavailable(_) => {
                envelope.with_hint("Run `psgc import <INPUT>` to build the snapshot first.")
            }
            ServiceError::InvalidRequest(_) => {
                envelope.with_hint("Check query parameters: q, kind, limit, offset.")
            }
            ServiceError::Internal(_) => envelope,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl From<ResolveError> for ServiceError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            ResolveError::Unreachable(_) => ServiceError::Unreachable(err.to_string()),
            ResolveError::Store(inner) => inner.into(),
        }
    }
}

impl From<GraphError> for ServiceError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::StoreUnavailable(msg) => ServiceError::StoreUnavailable(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthReport {
    pub(crate) status: &'static str,
    #[serde(flatten)]
    pub(crate) stats: StoreStats,
}

/// Hierarchy answer plus whether it came from the cache.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub(crate) path: HierarchyPath,
    pub(crate) cached: bool,
}

/// Read operations over a loaded graph, shared by the CLI and the HTTP API.
pub(crate) struct PsgcService {
    store: PsgcGraph,
    cache: Option<HierarchyCache>,
}

impl PsgcService {
    pub(crate) fn new(store: PsgcGraph, cache_size: usize) -> Self {
        Self {
            store,
            cache: HierarchyCache::new(cache_size),
        }
    }

    pub(crate) fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            stats: self.store.stats(),
        }
    }

    pub(crate) fn regions(&self, page: PageRequest) -> Result<Page<HierarchyNode>, ServiceError> {
        let regions = self.store.entities_of_kind(EntityKind::Region)?;
        Ok(page.paginate(regions.iter().map(HierarchyNode::from).collect()))
    }

    /// Children of `parent` across `relationship`. A parent of another kind is reported as not found.
    pub(crate) fn children(
        &self,
        parent: &str,
        parent_kind: EntityKind,
        relationship: RelationshipType,
        page: PageRequest,
    ) -> Result<Page<HierarchyNode>, ServiceError> {
        let code = normalize_code(parent).unwrap_or_else(|_| parent.trim().to_string());
        let entity = self
            .store
            .entity(&code)?
            .filter(|entity| entity.kind == parent_kind)
            .ok_or_else(|| ServiceError::NotFound(format!("No {parent_kind} with code {code}")))?;

        let mut seen = HashSet::new();
        let children = self
            .store
            .outgoing(&entity.code)?
            .into_iter()
            .filter(|adj| adj.relationship == relationship)
            .filter(|adj| seen.insert(adj.entity.code.clone()))
            .map(|adj| HierarchyNode::from(&adj.entity))
            .collect();
        Ok(page.paginate(children))
    }

    pub(crate) fn search(
        &self,
        query: &str,
        kind: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<HierarchyNode>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "query parameter q must be non-empty".to_string(),
            ));
        }
        let kind = kind
            .map(|raw| {
                EntityKind::parse(raw)
                    .ok_or_else(|| ServiceError::InvalidRequest(format!("unknown kind {raw:?}")))
            })
            .transpose()?;

        let matches = self.store.search(query, kind)?;
        Ok(page.paginate(matches.iter().map(HierarchyNode::from).collect()))
    }

    pub(crate) fn hierarchy(&self, code: &str) -> Result<Resolved, ServiceError> {
        let key = normalize_code(code).unwrap_or_else(|_| code.trim().to_string());
        if let Some(path) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            log::debug!("Hierarchy cache hit for {key}");
            return Ok(Resolved { path, cached: true });
        }

        let path = HierarchyResolver::new(&self.store).resolve(&key)?;
        if let Some(cache) = &self.cache {
            cache.insert(key, path.clone());
        }
        Ok(Resolved {
            path,
            cached: false,
        })
    }

    pub(crate) fn node(&self, code: &str) -> Result<NodeDetail, ServiceError> {
        Ok(HierarchyResolver::new(&self.store).describe(code)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use psgc_graph::{classify, EdgeMode, RawRecord, RelationshipBuilder};

    /// Region III chain plus NCR with one city and its sub-municipality.
    pub(crate) fn fixture_graph() -> PsgcGraph {
        let records = [
            ("0300000000", "Region III (Central Luzon)", "Reg"),
            ("0301400000", "Bulacan", "Prov"),
            ("0302100000", "Bataan", "Prov"),
            ("0301401000", "Angat", "Mun"),
            ("0301401007", "Binagbag", "Bgy"),
            ("1300000000", "National Capital Region (NCR)", "Reg"),
            ("1380601000", "City of Manila", "City"),
            ("1380601500", "Tondo I / II", "SubMun"),
        ];
        let entities = records
            .iter()
            .map(|(code, name, level)| {
                let record: RawRecord = serde_json::from_value(serde_json::json!({
                    "psgc_code": code,
                    "name": name,
                    "geographic_level": level,
                }))
                .unwrap();
                classify(&record).unwrap()
            })
            .collect();

        let mut graph = PsgcGraph::new();
        graph.insert_entities(entities).unwrap();
        RelationshipBuilder::new(EdgeMode::Dedupe)
            .build(&mut graph)
            .unwrap();
        graph
    }

    #[test]
    fn children_require_parent_of_matching_kind() {
        let service = PsgcService::new(fixture_graph(), 0);
        let provinces = service
            .children(
                "0300000000",
                EntityKind::Region,
                RelationshipType::HasProvince,
                PageRequest::default(),
            )
            .unwrap();
        let names: Vec<_> = provinces.items.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Bulacan", "Bataan"]);

        let err = service
            .children(
                "0301400000",
                EntityKind::Region,
                RelationshipType::HasProvince,
                PageRequest::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn ncr_lists_cities_directly() {
        let service = PsgcService::new(fixture_graph(), 0);
        let cities = service
            .children(
                "1300000000",
                EntityKind::Region,
                RelationshipType::HasCityMunicipality,
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(cities.total, 1);
        assert_eq!(cities.items[0].code, "1380601000");
    }

    #[test]
    fn cached_hierarchy_matches_uncached() {
        let service = PsgcService::new(fixture_graph(), 16);
        let first = service.hierarchy("0301401007").unwrap();
        let second = service.hierarchy(" 0301401007 ").unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.path, second.path);

        let uncached = PsgcService::new(fixture_graph(), 0)
            .hierarchy("0301401007")
            .unwrap();
        assert!(!uncached.cached);
        assert_eq!(uncached.path, first.path);
    }

    #[test]
    fn failed_resolutions_are_not_cached() {
        let service = PsgcService::new(fixture_graph(), 16);
        assert_eq!(service.hierarchy("9999999999").unwrap_err().code(), "not_found");
        assert_eq!(service.hierarchy("9999999999").unwrap_err().code(), "not_found");
    }

    #[test]
    fn search_validates_query_and_kind() {
        let service = PsgcService::new(fixture_graph(), 0);
        assert_eq!(
            service
                .search("  ", None, PageRequest::default())
                .unwrap_err()
                .code(),
            "invalid_request"
        );
        assert_eq!(
            service
                .search("b", Some("district"), PageRequest::default())
                .unwrap_err()
                .code(),
            "invalid_request"
        );

        let provinces = service
            .search("b", Some("province"), PageRequest::default())
            .unwrap();
        let names: Vec<_> = provinces.items.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Bulacan", "Bataan"]);
    }
}
