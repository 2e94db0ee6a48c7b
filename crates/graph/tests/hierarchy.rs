use pretty_assertions::assert_eq;
use psgc_graph::{
    classify, EdgeMode, EntityKind, GraphStore, HierarchyResolver, PsgcGraph, RawRecord,
    RelationshipBuilder, RelationshipType, ResolveError,
};
use serde_json::{json, Value};
use std::collections::HashSet;

fn records() -> Vec<Value> {
    vec![
        // Central Luzon: full four-level chain plus a municipality without barangays.
        json!({"psgc_code": "0300000000", "name": "Region III (Central Luzon)", "geographic_level": "Reg", "population_2020": 12422172}),
        json!({"psgc_code": "0301400000", "name": "Bulacan", "geographic_level": "Prov", "income_classification": "1st"}),
        json!({"psgc_code": "0301401000", "name": "Angat", "geographic_level": "Mun", "income_classification": "1st"}),
        json!({"psgc_code": "0301401007", "name": "Binagbag", "geographic_level": "Bgy", "urban_rural": "R", "population_2020": 3045}),
        json!({"psgc_code": "0301401008", "name": "Donacion", "geographic_level": "Bgy"}),
        json!({"psgc_code": "0301402000", "name": "Balagtas", "geographic_level": "Mun"}),
        // NCR: no province layer.
        json!({"psgc_code": "1300000000", "name": "National Capital Region (NCR)", "geographic_level": "Reg"}),
        json!({"psgc_code": "1380601000", "name": "City of Manila", "geographic_level": "City", "city_class": "HUC"}),
        json!({"psgc_code": "1380601001", "name": "Barangay 1", "geographic_level": "Bgy"}),
        json!({"psgc_code": "1380601500", "name": "Tondo I / II", "geographic_level": "SubMun"}),
        json!({"psgc_code": "1381701000", "name": "Pateros", "geographic_level": "Mun"}),
    ]
}

fn build_graph(mode: EdgeMode) -> PsgcGraph {
    let mut graph = PsgcGraph::new();
    let entities = records()
        .into_iter()
        .map(|value| {
            let record: RawRecord = serde_json::from_value(value).unwrap();
            classify(&record).unwrap()
        })
        .collect();
    let outcome = graph.insert_entities(entities).unwrap();
    assert!(outcome.duplicates.is_empty());
    RelationshipBuilder::new(mode).build(&mut graph).unwrap();
    graph
}

fn path_codes(graph: &PsgcGraph, code: &str) -> Vec<String> {
    HierarchyResolver::new(graph)
        .resolve(code)
        .unwrap()
        .path
        .into_iter()
        .map(|node| node.code)
        .collect()
}

#[test]
fn standard_chain_resolves_to_four_levels() {
    let graph = build_graph(EdgeMode::Dedupe);
    let path = HierarchyResolver::new(&graph).resolve("0301401007").unwrap();

    let kinds: Vec<_> = path.path.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::Region,
            EntityKind::Province,
            EntityKind::CityMunicipality,
            EntityKind::Barangay,
        ]
    );
    assert_eq!(path.target().unwrap().code, "0301401007");
    assert_eq!(path.target().unwrap().population, Some(3045));
}

#[test]
fn ncr_city_skips_province_rank() {
    let graph = build_graph(EdgeMode::Dedupe);
    assert_eq!(
        path_codes(&graph, "1380601000"),
        vec!["1300000000".to_string(), "1380601000".to_string()]
    );
    assert_eq!(
        path_codes(&graph, "1381701000"),
        vec!["1300000000".to_string(), "1381701000".to_string()]
    );
}

#[test]
fn sub_municipality_sorts_into_leaf_rank() {
    let graph = build_graph(EdgeMode::Dedupe);
    let path = HierarchyResolver::new(&graph).resolve("1380601500").unwrap();
    let kinds: Vec<_> = path.path.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::Region,
            EntityKind::CityMunicipality,
            EntityKind::SubMunicipality,
        ]
    );
    assert_eq!(path.path.last().unwrap().kind.rank(), 3);
}

#[test]
fn region_path_is_itself() {
    let graph = build_graph(EdgeMode::Dedupe);
    let path = HierarchyResolver::new(&graph).resolve("0300000000").unwrap();
    assert_eq!(path.path.len(), 1);
    assert_eq!(path.path[0].kind, EntityKind::Region);
    assert_eq!(path.path[0].name, "Region III (Central Luzon)");
}

#[test]
fn unknown_code_is_not_found() {
    let graph = build_graph(EdgeMode::Dedupe);
    let resolver = HierarchyResolver::new(&graph);
    assert!(matches!(
        resolver.resolve("9999999999"),
        Err(ResolveError::NotFound(code)) if code == "9999999999"
    ));
    assert!(matches!(
        resolver.resolve("not-a-code"),
        Err(ResolveError::NotFound(_))
    ));
}

#[test]
fn orphan_is_unreachable_not_a_partial_path() {
    let mut graph = PsgcGraph::new();
    let orphan: RawRecord = serde_json::from_value(
        json!({"psgc_code": "0401001001", "name": "Orphan", "geographic_level": "Bgy"}),
    )
    .unwrap();
    graph.insert_entities(vec![classify(&orphan).unwrap()]).unwrap();
    RelationshipBuilder::default().build(&mut graph).unwrap();

    let err = HierarchyResolver::new(&graph)
        .resolve("0401001001")
        .unwrap_err();
    assert!(matches!(err, ResolveError::Unreachable(_)));
    assert_eq!(err.code(), "unreachable");
}

#[test]
fn every_entity_resolves_with_non_decreasing_rank() {
    let graph = build_graph(EdgeMode::Dedupe);
    let resolver = HierarchyResolver::new(&graph);
    for kind in EntityKind::ALL {
        for entity in graph.entities_of_kind(kind).unwrap() {
            let path = resolver.resolve(&entity.code).unwrap().path;
            assert_eq!(path.first().unwrap().kind, EntityKind::Region);
            assert_eq!(path.last().unwrap().code, entity.code);
            assert!(path.windows(2).all(|w| w[0].kind.rank() <= w[1].kind.rank()));
            let codes: HashSet<_> = path.iter().map(|n| n.code.as_str()).collect();
            assert_eq!(codes.len(), path.len());
        }
    }
}

#[test]
fn non_region_entities_have_exactly_one_parent() {
    let graph = build_graph(EdgeMode::Dedupe);
    for kind in EntityKind::ALL {
        for entity in graph.entities_of_kind(kind).unwrap() {
            let parents = graph.incoming(&entity.code).unwrap();
            if kind == EntityKind::Region {
                assert!(parents.is_empty());
            } else {
                assert_eq!(parents.len(), 1, "parents of {}", entity.code);
            }
        }
    }
}

#[test]
fn rebuilding_relationships_is_idempotent_by_default() {
    let mut graph = build_graph(EdgeMode::Dedupe);
    let before = graph.edge_count();
    let passes = RelationshipBuilder::default().build(&mut graph).unwrap();
    assert!(passes.iter().all(|p| p.created == 0));
    assert_eq!(graph.edge_count(), before);
}

#[test]
fn append_mode_doubles_edges_on_rerun() {
    let mut graph = build_graph(EdgeMode::Append);
    let before = graph.edge_count();
    RelationshipBuilder::new(EdgeMode::Append)
        .build(&mut graph)
        .unwrap();
    assert_eq!(graph.edge_count(), before * 2);

    // Detail lookup still reports each neighbour once.
    let detail = HierarchyResolver::new(&graph)
        .describe("0301401000")
        .unwrap();
    assert_eq!(detail.parents.len(), 1);
    assert_eq!(detail.children.len(), 2);
}

#[test]
fn describe_lists_parents_children_and_path() {
    let graph = build_graph(EdgeMode::Dedupe);
    let detail = HierarchyResolver::new(&graph)
        .describe("1380601000")
        .unwrap();

    assert_eq!(detail.node.name, "City of Manila");
    assert_eq!(detail.parents.len(), 1);
    assert_eq!(detail.parents[0].kind, EntityKind::Region);
    assert_eq!(
        detail.parents[0].relationship,
        RelationshipType::HasCityMunicipality
    );

    let children: Vec<_> = detail
        .children
        .iter()
        .map(|c| (c.relationship, c.code.as_str()))
        .collect();
    assert_eq!(
        children,
        vec![
            (RelationshipType::HasBarangay, "1380601001"),
            (RelationshipType::HasSubmunicipality, "1380601500"),
        ]
    );
    assert_eq!(detail.hierarchy.len(), 2);
}
