//! Parent -> child derivation rules.
//!
//! Each rule is a join between two entity collections over code segments. A single
//! generic batch join (see [`crate::GraphStore::link_where`]) interprets them.

use crate::code::{CodeSegments, Segment, NCR_REGION};
use crate::types::{EntityKind, RelationshipType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPredicate {
    /// Segments that must be equal on parent and child.
    pub shared: &'static [Segment],

    /// Segment that is non-trivial on the child and trivial on the parent.
    pub refines: Option<Segment>,

    /// Restrict parents (and, through `shared`, children) to one region.
    pub region: Option<&'static str>,
}

impl SegmentPredicate {
    pub fn accepts_parent(&self, parent: &CodeSegments) -> bool {
        if let Some(region) = self.region {
            if parent.region != region {
                return false;
            }
        }
        self.refines
            .map_or(true, |segment| parent.is_trivial(segment))
    }

    pub fn accepts_child(&self, child: &CodeSegments) -> bool {
        if let Some(region) = self.region {
            if child.region != region {
                return false;
            }
        }
        self.refines
            .map_or(true, |segment| !child.is_trivial(segment))
    }

    /// Join key over the shared segments.
    pub fn key(&self, segments: &CodeSegments) -> String {
        self.shared
            .iter()
            .map(|segment| segments.get(*segment))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn matches(&self, parent: &CodeSegments, child: &CodeSegments) -> bool {
        self.accepts_parent(parent)
            && self.accepts_child(child)
            && self.key(parent) == self.key(child)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipRule {
    pub relationship: RelationshipType,
    pub parent: EntityKind,
    pub child: EntityKind,
    pub predicate: SegmentPredicate,
}

/// The five passes, in the order the importer runs them. No rule reads edges created by another.
pub const RELATIONSHIP_RULES: [RelationshipRule; 5] = [
    RelationshipRule {
        relationship: RelationshipType::HasProvince,
        parent: EntityKind::Region,
        child: EntityKind::Province,
        predicate: SegmentPredicate {
            shared: &[Segment::Region],
            refines: Some(Segment::Province),
            region: None,
        },
    },
    RelationshipRule {
        relationship: RelationshipType::HasCityMunicipality,
        parent: EntityKind::Province,
        child: EntityKind::CityMunicipality,
        predicate: SegmentPredicate {
            shared: &[Segment::Region, Segment::Province],
            refines: Some(Segment::Municipality),
            region: None,
        },
    },
    RelationshipRule {
        relationship: RelationshipType::HasBarangay,
        parent: EntityKind::CityMunicipality,
        child: EntityKind::Barangay,
        predicate: SegmentPredicate {
            shared: &[Segment::Region, Segment::Province, Segment::Municipality],
            refines: Some(Segment::Barangay),
            region: None,
        },
    },
    RelationshipRule {
        relationship: RelationshipType::HasSubmunicipality,
        parent: EntityKind::CityMunicipality,
        child: EntityKind::SubMunicipality,
        predicate: SegmentPredicate {
            shared: &[Segment::Region, Segment::Province, Segment::Municipality],
            refines: None,
            region: None,
        },
    },
    // NCR has no provinces: its cities/municipalities hang directly off the region.
    RelationshipRule {
        relationship: RelationshipType::HasCityMunicipality,
        parent: EntityKind::Region,
        child: EntityKind::CityMunicipality,
        predicate: SegmentPredicate {
            shared: &[Segment::Region],
            refines: None,
            region: Some(NCR_REGION),
        },
    },
];
