use crate::code::CodeSegments;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Administrative entity kind (node label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Region,
    Province,
    CityMunicipality,
    Barangay,
    SubMunicipality,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Region,
        EntityKind::Province,
        EntityKind::CityMunicipality,
        EntityKind::Barangay,
        EntityKind::SubMunicipality,
    ];

    /// Position in a root-to-leaf hierarchy path. Barangays and sub-municipalities share rank 3.
    pub const fn rank(self) -> u8 {
        match self {
            EntityKind::Region => 0,
            EntityKind::Province => 1,
            EntityKind::CityMunicipality => 2,
            EntityKind::Barangay | EntityKind::SubMunicipality => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Region => "Region",
            EntityKind::Province => "Province",
            EntityKind::CityMunicipality => "CityMunicipality",
            EntityKind::Barangay => "Barangay",
            EntityKind::SubMunicipality => "SubMunicipality",
        }
    }

    /// Attributes a record of this kind may carry; everything else is dropped at classification.
    pub const fn attribute_fields(self) -> &'static [AttributeField] {
        use AttributeField::*;
        match self {
            EntityKind::Region => &[CorrespondenceCode, OldNames, Status],
            EntityKind::Province => &[CorrespondenceCode, OldNames, IncomeClassification, Status],
            EntityKind::CityMunicipality => &[
                CorrespondenceCode,
                OldNames,
                CityClass,
                IncomeClassification,
                Status,
            ],
            EntityKind::Barangay => &[CorrespondenceCode, OldNames, UrbanRural, Status],
            EntityKind::SubMunicipality => &[CorrespondenceCode, OldNames, Status],
        }
    }

    /// Accepts the label (`CityMunicipality`) or its snake-case form (`city_municipality`).
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.label().to_ascii_lowercase() == folded)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived `type` of a city/municipality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityType {
    City,
    Municipality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeField {
    CorrespondenceCode,
    OldNames,
    CityClass,
    IncomeClassification,
    UrbanRural,
    Status,
}

/// Directed parent -> child relationship (edge label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    HasProvince,
    HasCityMunicipality,
    HasBarangay,
    HasSubmunicipality,
}

impl RelationshipType {
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationshipType::HasProvince => "HAS_PROVINCE",
            RelationshipType::HasCityMunicipality => "HAS_CITY_MUNICIPALITY",
            RelationshipType::HasBarangay => "HAS_BARANGAY",
            RelationshipType::HasSubmunicipality => "HAS_SUBMUNICIPALITY",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node in the administrative graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// 10-digit PSGC code (primary key)
    pub code: String,

    /// Display name
    pub name: String,

    pub kind: EntityKind,

    /// 2020 census population, when published
    pub population: Option<u64>,

    /// Only set for cities/municipalities
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub city_type: Option<CityType>,

    /// Non-null attributes allowed for `kind`
    #[serde(default)]
    pub attributes: BTreeMap<AttributeField, String>,

    pub segments: CodeSegments,
}

impl Entity {
    pub fn rank(&self) -> u8 {
        self.kind.rank()
    }

    pub fn attribute(&self, field: AttributeField) -> Option<&str> {
        self.attributes.get(&field).map(String::as_str)
    }
}

/// Edge in the administrative graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub relationship: RelationshipType,
}
