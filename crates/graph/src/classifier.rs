use crate::code::CodeSegments;
use crate::error::ClassificationError;
use crate::types::{AttributeField, CityType, Entity, EntityKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One row of the cleaned PSGC publication, as emitted by the pre-processor.
///
/// Spreadsheet exports are loose about types: codes and correspondence codes may
/// arrive as numbers, populations as floats or `"-"`. Every field is optional here;
/// [`classify`] decides what is actually required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub psgc_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub correspondence_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub geographic_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub old_names: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city_class: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub income_classification: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub urban_rural: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub population_2020: Option<u64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub region_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub province_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub municipality_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub barangay_code: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub admin_level: Option<String>,
    #[serde(default)]
    pub is_region: Option<bool>,
    #[serde(default)]
    pub is_province: Option<bool>,
    #[serde(default)]
    pub is_city_municipality: Option<bool>,
    #[serde(default)]
    pub is_barangay: Option<bool>,
}

impl RawRecord {
    fn field(&self, field: AttributeField) -> Option<&String> {
        match field {
            AttributeField::CorrespondenceCode => self.correspondence_code.as_ref(),
            AttributeField::OldNames => self.old_names.as_ref(),
            AttributeField::CityClass => self.city_class.as_ref(),
            AttributeField::IncomeClassification => self.income_classification.as_ref(),
            AttributeField::UrbanRural => self.urban_rural.as_ref(),
            AttributeField::Status => self.status.as_ref(),
        }
    }
}

/// Classify one record into exactly one entity kind.
///
/// Precedence: the geographic-level tag, then the boolean flags, then code shape.
pub fn classify(record: &RawRecord) -> Result<Entity, ClassificationError> {
    let raw_code = record
        .psgc_code
        .as_deref()
        .ok_or(ClassificationError::MissingCode)?;
    let segments = CodeSegments::from_parts(
        raw_code,
        record.region_code.as_deref(),
        record.province_code.as_deref(),
        record.municipality_code.as_deref(),
        record.barangay_code.as_deref(),
    )?;
    let code = segments.code();

    let kind = match level_kind(record)? {
        Some(kind) => kind,
        None => flag_kind(record).unwrap_or_else(|| shape_kind(&segments)),
    };

    let name = record
        .name
        .clone()
        .ok_or_else(|| ClassificationError::MissingName(code.clone()))?;

    let city_type = (kind == EntityKind::CityMunicipality).then(|| {
        if record.geographic_level.as_deref() == Some("City") {
            CityType::City
        } else {
            CityType::Municipality
        }
    });

    let attributes: BTreeMap<AttributeField, String> = kind
        .attribute_fields()
        .iter()
        .filter_map(|field| record.field(*field).map(|value| (*field, value.clone())))
        .collect();

    Ok(Entity {
        code,
        name,
        kind,
        population: record.population_2020,
        city_type,
        attributes,
        segments,
    })
}

/// Kind named by the source-level tag, if the record carries one.
fn level_kind(record: &RawRecord) -> Result<Option<EntityKind>, ClassificationError> {
    if let Some(level) = record.geographic_level.as_deref() {
        let kind = match level.to_ascii_lowercase().as_str() {
            "submun" => EntityKind::SubMunicipality,
            "reg" => EntityKind::Region,
            "prov" => EntityKind::Province,
            "city" | "mun" => EntityKind::CityMunicipality,
            "bgy" | "brgy" => EntityKind::Barangay,
            _ => return Err(ClassificationError::UnsupportedLevel(level.to_string())),
        };
        return Ok(Some(kind));
    }

    if let Some(level) = record.admin_level.as_deref() {
        let kind = match level {
            "sub_municipality" => EntityKind::SubMunicipality,
            "region" => EntityKind::Region,
            "province" => EntityKind::Province,
            "city_municipality" => EntityKind::CityMunicipality,
            "barangay" => EntityKind::Barangay,
            _ => return Err(ClassificationError::UnsupportedLevel(level.to_string())),
        };
        return Ok(Some(kind));
    }

    Ok(None)
}

fn flag_kind(record: &RawRecord) -> Option<EntityKind> {
    [
        (record.is_barangay, EntityKind::Barangay),
        (record.is_city_municipality, EntityKind::CityMunicipality),
        (record.is_province, EntityKind::Province),
        (record.is_region, EntityKind::Region),
    ]
    .into_iter()
    .find_map(|(flag, kind)| (flag == Some(true)).then_some(kind))
}

fn shape_kind(segments: &CodeSegments) -> EntityKind {
    use crate::code::Segment;
    if !segments.is_trivial(Segment::Barangay) {
        EntityKind::Barangay
    } else if !segments.is_trivial(Segment::Municipality) {
        EntityKind::CityMunicipality
    } else if !segments.is_trivial(Segment::Province) {
        EntityKind::Province
    } else {
        EntityKind::Region
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f >= 0.0 => {
                format!("{}", f as u64)
            }
            _ => n.to_string(),
        }),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    })
}
