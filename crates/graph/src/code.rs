//! Parsing of the fixed-width `RR PPP MM BBB` administrative code.

use crate::error::ClassificationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total width of a PSGC code.
pub const CODE_WIDTH: usize = 10;

/// Region segment of the National Capital Region, the only region without provinces.
pub const NCR_REGION: &str = "13";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Region,
    Province,
    Municipality,
    Barangay,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::Region,
        Segment::Province,
        Segment::Municipality,
        Segment::Barangay,
    ];

    pub const fn width(self) -> usize {
        match self {
            Segment::Region => 2,
            Segment::Province => 3,
            Segment::Municipality => 2,
            Segment::Barangay => 3,
        }
    }

    pub const fn offset(self) -> usize {
        match self {
            Segment::Region => 0,
            Segment::Province => 2,
            Segment::Municipality => 5,
            Segment::Barangay => 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Segment::Region => "region",
            Segment::Province => "province",
            Segment::Municipality => "municipality",
            Segment::Barangay => "barangay",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four raw segments of a code, retained on every entity for relationship derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeSegments {
    pub region: String,
    pub province: String,
    pub municipality: String,
    pub barangay: String,
}

impl CodeSegments {
    /// Split a normalized 10-digit code.
    pub fn parse(code: &str) -> Result<Self, ClassificationError> {
        let code = normalize_code(code)?;
        let slice = |segment: Segment| {
            code[segment.offset()..segment.offset() + segment.width()].to_string()
        };
        Ok(Self {
            region: slice(Segment::Region),
            province: slice(Segment::Province),
            municipality: slice(Segment::Municipality),
            barangay: slice(Segment::Barangay),
        })
    }

    /// Build segments for `code`, checking any explicitly supplied segment values against it.
    pub fn from_parts(
        code: &str,
        region: Option<&str>,
        province: Option<&str>,
        municipality: Option<&str>,
        barangay: Option<&str>,
    ) -> Result<Self, ClassificationError> {
        let parsed = Self::parse(code)?;
        let explicit = [
            (Segment::Region, region),
            (Segment::Province, province),
            (Segment::Municipality, municipality),
            (Segment::Barangay, barangay),
        ];
        for (segment, value) in explicit {
            let Some(value) = value.map(str::trim) else {
                continue;
            };
            validate_segment(segment, value)?;
            if value != parsed.get(segment) {
                return Err(ClassificationError::SegmentMismatch {
                    segment,
                    value: value.to_string(),
                    code: parsed.code(),
                });
            }
        }
        Ok(parsed)
    }

    pub fn get(&self, segment: Segment) -> &str {
        match segment {
            Segment::Region => &self.region,
            Segment::Province => &self.province,
            Segment::Municipality => &self.municipality,
            Segment::Barangay => &self.barangay,
        }
    }

    /// All-zero segment: "not specified at this level".
    pub fn is_trivial(&self, segment: Segment) -> bool {
        self.get(segment).bytes().all(|b| b == b'0')
    }

    pub fn code(&self) -> String {
        let mut code = String::with_capacity(CODE_WIDTH);
        for segment in Segment::ALL {
            code.push_str(self.get(segment));
        }
        code
    }
}

/// Trim a raw code and restore the leading zero spreadsheet exports drop from
/// regions 01-09.
pub fn normalize_code(raw: &str) -> Result<String, ClassificationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClassificationError::MissingCode);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClassificationError::MalformedCode(trimmed.to_string()));
    }
    match trimmed.len() {
        CODE_WIDTH => Ok(trimmed.to_string()),
        len if len == CODE_WIDTH - 1 => Ok(format!("0{trimmed}")),
        _ => Err(ClassificationError::MalformedCode(trimmed.to_string())),
    }
}

fn validate_segment(segment: Segment, value: &str) -> Result<(), ClassificationError> {
    if value.len() != segment.width() {
        return Err(ClassificationError::SegmentWidth {
            segment,
            value: value.to_string(),
            width: segment.width(),
        });
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClassificationError::NonNumericSegment {
            segment,
            value: value.to_string(),
        });
    }
    Ok(())
}
