use psgc_graph::{EntityKind, PassStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Skipped records beyond this many are counted but not listed.
pub const MAX_LISTED_SKIPS: usize = 100;

/// A record left out of the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub code: Option<String>,
    pub reason: String,
}

/// Statistics about an import run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    /// Records read from the input
    pub records: usize,

    /// Entities inserted, per kind
    pub inserted: BTreeMap<EntityKind, usize>,

    /// Records skipped as malformed or unsupported
    pub skipped: usize,

    /// First skipped records, with reasons
    pub skipped_records: Vec<SkippedRecord>,

    /// Codes rejected because they were already stored
    pub duplicates: usize,

    /// Edges created per relationship pass
    pub relationships: Vec<PassStats>,

    /// Whether the store was wiped first
    pub cleared: bool,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inserted(&mut self, kind: EntityKind, count: usize) {
        *self.inserted.entry(kind).or_insert(0) += count;
    }

    pub fn add_skip(&mut self, skip: SkippedRecord) {
        self.skipped += 1;
        if self.skipped_records.len() < MAX_LISTED_SKIPS {
            self.skipped_records.push(skip);
        }
    }

    pub fn total_inserted(&self) -> usize {
        self.inserted.values().sum()
    }

    pub fn total_edges(&self) -> usize {
        self.relationships.iter().map(|pass| pass.created).sum()
    }
}
