use crate::error::{ImportError, Result};
use crate::source::{read_records, SourceRecord};
use crate::stats::{ImportStats, SkippedRecord};
use psgc_graph::{
    classify, EdgeMode, Entity, EntityKind, GraphStore, PsgcGraph, RelationshipBuilder,
    SnapshotFile,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Entities per store write
    pub batch_size: usize,

    /// Wipe the store before importing
    pub clear: bool,

    pub edge_mode: EdgeMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            clear: false,
            edge_mode: EdgeMode::default(),
        }
    }
}

/// One-shot batch import: classify, insert per kind in batches, then derive relationships.
pub struct Importer {
    options: ImportOptions,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(ImportError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Import already-read records into `store`.
    pub fn import_records<S: GraphStore + ?Sized>(
        &self,
        store: &mut S,
        records: Vec<SourceRecord>,
    ) -> Result<ImportStats> {
        let started = Instant::now();
        let mut stats = ImportStats::new();
        stats.records = records.len();

        if self.options.clear {
            store.clear()?;
            stats.cleared = true;
            log::info!("Cleared store before import");
        }

        let mut by_kind: BTreeMap<EntityKind, Vec<Entity>> = BTreeMap::new();
        for source in records {
            match classify_source(&source) {
                Ok(entity) => by_kind.entry(entity.kind).or_default().push(entity),
                Err(skip) => {
                    log::warn!(
                        "Skipping record #{} ({}): {}",
                        skip.index,
                        skip.code.as_deref().unwrap_or("no code"),
                        skip.reason
                    );
                    stats.add_skip(skip);
                }
            }
        }

        for kind in EntityKind::ALL {
            let entities = by_kind.remove(&kind).unwrap_or_default();
            if entities.is_empty() {
                continue;
            }
            let mut batch = Vec::with_capacity(self.options.batch_size);
            let mut batches = 0usize;
            for entity in entities {
                batch.push(entity);
                if batch.len() == self.options.batch_size {
                    self.flush(store, kind, &mut batch, &mut stats)?;
                    batches += 1;
                }
            }
            if !batch.is_empty() {
                self.flush(store, kind, &mut batch, &mut stats)?;
                batches += 1;
            }
            log::info!(
                "Inserted {} {kind} entities in {batches} batches",
                stats.inserted.get(&kind).copied().unwrap_or(0)
            );
        }

        stats.relationships = RelationshipBuilder::new(self.options.edge_mode).build(store)?;
        stats.time_ms = started.elapsed().as_millis() as u64;

        log::info!(
            "Import finished: {} records, {} entities, {} edges, {} skipped, {} duplicates ({} ms)",
            stats.records,
            stats.total_inserted(),
            stats.total_edges(),
            stats.skipped,
            stats.duplicates,
            stats.time_ms
        );
        Ok(stats)
    }

    /// Read `input`, import it into the snapshot's graph and save the snapshot.
    ///
    /// Without `clear`, an existing snapshot is loaded and extended.
    pub async fn import_file(&self, input: &Path, snapshot: &SnapshotFile) -> Result<ImportStats> {
        let records = read_records(input).await?;
        log::info!("Read {} records from {}", records.len(), input.display());

        let mut graph = if !self.options.clear && snapshot.exists().await {
            snapshot.load().await?
        } else {
            PsgcGraph::new()
        };

        let stats = self.import_records(&mut graph, records)?;
        snapshot.save(&graph).await?;
        Ok(stats)
    }

    fn flush<S: GraphStore + ?Sized>(
        &self,
        store: &mut S,
        kind: EntityKind,
        batch: &mut Vec<Entity>,
        stats: &mut ImportStats,
    ) -> Result<()> {
        let size = batch.len();
        let outcome = store.insert_entities(std::mem::take(batch))?;
        for code in &outcome.duplicates {
            log::warn!("Duplicate code {code} ({kind}) not inserted");
        }
        stats.add_inserted(kind, outcome.inserted);
        stats.duplicates += outcome.duplicates.len();
        log::debug!("{kind} batch: {size} entities, {} inserted", outcome.inserted);
        Ok(())
    }
}

fn classify_source(source: &SourceRecord) -> std::result::Result<Entity, SkippedRecord> {
    let record = source.record.as_ref().map_err(|reason| SkippedRecord {
        index: source.index,
        code: None,
        reason: reason.clone(),
    })?;
    classify(record).map_err(|err| SkippedRecord {
        index: source.index,
        code: record.psgc_code.clone(),
        reason: err.to_string(),
    })
}
