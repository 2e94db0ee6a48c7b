//! # PSGC Importer
//!
//! One-shot batch import of PSGC publication records into the administrative graph.
//!
//! ## Pipeline
//!
//! ```text
//! psgc_data.json (array or JSON Lines)
//!     │
//!     ├──> Source reader
//!     │      └─> RawRecord per row (undecodable rows kept for reporting)
//!     │
//!     ├──> Classifier
//!     │      └─> Entity, or skip + warn
//!     │
//!     ├──> Store (batched inserts, Region first, per kind)
//!     │
//!     └──> Relationship Builder (five passes)
//!            └─> Snapshot
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use psgc_graph::SnapshotFile;
//! use psgc_importer::{ImportOptions, Importer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let importer = Importer::new(ImportOptions { clear: true, ..Default::default() })?;
//!     let snapshot = SnapshotFile::new(".psgc/graph.json");
//!     let stats = importer.import_file("psgc_data.json".as_ref(), &snapshot).await?;
//!
//!     println!("Imported {} entities, {} edges", stats.total_inserted(), stats.total_edges());
//!     Ok(())
//! }
//! ```

mod error;
mod importer;
mod source;
mod stats;

pub use error::{ImportError, Result};
pub use importer::{ImportOptions, Importer, DEFAULT_BATCH_SIZE};
pub use source::{parse_records, read_records, SourceRecord};
pub use stats::{ImportStats, SkippedRecord, MAX_LISTED_SKIPS};
