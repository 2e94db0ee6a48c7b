use crate::error::{ImportError, Result};
use psgc_graph::RawRecord;
use serde_json::Value;
use std::path::Path;

/// A record as read from the input, before classification.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Zero-based array position, or zero-based line number for JSON Lines
    pub index: usize,

    /// Decoded record, or why its JSON shape could not be decoded
    pub record: std::result::Result<RawRecord, String>,
}

impl SourceRecord {
    fn decode(index: usize, value: Value) -> Self {
        let record = serde_json::from_value(value).map_err(|err| err.to_string());
        Self { index, record }
    }
}

/// Read a JSON array of records, or JSON Lines with one record per line.
pub async fn read_records(path: &Path) -> Result<Vec<SourceRecord>> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_records(&text).map_err(|message| ImportError::InvalidInput {
        path: path.display().to_string(),
        message,
    })
}

/// Parse an in-memory document. Only a document that is not JSON at all fails;
/// individual bad records come back as undecodable [`SourceRecord`]s.
pub fn parse_records(text: &str) -> std::result::Result<Vec<SourceRecord>, String> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|err| format!("not a JSON array: {err}"))?;
        return Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| SourceRecord::decode(index, value))
            .collect());
    }

    // Line numbers count blank lines so skip reports point at the input line.
    let mut records = Vec::new();
    for (index, line) in text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
    {
        let record = match serde_json::from_str::<Value>(line) {
            Ok(value) => SourceRecord::decode(index, value),
            Err(err) => SourceRecord {
                index,
                record: Err(format!("invalid JSON line: {err}")),
            },
        };
        records.push(record);
    }
    if !records.is_empty() && records.iter().all(|r| r.record.is_err()) {
        return Err("no decodable records (expected a JSON array or JSON Lines)".to_string());
    }
    Ok(records)
}
