use anyhow::{Context as AnyhowContext, Result};
use psgc_graph::EdgeMode;
use psgc_importer::DEFAULT_BATCH_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_SNAPSHOT: &str = ".psgc/graph.json";
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:7710";
pub(crate) const DEFAULT_CACHE_SIZE: usize = 1024;

/// Optional TOML config file. Flags and `PSGC_*` variables win over it; it wins over defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) snapshot: Option<PathBuf>,
    pub(crate) bind: Option<String>,
    pub(crate) batch_size: Option<usize>,
    pub(crate) hierarchy_cache_size: Option<usize>,
    pub(crate) edge_mode: Option<EdgeMode>,
}

impl FileConfig {
    pub(crate) async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("Config file {} is not valid", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| anyhow::anyhow!("TOML parse error: {err}"))
    }

    pub(crate) fn snapshot(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.snapshot.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT))
    }

    pub(crate) fn bind(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub(crate) fn batch_size(&self, flag: Option<usize>) -> usize {
        flag.or(self.batch_size).unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub(crate) fn hierarchy_cache_size(&self, flag: Option<usize>) -> usize {
        flag.or(self.hierarchy_cache_size)
            .unwrap_or(DEFAULT_CACHE_SIZE)
    }

    pub(crate) fn edge_mode(&self, flag: Option<EdgeMode>) -> EdgeMode {
        flag.or(self.edge_mode).unwrap_or_default()
    }
}
