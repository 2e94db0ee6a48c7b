use lru::LruCache;
use psgc_graph::HierarchyPath;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// In-process LRU of resolved hierarchy paths, keyed by canonical code.
///
/// Only successful resolutions are cached; a miss always falls through to the resolver.
pub(crate) struct HierarchyCache {
    entries: Mutex<LruCache<String, HierarchyPath>>,
}

impl HierarchyCache {
    /// `None` when `capacity` is 0 (caching disabled).
    pub(crate) fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub(crate) fn get(&self, code: &str) -> Option<HierarchyPath> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(code).cloned()
    }

    pub(crate) fn insert(&self, code: String, path: HierarchyPath) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.put(code, path);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
