//! Module `safe_paths`
//!
//! Files the module graph has already resolved legitimately, for example a
//! dependency found through package resolution outside the project tree. The
//! access guard only ever reads this set; the module graph owns the writes.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::storage::validation::{ensure_leading_slash, normalize_path};

/// Read-only membership test over absolute, slash-style file paths.
pub trait SafeModulePaths: Send + Sync {
    fn has(&self, path: &str) -> bool;
}

impl SafeModulePaths for HashSet<String> {
    fn has(&self, path: &str) -> bool {
        self.contains(path)
    }
}

/// Shared, cloneable safe path set.
///
/// Clones share the same set. Lookups see writes made by other handles as
/// soon as the write lock is released; nothing waits for in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct SafePathRegistry {
    paths: Arc<RwLock<HashSet<String>>>,
}

impl SafePathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved module file. Returns `false` if it was already known.
    pub fn insert(&self, path: &str) -> bool {
        self.paths.write().insert(Self::key(path))
    }

    pub fn remove(&self, path: &str) -> bool {
        self.paths.write().remove(&Self::key(path))
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }

    fn key(path: &str) -> String {
        ensure_leading_slash(&normalize_path(path))
    }
}

impl SafeModulePaths for SafePathRegistry {
    fn has(&self, path: &str) -> bool {
        self.paths.read().contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let registry = SafePathRegistry::new();
        let graph_handle = registry.clone();

        assert!(graph_handle.insert("/home/dev/.cache/deps/react.js"));
        assert!(!graph_handle.insert("/home/dev/.cache/deps/react.js"));
        assert!(registry.has("/home/dev/.cache/deps/react.js"));
        assert_eq!(registry.len(), 1);

        assert!(graph_handle.remove("/home/dev/.cache/deps/react.js"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_normalizes_separators() {
        let registry = SafePathRegistry::new();
        registry.insert("node_modules\\pkg\\index.js");
        assert!(registry.has("/node_modules/pkg/index.js"));
    }
}
