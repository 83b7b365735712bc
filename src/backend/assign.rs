use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use moka::sync::Cache as MokaCache;

/// Maps row or column names to stable integer identifiers.
pub trait IdAssigner: Send + Sync {
    fn assign(&self, names: &[String]) -> Vec<usize>;
}

/// Process-local assigner: the first time a name is seen it gets the next
/// free id, later lookups return the same id.
pub struct LocalIdAssigner {
    ids: MokaCache<String, usize>,
    next: AtomicUsize,
}

impl Default for LocalIdAssigner {
    fn default() -> Self {
        Self {
            ids: MokaCache::builder().build(),
            next: AtomicUsize::new(0),
        }
    }
}

impl LocalIdAssigner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl IdAssigner for LocalIdAssigner {
    fn assign(&self, names: &[String]) -> Vec<usize> {
        names
            .iter()
            .map(|name| {
                self.ids.get_with(name.clone(), || {
                    self.next.fetch_add(1, Ordering::Relaxed)
                })
            })
            .collect()
    }
}
