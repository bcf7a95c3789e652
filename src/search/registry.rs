//! Shared mapping from equivalence classes to their definition group.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::symbol::{EquivalenceKey, MetadataUnifyingComparer, SymbolGroup, SymbolHandle};

/// Maps every member of every known group to that group.
///
/// Several document tasks can discover the same definition at once; the
/// first group inserted for a class wins and every later lookup returns
/// that same `Arc`.
#[derive(Default)]
pub struct GroupRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    by_key: HashMap<EquivalenceKey, Arc<SymbolGroup>>,
    distinct: usize,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group `symbol` belongs to, if one was registered.
    pub fn group_for(&self, symbol: &SymbolHandle) -> Option<Arc<SymbolGroup>> {
        self.inner
            .lock()
            .by_key
            .get(&MetadataUnifyingComparer.key(symbol))
            .cloned()
    }

    /// Register `candidate` unless its primary already has a group.
    ///
    /// Returns the registered group and `true` if `candidate` won, or the
    /// group holding the primary and `false`. Members whose class already
    /// belongs to another group are left out of the registered group, so
    /// the returned group always contains the primary and every class maps
    /// to exactly one group.
    pub fn get_or_insert(&self, candidate: SymbolGroup) -> (Arc<SymbolGroup>, bool) {
        let comparer = MetadataUnifyingComparer;
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.by_key.get(&comparer.key(candidate.primary())) {
            return (existing.clone(), false);
        }

        let candidate = if candidate.keys().any(|key| inner.by_key.contains_key(key)) {
            let free: Vec<SymbolHandle> = candidate
                .members()
                .filter(|member| !inner.by_key.contains_key(&comparer.key(member)))
                .cloned()
                .collect();
            SymbolGroup::new(candidate.primary().clone(), free)
        } else {
            candidate
        };

        let group = Arc::new(candidate);
        for key in group.keys() {
            inner.by_key.insert(key.clone(), group.clone());
        }
        inner.distinct += 1;
        (group, true)
    }

    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.inner.lock().distinct
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
