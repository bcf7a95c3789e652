//! Aggregating listener.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::protocol::FindReferencesProgress;
use super::tracker::{ProgressTracker, StreamingProgressTracker};
use crate::document::Document;
use crate::symbol::{Location, SymbolGroup, SymbolHandle};

/// One reference site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub symbol: SymbolHandle,
    pub location: Location,
}

/// A definition together with every reference reported for it.
#[derive(Debug, Clone)]
pub struct ReferencedSymbol {
    pub definition: Arc<SymbolGroup>,
    pub references: Vec<ReferenceSite>,
}

/// Everything a session reported, definitions in report order.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub referenced: Vec<ReferencedSymbol>,
    pub documents_searched: usize,
    pub completed: bool,
}

impl SearchResults {
    pub fn reference_count(&self) -> usize {
        self.referenced.iter().map(|r| r.references.len()).sum()
    }

    /// The entry whose definition contains `symbol`.
    pub fn for_symbol(&self, symbol: &SymbolHandle) -> Option<&ReferencedSymbol> {
        self.referenced
            .iter()
            .find(|r| r.definition.contains(symbol))
    }
}

#[derive(Default)]
struct CollectorState {
    slots: HashMap<Arc<SymbolGroup>, usize>,
    results: SearchResults,
}

impl CollectorState {
    fn slot(&mut self, group: &Arc<SymbolGroup>) -> usize {
        if let Some(&slot) = self.slots.get(group) {
            return slot;
        }
        let slot = self.results.referenced.len();
        self.results.referenced.push(ReferencedSymbol {
            definition: group.clone(),
            references: Vec::new(),
        });
        self.slots.insert(group.clone(), slot);
        slot
    }
}

/// Collects definitions and references, optionally forwarding every call
/// to an inner listener first.
pub struct ProgressCollector {
    state: Mutex<CollectorState>,
    tracker: StreamingProgressTracker,
    inner: Option<Arc<dyn FindReferencesProgress>>,
}

impl ProgressCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState::default()),
            tracker: StreamingProgressTracker::silent(),
            inner: None,
        }
    }

    /// Collect while forwarding to `inner`. The inner listener's tracker is
    /// used for progress.
    pub fn forwarding(inner: Arc<dyn FindReferencesProgress>) -> Self {
        Self {
            inner: Some(inner),
            ..Self::new()
        }
    }

    /// A copy of what has been collected so far.
    pub fn results(&self) -> SearchResults {
        self.state.lock().results.clone()
    }

    pub fn into_results(self) -> SearchResults {
        self.state.into_inner().results
    }
}

impl Default for ProgressCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindReferencesProgress for ProgressCollector {
    fn progress_tracker(&self) -> &dyn ProgressTracker {
        match &self.inner {
            Some(inner) => inner.progress_tracker(),
            None => &self.tracker,
        }
    }

    async fn on_started(&self) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_started().await?;
        }
        Ok(())
    }

    async fn on_completed(&self) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_completed().await?;
        }
        self.state.lock().results.completed = true;
        Ok(())
    }

    async fn on_find_in_document_started(&self, document: &dyn Document) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_find_in_document_started(document).await?;
        }
        Ok(())
    }

    async fn on_find_in_document_completed(&self, document: &dyn Document) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_find_in_document_completed(document).await?;
        }
        self.state.lock().results.documents_searched += 1;
        Ok(())
    }

    async fn on_definition_found(&self, group: &Arc<SymbolGroup>) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_definition_found(group).await?;
        }
        self.state.lock().slot(group);
        Ok(())
    }

    async fn on_reference_found(
        &self,
        group: &Arc<SymbolGroup>,
        symbol: &SymbolHandle,
        location: &Location,
    ) -> Result<()> {
        if let Some(inner) = &self.inner {
            inner.on_reference_found(group, symbol, location).await?;
        }
        let mut state = self.state.lock();
        let slot = state.slot(group);
        state.results.referenced[slot].references.push(ReferenceSite {
            symbol: symbol.clone(),
            location: location.clone(),
        });
        Ok(())
    }
}
