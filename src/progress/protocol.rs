//! Callback contracts a search session reports through.
//!
//! Every method may be called from any worker, concurrently across
//! documents. The engine guarantees the bracketing order:
//!
//! ```text
//! on_started
//!   on_definition_found*                       (initial definitions)
//!   ( on_find_in_document_started(doc)
//!       on_definition_found* / on_reference_found*
//!     on_find_in_document_completed(doc) )*    (interleaved per document)
//! on_completed
//! ```

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::tracker::{NoOpProgressTracker, ProgressTracker};
use crate::document::Document;
use crate::symbol::{Location, SymbolGroup, SymbolHandle, TextSpan};

/// Listener for a symbol-reference search session.
#[async_trait]
pub trait FindReferencesProgress: Send + Sync {
    /// Tracker the engine routes per-document completion into.
    fn progress_tracker(&self) -> &dyn ProgressTracker;

    /// Called once, before anything else.
    async fn on_started(&self) -> Result<()>;

    /// Called once, after everything else has returned.
    async fn on_completed(&self) -> Result<()>;

    async fn on_find_in_document_started(&self, document: &dyn Document) -> Result<()>;

    async fn on_find_in_document_completed(&self, document: &dyn Document) -> Result<()>;

    /// Called at most once per distinct group.
    async fn on_definition_found(&self, group: &Arc<SymbolGroup>) -> Result<()>;

    /// `symbol` is the member of `group` resolved at `location`.
    async fn on_reference_found(
        &self,
        group: &Arc<SymbolGroup>,
        symbol: &SymbolHandle,
        location: &Location,
    ) -> Result<()>;
}

/// Listener for a literal (text occurrence) search session.
#[async_trait]
pub trait FindLiteralReferencesProgress: Send + Sync {
    fn progress_tracker(&self) -> &dyn ProgressTracker;

    async fn on_reference_found(&self, document: &dyn Document, span: TextSpan) -> Result<()>;
}

/// Symbol-reference listener that ignores everything.
#[derive(Debug, Default)]
pub struct NoOpFindReferencesProgress {
    tracker: NoOpProgressTracker,
}

#[async_trait]
impl FindReferencesProgress for NoOpFindReferencesProgress {
    fn progress_tracker(&self) -> &dyn ProgressTracker {
        &self.tracker
    }

    async fn on_started(&self) -> Result<()> {
        Ok(())
    }

    async fn on_completed(&self) -> Result<()> {
        Ok(())
    }

    async fn on_find_in_document_started(&self, _document: &dyn Document) -> Result<()> {
        Ok(())
    }

    async fn on_find_in_document_completed(&self, _document: &dyn Document) -> Result<()> {
        Ok(())
    }

    async fn on_definition_found(&self, _group: &Arc<SymbolGroup>) -> Result<()> {
        Ok(())
    }

    async fn on_reference_found(
        &self,
        _group: &Arc<SymbolGroup>,
        _symbol: &SymbolHandle,
        _location: &Location,
    ) -> Result<()> {
        Ok(())
    }
}

/// Literal listener that ignores everything.
#[derive(Debug, Default)]
pub struct NoOpLiteralProgress {
    tracker: NoOpProgressTracker,
}

#[async_trait]
impl FindLiteralReferencesProgress for NoOpLiteralProgress {
    fn progress_tracker(&self) -> &dyn ProgressTracker {
        &self.tracker
    }

    async fn on_reference_found(&self, _document: &dyn Document, _span: TextSpan) -> Result<()> {
        Ok(())
    }
}
