//! Concurrent symbol-reference search.
//!
//! A session reports through a [`FindReferencesProgress`] listener:
//! - the target's linked symbols are folded into the first definition group
//! - every document is searched on a bounded worker pool
//! - each found handle is folded into a shared [`GroupRegistry`], so the
//!   first task to see a definition owns its group and reports it once
//! - a failing document is recorded and does not stop its siblings

use futures::StreamExt;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::errors::{FailureCollector, FailureReport, SearchError};
use super::pool::{DocumentPool, DocumentStatus, PoolOutcome};
use super::registry::GroupRegistry;
use super::traits::{FoundReference, ReferenceFinder, Workspace};
use crate::config::SearchConfig;
use crate::document::{Document, DocumentSet};
use crate::metrics::{DOCUMENTS_SEARCHED, DOCUMENT_FAILURES, REFERENCES_FOUND, SESSIONS_STARTED, SESSION_LATENCY};
use crate::progress::FindReferencesProgress;
use crate::symbol::{SymbolGroup, SymbolHandle};

/// Totals for a finished session.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub session_id: Uuid,
    pub documents_searched: usize,
    pub documents_failed: usize,
    pub definitions: usize,
    pub references: usize,
    pub elapsed: Duration,
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reference(s) to {} definition(s) in {} document(s) ({:.2}s)",
            self.references,
            self.definitions,
            self.documents_searched + self.documents_failed,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Finds every reference to a symbol across a document set.
pub struct FindReferencesSearchEngine {
    finder: Arc<dyn ReferenceFinder>,
    workspace: Arc<dyn Workspace>,
    config: SearchConfig,
}

impl FindReferencesSearchEngine {
    pub fn new(
        finder: Arc<dyn ReferenceFinder>,
        workspace: Arc<dyn Workspace>,
        config: SearchConfig,
    ) -> Self {
        Self {
            finder,
            workspace,
            config,
        }
    }

    /// Search `documents` for references to `target`.
    ///
    /// `on_completed` is reported only when every document finished; with
    /// `complete_on_partial_failure` unset, a failed document skips it. Any
    /// failed document still turns the result into
    /// [`SearchError::DocumentsFailed`]. Cancelling `cancel` aborts the
    /// session without `on_completed`.
    pub async fn find_references(
        &self,
        target: SymbolHandle,
        documents: DocumentSet,
        progress: Arc<dyn FindReferencesProgress>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        let session_id = Uuid::new_v4();
        let span = info_span!("find_references", session = %session_id, symbol = %target);

        let start = Instant::now();
        let result = self
            .run_session(session_id, target, documents, progress, cancel)
            .instrument(span)
            .await;
        SESSION_LATENCY.observe(start.elapsed().as_secs_f64());

        result
    }

    async fn run_session(
        &self,
        session_id: Uuid,
        target: SymbolHandle,
        documents: DocumentSet,
        progress: Arc<dyn FindReferencesProgress>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        let start = Instant::now();
        SESSIONS_STARTED.inc();
        info!("Searching {} documents", documents.len());

        let session = Arc::new(Session {
            target,
            finder: self.finder.clone(),
            workspace: self.workspace.clone(),
            progress: progress.clone(),
            registry: GroupRegistry::new(),
            failures: FailureCollector::new(self.config.max_failures),
            definitions: AtomicUsize::new(0),
            references: AtomicUsize::new(0),
        });

        progress.on_started().await.map_err(SearchError::Listener)?;
        progress
            .progress_tracker()
            .add_items(documents.len())
            .await
            .map_err(SearchError::Listener)?;

        let initial = session.linked_group(&session.target).await;
        session.register(initial).await?;

        let pool = DocumentPool::new(self.config.max_concurrent_documents, cancel.child_token());
        let outcome = pool
            .run(&documents, |document| {
                let session = session.clone();
                async move { session.search_document(document).await }
            })
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) if cancel.is_cancelled() => {
                info!("Search cancelled after {:.2}s", start.elapsed().as_secs_f64());
                return Err(if e.is_cancelled() { e } else { SearchError::Cancelled });
            }
            Err(e) => return Err(e),
        };

        let report = session.failures.report();
        self.finish(&session, &progress, report, outcome, session_id, start)
            .await
    }

    async fn finish(
        &self,
        session: &Session,
        progress: &Arc<dyn FindReferencesProgress>,
        report: FailureReport,
        outcome: PoolOutcome,
        session_id: Uuid,
        start: Instant,
    ) -> Result<SearchSummary, SearchError> {
        if report.has_failures() {
            warn!("{}", report);
            if !self.config.complete_on_partial_failure {
                return Err(SearchError::DocumentsFailed(report));
            }
        }

        progress.on_completed().await.map_err(SearchError::Listener)?;

        if report.has_failures() {
            return Err(SearchError::DocumentsFailed(report));
        }

        let summary = SearchSummary {
            session_id,
            documents_searched: outcome.searched,
            documents_failed: outcome.failed,
            definitions: session.definitions.load(Ordering::Relaxed),
            references: session.references.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        info!("Search completed: {}", summary);

        Ok(summary)
    }
}

/// State shared by every document task of one session.
struct Session {
    target: SymbolHandle,
    finder: Arc<dyn ReferenceFinder>,
    workspace: Arc<dyn Workspace>,
    progress: Arc<dyn FindReferencesProgress>,
    registry: GroupRegistry,
    failures: FailureCollector,
    definitions: AtomicUsize,
    references: AtomicUsize,
}

impl Session {
    async fn search_document(&self, document: Arc<dyn Document>) -> Result<DocumentStatus, SearchError> {
        let document = document.as_ref();
        debug!("Searching {}", document.id());

        self.progress
            .on_find_in_document_started(document)
            .await
            .map_err(SearchError::Listener)?;

        let status = self.find_in_document(document).await?;

        self.progress
            .on_find_in_document_completed(document)
            .await
            .map_err(SearchError::Listener)?;
        DOCUMENTS_SEARCHED.inc();

        self.progress
            .progress_tracker()
            .items_completed(1)
            .await
            .map_err(SearchError::Listener)?;

        Ok(status)
    }

    /// Fold and report every site the finder yields for `document`.
    async fn find_in_document(&self, document: &dyn Document) -> Result<DocumentStatus, SearchError> {
        let mut found = self.finder.find_in_document(&self.target, document);

        while let Some(item) = found.next().await {
            match item {
                Ok(reference) => self.report(reference).await?,
                Err(e) => {
                    warn!("Failed to search {}: {:#}", document.id(), e);
                    DOCUMENT_FAILURES.inc();
                    self.failures
                        .record(document.id(), document.path().map(|p| p.to_path_buf()), &e);
                    return Ok(DocumentStatus::Failed);
                }
            }
        }

        Ok(DocumentStatus::Searched)
    }

    async fn report(&self, found: FoundReference) -> Result<(), SearchError> {
        let group = match self.registry.group_for(&found.symbol) {
            Some(group) => group,
            None => {
                let candidate = self.linked_group(&found.symbol).await;
                self.register(candidate).await?
            }
        };

        if found.is_definition {
            return Ok(());
        }

        self.progress
            .on_reference_found(&group, &found.symbol, &found.location)
            .await
            .map_err(SearchError::Listener)?;
        self.references.fetch_add(1, Ordering::Relaxed);
        REFERENCES_FOUND.inc();

        Ok(())
    }

    /// Insert `candidate`, reporting it if no equivalent group existed.
    async fn register(&self, candidate: SymbolGroup) -> Result<Arc<SymbolGroup>, SearchError> {
        let (group, won) = self.registry.get_or_insert(candidate);
        if won {
            debug!("Definition found: {}", group);
            self.definitions.fetch_add(1, Ordering::Relaxed);
            self.progress
                .on_definition_found(&group)
                .await
                .map_err(SearchError::Listener)?;
        }
        Ok(group)
    }

    /// The group `symbol` defines together with its linked source symbols.
    ///
    /// Metadata symbols never gain group-mates, and a failing workspace
    /// lookup leaves the symbol in a group of its own. A source symbol found
    /// while searching from a metadata target joins the target's group only
    /// when it compiles into that image; otherwise it is registered under
    /// its own group, minus linked members whose image already has one.
    async fn linked_group(&self, symbol: &SymbolHandle) -> SymbolGroup {
        if symbol.is_from_metadata() {
            return SymbolGroup::single(symbol.clone());
        }

        let linked = match self.workspace.linked_symbols(symbol).await {
            Ok(linked) => linked,
            Err(e) => {
                warn!("Failed to resolve linked symbols for {}: {:#}", symbol, e);
                Vec::new()
            }
        };

        let members = linked
            .into_iter()
            .filter(|linked| !linked.is_from_metadata())
            .chain(std::iter::once(symbol.clone()));
        SymbolGroup::new(symbol.clone(), members)
    }
}
