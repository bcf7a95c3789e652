//! Literal (text occurrence) search.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::engine::SearchSummary;
use super::errors::{FailureCollector, SearchError};
use super::pool::{DocumentPool, DocumentStatus};
use crate::config::{LiteralConfig, SearchConfig};
use crate::document::{Document, DocumentSet};
use crate::metrics::{DOCUMENTS_SEARCHED, DOCUMENT_FAILURES, REFERENCES_FOUND, SESSIONS_STARTED, SESSION_LATENCY};
use crate::progress::FindLiteralReferencesProgress;
use crate::symbol::TextSpan;

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte spans of every non-overlapping occurrence of `pattern` in `text`.
///
/// Case-insensitive matching folds ASCII letters only, so spans stay valid
/// byte offsets into `text`. With `whole_token`, an occurrence whose edge is
/// an identifier character must not touch another identifier character.
pub fn find_literal_spans(text: &str, pattern: &str, config: &LiteralConfig) -> Vec<TextSpan> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let (haystack, needle) = if config.case_sensitive {
        (Cow::Borrowed(text), Cow::Borrowed(pattern))
    } else {
        (
            Cow::Owned(text.to_ascii_lowercase()),
            Cow::Owned(pattern.to_ascii_lowercase()),
        )
    };
    let haystack: &str = &haystack;
    let needle: &str = &needle;

    let first_is_ident = pattern.chars().next().is_some_and(is_identifier_char);
    let last_is_ident = pattern.chars().next_back().is_some_and(is_identifier_char);

    let is_whole_token = |span: &TextSpan| {
        let before = text[..span.start].chars().next_back();
        let after = text[span.end..].chars().next();
        !(first_is_ident && before.is_some_and(is_identifier_char))
            && !(last_is_ident && after.is_some_and(is_identifier_char))
    };

    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let span = TextSpan::from(start..start + needle.len());

        if !config.whole_token || is_whole_token(&span) {
            from = span.end;
            spans.push(span);
        } else {
            // A rejected candidate must not hide an overlapping occurrence
            from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    spans
}

/// Finds text occurrences of a pattern across a document set.
pub struct FindLiteralReferencesSearchEngine {
    literal: LiteralConfig,
    search: SearchConfig,
}

impl FindLiteralReferencesSearchEngine {
    pub fn new(literal: LiteralConfig, search: SearchConfig) -> Self {
        Self { literal, search }
    }

    /// Report every occurrence of `pattern` in `documents`.
    ///
    /// Unreadable documents are recorded and turn the result into
    /// [`SearchError::DocumentsFailed`] once all documents finished.
    pub async fn find_literal_references(
        &self,
        pattern: &str,
        documents: DocumentSet,
        progress: Arc<dyn FindLiteralReferencesProgress>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        let session_id = Uuid::new_v4();
        let span = info_span!("find_literal_references", session = %session_id, pattern = %pattern);

        let start = Instant::now();
        let result = self
            .run_session(session_id, pattern, documents, progress, cancel)
            .instrument(span)
            .await;
        SESSION_LATENCY.observe(start.elapsed().as_secs_f64());

        result
    }

    async fn run_session(
        &self,
        session_id: Uuid,
        pattern: &str,
        documents: DocumentSet,
        progress: Arc<dyn FindLiteralReferencesProgress>,
        cancel: CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        let start = Instant::now();
        SESSIONS_STARTED.inc();
        info!("Searching {} documents", documents.len());

        progress
            .progress_tracker()
            .add_items(documents.len())
            .await
            .map_err(SearchError::Listener)?;

        let session = Arc::new(LiteralSession {
            pattern: pattern.into(),
            config: self.literal.clone(),
            progress,
            failures: FailureCollector::new(self.search.max_failures),
            references: AtomicUsize::new(0),
        });

        let pool = DocumentPool::new(self.search.max_concurrent_documents, cancel.child_token());
        let outcome = pool
            .run(&documents, |document| {
                let session = session.clone();
                async move { session.search_document(document).await }
            })
            .await
            .map_err(|e| if cancel.is_cancelled() { SearchError::Cancelled } else { e })?;

        let report = session.failures.report();
        if report.has_failures() {
            warn!("{}", report);
            return Err(SearchError::DocumentsFailed(report));
        }

        let summary = SearchSummary {
            session_id,
            documents_searched: outcome.searched,
            documents_failed: outcome.failed,
            definitions: 0,
            references: session.references.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        info!("Literal search completed: {}", summary);

        Ok(summary)
    }
}

struct LiteralSession {
    pattern: Arc<str>,
    config: LiteralConfig,
    progress: Arc<dyn FindLiteralReferencesProgress>,
    failures: FailureCollector,
    references: AtomicUsize,
}

impl LiteralSession {
    async fn search_document(&self, document: Arc<dyn Document>) -> Result<DocumentStatus, SearchError> {
        let document = document.as_ref();

        let status = match document.text().await {
            Ok(text) => {
                let spans = find_literal_spans(&text, &self.pattern, &self.config);
                debug!("{} occurrence(s) in {}", spans.len(), document.id());
                for span in spans {
                    self.progress
                        .on_reference_found(document, span)
                        .await
                        .map_err(SearchError::Listener)?;
                    self.references.fetch_add(1, Ordering::Relaxed);
                    REFERENCES_FOUND.inc();
                }
                DocumentStatus::Searched
            }
            Err(e) => {
                warn!("Failed to read {}: {:#}", document.id(), e);
                DOCUMENT_FAILURES.inc();
                self.failures
                    .record(document.id(), document.path().map(|p| p.to_path_buf()), &e);
                DocumentStatus::Failed
            }
        };

        DOCUMENTS_SEARCHED.inc();
        self.progress
            .progress_tracker()
            .items_completed(1)
            .await
            .map_err(SearchError::Listener)?;

        Ok(status)
    }
}
