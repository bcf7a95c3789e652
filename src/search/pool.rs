//! Bounded fan-out of per-document search tasks.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, Instrument};

use super::errors::SearchError;
use crate::document::{Document, DocumentSet};

/// How one document's search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Searched,
    /// The document failed; the failure was recorded and the session goes on.
    Failed,
}

/// Per-session document totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolOutcome {
    pub searched: usize,
    pub failed: usize,
}

/// Runs one task per document with at most `max_concurrent` in flight.
pub(crate) struct DocumentPool {
    semaphore: Arc<Semaphore>,
    session: CancellationToken,
}

impl DocumentPool {
    /// `session` is cancelled when any task aborts, so siblings unwind at
    /// their next suspension point.
    pub fn new(max_concurrent: usize, session: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            session,
        }
    }

    /// Search every document and wait for all tasks.
    ///
    /// Returns the first abort other than cancellation, or
    /// [`SearchError::Cancelled`] if the session was cancelled.
    pub async fn run<F, Fut>(&self, documents: &DocumentSet, search: F) -> Result<PoolOutcome, SearchError>
    where
        F: Fn(Arc<dyn Document>) -> Fut,
        Fut: Future<Output = Result<DocumentStatus, SearchError>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(documents.len());

        for document in documents.iter() {
            let semaphore = self.semaphore.clone();
            let session = self.session.clone();
            let task = search(document.clone());

            let handle = tokio::spawn(
                async move {
                    let _permit = tokio::select! {
                        biased;
                        _ = session.cancelled() => return Err(SearchError::Cancelled),
                        permit = semaphore.acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => return Err(SearchError::Cancelled),
                        },
                    };

                    let result = tokio::select! {
                        biased;
                        _ = session.cancelled() => Err(SearchError::Cancelled),
                        result = task => result,
                    };
                    if matches!(&result, Err(e) if !e.is_cancelled()) {
                        session.cancel();
                    }
                    result
                }
                .in_current_span(),
            );

            handles.push(handle);
        }

        let mut outcome = PoolOutcome::default();
        let mut abort: Option<SearchError> = None;

        for handle in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SearchError::Task(e)),
            };

            match result {
                Ok(DocumentStatus::Searched) => outcome.searched += 1,
                Ok(DocumentStatus::Failed) => outcome.failed += 1,
                Err(SearchError::Cancelled) => {}
                Err(e) => {
                    self.session.cancel();
                    if abort.is_none() {
                        error!("Aborting search session: {}", e);
                        abort = Some(e);
                    }
                }
            }
        }

        match abort {
            Some(e) => Err(e),
            None if self.session.is_cancelled() => Err(SearchError::Cancelled),
            None => Ok(outcome),
        }
    }
}
