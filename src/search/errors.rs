//! Error types and per-document failure collection for search sessions

use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::symbol::DocumentId;

/// Errors that end a search session.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The session's cancellation token fired.
    #[error("search was cancelled")]
    Cancelled,

    /// A progress callback failed.
    #[error("progress listener failed: {0}")]
    Listener(#[source] anyhow::Error),

    /// One or more documents could not be searched.
    #[error("{0}")]
    DocumentsFailed(FailureReport),

    /// A document task panicked or was aborted.
    #[error("document task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

/// A document whose search failed.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub document: DocumentId,
    pub path: Option<PathBuf>,
    pub error: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.error),
            None => write!(f, "{}: {}", self.document, self.error),
        }
    }
}

/// Collects document failures from concurrent tasks.
///
/// At most `max_failures` entries are kept; the total count is always exact.
#[derive(Clone)]
pub struct FailureCollector {
    inner: Arc<Mutex<CollectedFailures>>,
    max_failures: usize,
}

#[derive(Default)]
struct CollectedFailures {
    kept: Vec<DocumentFailure>,
    total: usize,
}

impl FailureCollector {
    pub fn new(max_failures: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CollectedFailures::default())),
            max_failures,
        }
    }

    pub fn record(&self, document: DocumentId, path: Option<PathBuf>, error: &anyhow::Error) {
        let mut inner = self.inner.lock();
        inner.total += 1;
        if inner.kept.len() < self.max_failures {
            inner.kept.push(DocumentFailure {
                document,
                path,
                error: format!("{:#}", error),
            });
        }
    }

    pub fn failure_count(&self) -> usize {
        self.inner.lock().total
    }

    pub fn report(&self) -> FailureReport {
        let inner = self.inner.lock();
        FailureReport {
            total_failures: inner.total,
            failures: inner.kept.clone(),
        }
    }
}

/// Summary of the documents that failed during a session.
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    pub total_failures: usize,
    pub failures: Vec<DocumentFailure>,
}

impl FailureReport {
    pub fn has_failures(&self) -> bool {
        self.total_failures > 0
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_failures == 0 {
            return write!(f, "all documents searched successfully");
        }

        write!(f, "{} document(s) failed", self.total_failures)?;
        for failure in self.failures.iter().take(5) {
            write!(f, "\n  - {}", failure)?;
        }
        if self.total_failures > 5 {
            write!(f, "\n  ... and {} more", self.total_failures - 5)?;
        }
        Ok(())
    }
}
