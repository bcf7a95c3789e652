//! Streams protocol calls to a consumer as events.
//!
//! ```ignore
//! let (progress, mut events) = ChannelProgress::new(256);
//! tokio::spawn(async move { engine.find_references(target, docs, Arc::new(progress), cancel).await });
//!
//! while let Some(event) = events.next().await {
//!     if let ReferenceEvent::ReferenceFound { location, .. } = event {
//!         println!("{location}");
//!     }
//! }
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::protocol::{FindLiteralReferencesProgress, FindReferencesProgress};
use super::tracker::{ProgressListener, ProgressSnapshot, ProgressTracker, StreamingProgressTracker};
use crate::document::Document;
use crate::symbol::{DocumentId, Location, SymbolGroup, SymbolHandle, TextSpan};

/// One protocol call, as data.
#[derive(Debug, Clone)]
pub enum ReferenceEvent {
    Started,
    DocumentStarted(DocumentId),
    DocumentCompleted(DocumentId),
    DefinitionFound(Arc<SymbolGroup>),
    ReferenceFound {
        group: Arc<SymbolGroup>,
        symbol: SymbolHandle,
        location: Location,
    },
    LiteralFound {
        document: DocumentId,
        path: Option<PathBuf>,
        span: TextSpan,
    },
    Progress(ProgressSnapshot),
    Completed,
}

#[derive(Clone)]
struct EventSender(mpsc::Sender<ReferenceEvent>);

impl EventSender {
    async fn send(&self, event: ReferenceEvent) -> Result<()> {
        self.0
            .send(event)
            .await
            .map_err(|_| anyhow!("reference event receiver dropped"))
    }
}

#[async_trait]
impl ProgressListener for EventSender {
    async fn report_progress(&self, snapshot: ProgressSnapshot) -> Result<()> {
        self.send(ReferenceEvent::Progress(snapshot)).await
    }
}

/// Listener that turns every call into a [`ReferenceEvent`] on a bounded
/// channel. Sends wait for capacity, so a slow consumer applies
/// backpressure to the search. A dropped receiver surfaces as a listener
/// error.
pub struct ChannelProgress {
    sender: EventSender,
    tracker: StreamingProgressTracker,
}

impl ChannelProgress {
    pub fn new(buffer: usize) -> (Self, ReceiverStream<ReferenceEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let sender = EventSender(tx);
        let tracker = StreamingProgressTracker::new(Arc::new(sender.clone()));

        (Self { sender, tracker }, ReceiverStream::new(rx))
    }
}

#[async_trait]
impl FindReferencesProgress for ChannelProgress {
    fn progress_tracker(&self) -> &dyn ProgressTracker {
        &self.tracker
    }

    async fn on_started(&self) -> Result<()> {
        self.sender.send(ReferenceEvent::Started).await
    }

    async fn on_completed(&self) -> Result<()> {
        self.sender.send(ReferenceEvent::Completed).await
    }

    async fn on_find_in_document_started(&self, document: &dyn Document) -> Result<()> {
        self.sender
            .send(ReferenceEvent::DocumentStarted(document.id()))
            .await
    }

    async fn on_find_in_document_completed(&self, document: &dyn Document) -> Result<()> {
        self.sender
            .send(ReferenceEvent::DocumentCompleted(document.id()))
            .await
    }

    async fn on_definition_found(&self, group: &Arc<SymbolGroup>) -> Result<()> {
        self.sender
            .send(ReferenceEvent::DefinitionFound(group.clone()))
            .await
    }

    async fn on_reference_found(
        &self,
        group: &Arc<SymbolGroup>,
        symbol: &SymbolHandle,
        location: &Location,
    ) -> Result<()> {
        self.sender
            .send(ReferenceEvent::ReferenceFound {
                group: group.clone(),
                symbol: symbol.clone(),
                location: location.clone(),
            })
            .await
    }
}

#[async_trait]
impl FindLiteralReferencesProgress for ChannelProgress {
    fn progress_tracker(&self) -> &dyn ProgressTracker {
        &self.tracker
    }

    async fn on_reference_found(&self, document: &dyn Document, span: TextSpan) -> Result<()> {
        self.sender
            .send(ReferenceEvent::LiteralFound {
                document: document.id(),
                path: document.path().map(|p| p.to_path_buf()),
                span,
            })
            .await
    }
}
