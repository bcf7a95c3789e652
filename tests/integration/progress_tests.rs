use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use refsearch::config::SearchConfig;
use refsearch::progress::{
    ChannelProgress, ProgressCollector, ProgressSnapshot, ProgressTracker, ReferenceEvent,
    StreamingProgressTracker,
};
use refsearch::search::{FindReferencesSearchEngine, UnlinkedWorkspace};
use refsearch::symbol::{ImageId, ProjectId, SymbolHandle, TextSpan};

use crate::helpers::{documents, RecordingListener, ScriptedFinder, Step};
use crate::helpers::recording_listener::SnapshotLog;

fn target() -> SymbolHandle {
    SymbolHandle::source("M:Queue.Push", ProjectId(1), ImageId(1))
}

fn engine() -> FindReferencesSearchEngine {
    let target = target();
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Reference(target.clone(), TextSpan::from(0..4))])
        .script(1, vec![Step::Reference(target.clone(), TextSpan::from(9..13))])
        .script(2, vec![Step::Reference(target, TextSpan::from(2..6))]);
    FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), SearchConfig::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tracker_reaches_five_of_five_from_concurrent_callers() {
    let log = Arc::new(SnapshotLog::default());
    let tracker = Arc::new(StreamingProgressTracker::new(log.clone()));

    tracker.add_items(5).await.unwrap();
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.items_completed(1).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(tracker.snapshot(), ProgressSnapshot::new(5, 5));
    let snapshots = log.snapshots.lock();
    assert_eq!(snapshots.len(), 6);
    assert!(snapshots.iter().all(|s| s.completed <= s.total));
}

#[tokio::test]
async fn test_collector_forwards_and_aggregates() {
    let recorder = Arc::new(RecordingListener::new());
    let collector = Arc::new(ProgressCollector::forwarding(recorder.clone()));

    engine()
        .find_references(target(), documents(3), collector.clone(), CancellationToken::new())
        .await
        .unwrap();

    recorder.assert_well_bracketed(3);
    assert_eq!(recorder.tracker_snapshot(), ProgressSnapshot::new(3, 3));

    let results = collector.results();
    assert!(results.completed);
    assert_eq!(results.referenced.len(), 1);
    assert_eq!(results.reference_count(), 3);
    assert_eq!(results.documents_searched, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_channel_streams_a_symbol_session() {
    let (progress, events) = ChannelProgress::new(4);

    let session = tokio::spawn(async move {
        engine()
            .find_references(target(), documents(3), Arc::new(progress), CancellationToken::new())
            .await
    });

    let events: Vec<ReferenceEvent> = events.collect().await;
    let summary = session.await.unwrap().unwrap();

    assert_eq!(summary.references, 3);
    assert!(matches!(events.first(), Some(ReferenceEvent::Started)));
    assert!(matches!(events.last(), Some(ReferenceEvent::Completed)));

    let count = |matches: fn(&ReferenceEvent) -> bool| events.iter().filter(|e| matches(e)).count();
    assert_eq!(count(|e| matches!(e, ReferenceEvent::DefinitionFound(_))), 1);
    assert_eq!(count(|e| matches!(e, ReferenceEvent::ReferenceFound { .. })), 3);
    assert_eq!(count(|e| matches!(e, ReferenceEvent::DocumentStarted(_))), 3);
    assert_eq!(count(|e| matches!(e, ReferenceEvent::DocumentCompleted(_))), 3);
}

#[tokio::test]
async fn test_dropped_receiver_fails_the_session() {
    let (progress, events) = ChannelProgress::new(1);
    drop(events);

    let result = engine()
        .find_references(target(), documents(3), Arc::new(progress), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(refsearch::SearchError::Listener(_))));
}
