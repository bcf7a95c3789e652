use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use refsearch::config::SearchConfig;
use refsearch::progress::ProgressSnapshot;
use refsearch::search::{FindReferencesSearchEngine, SearchError, UnlinkedWorkspace};
use refsearch::symbol::{ImageId, ProjectId, SymbolHandle, TextSpan};

use crate::helpers::{documents, FakeWorkspace, Recorded, RecordingListener, ScriptedFinder, Step};

fn span(start: usize) -> TextSpan {
    TextSpan::from(start..start + 3)
}

fn foo_bar_in(project: u32) -> SymbolHandle {
    SymbolHandle::source("M:Foo.Bar", ProjectId(project), ImageId(project))
}

fn config(max_concurrent_documents: usize) -> SearchConfig {
    SearchConfig {
        max_concurrent_documents,
        ..SearchConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_documents_are_bracketed_in_every_run() {
    let target = foo_bar_in(1);

    for _ in 0..20 {
        let finder = ScriptedFinder::new()
            .script(0, vec![Step::Reference(target.clone(), span(0)), Step::Reference(target.clone(), span(10))])
            .script(1, vec![Step::Reference(target.clone(), span(4))])
            .script(2, vec![]);
        let engine = FindReferencesSearchEngine::new(
            Arc::new(finder),
            Arc::new(UnlinkedWorkspace),
            config(3),
        );
        let listener = Arc::new(RecordingListener::new());

        let summary = engine
            .find_references(target.clone(), documents(3), listener.clone(), CancellationToken::new())
            .await
            .unwrap();

        listener.assert_well_bracketed(3);
        assert_eq!(summary.references, 3);
        assert_eq!(listener.references().len(), 3);
        assert_eq!(listener.tracker_snapshot(), ProgressSnapshot::new(3, 3));

        let snapshots = listener.progress.snapshots.lock();
        assert!(snapshots.iter().all(|s| s.completed <= s.total));
        assert!(snapshots.contains(&ProgressSnapshot::new(3, 3)));
    }
}

#[tokio::test]
async fn test_references_within_a_document_keep_finder_order() {
    let target = foo_bar_in(1);
    let finder = ScriptedFinder::new().script(
        0,
        vec![
            Step::Reference(target.clone(), span(30)),
            Step::Reference(target.clone(), span(5)),
            Step::Reference(target.clone(), span(17)),
        ],
    );
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(2));
    let listener = Arc::new(RecordingListener::new());

    engine
        .find_references(target, documents(1), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let starts: Vec<usize> = listener
        .references()
        .iter()
        .map(|(_, _, location)| location.span.start)
        .collect();
    assert_eq!(starts, vec![30, 5, 17]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_linked_source_and_metadata_fold_into_one_group() {
    let p1 = foo_bar_in(1);
    let p2 = foo_bar_in(2);
    // P2's compiled output, seen from a third project
    let p2_metadata = SymbolHandle::metadata("M:Foo.Bar", ImageId(2));

    let workspace = FakeWorkspace::new().link(&[p1.clone(), p2.clone()]);
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Reference(p1.clone(), span(0))])
        .script(1, vec![Step::Reference(p2.clone(), span(0))])
        .script(2, vec![Step::Reference(p2_metadata.clone(), span(0))]);
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(workspace), config(3));
    let listener = Arc::new(RecordingListener::new());

    let summary = engine
        .find_references(p1.clone(), documents(3), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let definitions = listener.definitions();
    assert_eq!(definitions.len(), 1);
    assert_eq!(summary.definitions, 1);

    let group = &definitions[0];
    assert_eq!(group.len(), 2);
    assert!(group.contains(&p1));
    assert!(group.contains(&p2));
    assert!(group.contains(&p2_metadata));

    let references = listener.references();
    assert_eq!(references.len(), 3);
    assert!(references.iter().all(|(g, _, _)| Arc::ptr_eq(g, group)));
    assert!(references.iter().any(|(_, symbol, _)| *symbol == p2_metadata));
}

#[tokio::test]
async fn test_metadata_target_unifies_with_its_source_project() {
    let metadata = SymbolHandle::metadata("T:Widget", ImageId(5));
    let source = SymbolHandle::source("T:Widget", ProjectId(5), ImageId(5));

    let finder = ScriptedFinder::new().script(0, vec![Step::Reference(source.clone(), span(2))]);
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(1));
    let listener = Arc::new(RecordingListener::new());

    engine
        .find_references(metadata.clone(), documents(1), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let definitions = listener.definitions();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].len(), 1);
    assert_eq!(definitions[0].primary(), &metadata);

    let references = listener.references();
    assert!(Arc::ptr_eq(&references[0].0, &definitions[0]));
    assert_eq!(references[0].1, source);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_linked_sources_found_from_metadata_target_join_their_own_groups() {
    let p1 = foo_bar_in(1);
    let p2 = foo_bar_in(2);
    let metadata = SymbolHandle::metadata("M:Foo.Bar", ImageId(2));

    let workspace = FakeWorkspace::new().link(&[p1.clone(), p2.clone()]);
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Reference(p1.clone(), span(0)), Step::Reference(p1.clone(), span(9))])
        .script(1, vec![Step::Reference(p2.clone(), span(0))])
        .script(2, vec![Step::Reference(metadata.clone(), span(0))]);
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(workspace), config(3));
    let listener = Arc::new(RecordingListener::new());

    let summary = engine
        .find_references(metadata.clone(), documents(3), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let references = listener.references();
    assert_eq!(references.len(), 4);
    for (group, symbol, _) in &references {
        assert!(group.contains(symbol), "{} reported under {}", symbol, group);
    }

    let definitions = listener.definitions();
    assert_eq!(definitions.len(), 2);
    assert_eq!(summary.definitions, 2);
    assert_eq!(definitions[0].primary(), &metadata);
    assert!(definitions[0].contains(&p2));

    let p1_group = definitions
        .iter()
        .find(|group| group.contains(&p1))
        .expect("p1 should be reported as its own definition");
    assert_eq!(p1_group.len(), 1);
}

#[tokio::test]
async fn test_unrelated_metadata_images_stay_separate() {
    let ours = SymbolHandle::metadata("T:Json.Reader", ImageId(7));
    let theirs = SymbolHandle::metadata("T:Json.Reader", ImageId(8));

    let finder = ScriptedFinder::new().script(
        0,
        vec![
            Step::Reference(ours.clone(), span(0)),
            Step::Reference(theirs.clone(), span(20)),
        ],
    );
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(1));
    let listener = Arc::new(RecordingListener::new());

    engine
        .find_references(ours.clone(), documents(1), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let definitions = listener.definitions();
    assert_eq!(definitions.len(), 2);
    assert!(definitions.iter().all(|group| group.len() == 1));
    assert_ne!(definitions[0], definitions[1]);
    assert!(definitions[0].contains(&ours));
    assert!(definitions[1].contains(&theirs));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_discovery_reports_definition_once() {
    let target = foo_bar_in(1);
    let cascaded = SymbolHandle::source("M:Foo.Baz", ProjectId(1), ImageId(1));

    let mut finder = ScriptedFinder::new();
    for document in 0..8 {
        finder = finder.script(
            document,
            vec![
                Step::Definition(cascaded.clone(), span(0)),
                Step::Reference(cascaded.clone(), span(8)),
            ],
        );
    }
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(8));
    let listener = Arc::new(RecordingListener::new());

    let summary = engine
        .find_references(target, documents(8), listener.clone(), CancellationToken::new())
        .await
        .unwrap();

    let cascaded_definitions: Vec<_> = listener
        .definitions()
        .into_iter()
        .filter(|group| group.contains(&cascaded))
        .collect();
    assert_eq!(cascaded_definitions.len(), 1);
    assert_eq!(summary.definitions, 2);

    let references = listener.references();
    assert_eq!(references.len(), 8);
    assert!(references
        .iter()
        .all(|(group, _, _)| Arc::ptr_eq(group, &cascaded_definitions[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_document_does_not_stop_siblings() {
    let target = foo_bar_in(1);
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Reference(target.clone(), span(0))])
        .script(1, vec![Step::Reference(target.clone(), span(0)), Step::Fail("syntax tree unavailable")])
        .script(2, vec![Step::Reference(target.clone(), span(0))]);
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(3));
    let listener = Arc::new(RecordingListener::new());

    let result = engine
        .find_references(target, documents(3), listener.clone(), CancellationToken::new())
        .await;

    match result {
        Err(SearchError::DocumentsFailed(report)) => {
            assert_eq!(report.total_failures, 1);
            assert!(report.failures[0].error.contains("syntax tree unavailable"));
        }
        other => panic!("expected a document failure, got {:?}", other),
    }

    listener.assert_well_bracketed(3);
    assert_eq!(listener.references().len(), 3);
    assert_eq!(listener.tracker_snapshot(), ProgressSnapshot::new(3, 3));
}

#[tokio::test]
async fn test_partial_failure_can_skip_completion() {
    let target = foo_bar_in(1);
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Fail("boom")])
        .script(1, vec![Step::Reference(target.clone(), span(0))]);
    let engine = FindReferencesSearchEngine::new(
        Arc::new(finder),
        Arc::new(UnlinkedWorkspace),
        SearchConfig {
            complete_on_partial_failure: false,
            ..config(2)
        },
    );
    let listener = Arc::new(RecordingListener::new());

    let result = engine
        .find_references(target, documents(2), listener.clone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(SearchError::DocumentsFailed(_))));
    assert_eq!(listener.count(|e| matches!(e, Recorded::Completed)), 0);
    assert_eq!(listener.tracker_snapshot(), ProgressSnapshot::new(2, 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancellation_aborts_in_flight_documents() {
    let target = foo_bar_in(1);
    let engine = FindReferencesSearchEngine::new(
        Arc::new(ScriptedFinder::hanging()),
        Arc::new(UnlinkedWorkspace),
        config(2),
    );
    let listener = Arc::new(RecordingListener::new());
    let cancel = CancellationToken::new();

    let session = {
        let listener = listener.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            engine
                .find_references(target, documents(4), listener, cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), session)
        .await
        .expect("cancelled session should finish")
        .unwrap();

    assert!(matches!(result, Err(SearchError::Cancelled)));
    assert_eq!(listener.count(|e| matches!(e, Recorded::Started)), 1);
    assert_eq!(listener.count(|e| matches!(e, Recorded::Completed)), 0);
    assert_eq!(listener.count(|e| matches!(e, Recorded::DocumentCompleted(_))), 0);
    assert_eq!(listener.tracker_snapshot(), ProgressSnapshot::new(0, 4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listener_failure_aborts_session() {
    let target = foo_bar_in(1);
    let finder = ScriptedFinder::new()
        .script(0, vec![Step::Reference(target.clone(), span(0))])
        .script(1, vec![Step::Reference(target.clone(), span(0))])
        .with_delay(Duration::from_millis(5));
    let engine = FindReferencesSearchEngine::new(Arc::new(finder), Arc::new(UnlinkedWorkspace), config(2));
    let listener = Arc::new(RecordingListener::failing_on_reference());

    let result = engine
        .find_references(target, documents(2), listener.clone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(SearchError::Listener(_))));
    assert_eq!(listener.count(|e| matches!(e, Recorded::Completed)), 0);

    let snapshot = listener.tracker_snapshot();
    assert_eq!(snapshot.total, 2);
    assert!(snapshot.completed <= snapshot.total);
}
