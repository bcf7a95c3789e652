use anyhow::Result;
use futures::StreamExt;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use refsearch::config::{DocumentsConfig, LiteralConfig, SearchConfig};
use refsearch::document::Walker;
use refsearch::progress::{ChannelProgress, ProgressSnapshot, ReferenceEvent};
use refsearch::search::{FindLiteralReferencesSearchEngine, SearchError};

fn project() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("src"))?;
    fs::create_dir_all(root.join("target/debug"))?;
    fs::write(
        root.join("src/lib.rs"),
        "pub fn parse_config() {}\n\nfn load() { parse_config(); parse_config_file(); }\n",
    )?;
    fs::write(root.join("src/main.rs"), "fn main() { refsearch::parse_config(); }\n")?;
    fs::write(root.join("README.md"), "Call parse_config first.\n")?;
    fs::write(root.join("target/debug/build.rs"), "parse_config();\n")?;

    Ok(temp_dir)
}

async fn collect_hits(
    engine: FindLiteralReferencesSearchEngine,
    pattern: &str,
    walker: Walker,
) -> (Result<usize, SearchError>, Vec<(String, usize)>, Option<ProgressSnapshot>) {
    let documents = walker.document_set();
    let (progress, events) = ChannelProgress::new(16);

    let search = {
        let pattern = pattern.to_string();
        let documents = documents.clone();
        tokio::spawn(async move {
            engine
                .find_literal_references(&pattern, documents, Arc::new(progress), CancellationToken::new())
                .await
                .map(|summary| summary.references)
        })
    };

    let events: Vec<ReferenceEvent> = events.collect().await;
    let result = search.await.unwrap();

    let mut hits = Vec::new();
    let mut last_progress = None;
    for event in events {
        match event {
            ReferenceEvent::LiteralFound { path, span, .. } => {
                let name = path
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                    .unwrap_or_default();
                hits.push((name, span.start));
            }
            // Snapshots can arrive out of order; keep the furthest one
            ReferenceEvent::Progress(snapshot) => {
                if last_progress.map_or(true, |last: ProgressSnapshot| snapshot.completed >= last.completed) {
                    last_progress = Some(snapshot);
                }
            }
            _ => {}
        }
    }
    hits.sort();

    (result, hits, last_progress)
}

#[tokio::test]
async fn test_literal_search_over_a_directory() -> Result<()> {
    let temp_dir = project()?;
    let walker = Walker::new(temp_dir.path(), &DocumentsConfig::default());
    let engine = FindLiteralReferencesSearchEngine::new(LiteralConfig::default(), SearchConfig::default());

    let (result, hits, progress) = collect_hits(engine, "parse_config", walker).await;

    // README.md is not a configured extension and target/ is ignored
    assert_eq!(result.unwrap(), 3);
    assert_eq!(
        hits,
        vec![
            ("lib.rs".to_string(), 7),
            ("lib.rs".to_string(), 38),
            ("main.rs".to_string(), 23),
        ]
    );
    assert!(progress.is_some_and(|p| p.is_done()));

    Ok(())
}

#[tokio::test]
async fn test_substring_matching_and_include_filter() -> Result<()> {
    let temp_dir = project()?;
    let walker = Walker::new(temp_dir.path(), &DocumentsConfig::default()).with_include("src/lib.rs")?;
    let engine = FindLiteralReferencesSearchEngine::new(
        LiteralConfig {
            whole_token: false,
            case_sensitive: true,
        },
        SearchConfig::default(),
    );

    let (result, hits, _) = collect_hits(engine, "parse_config", walker).await;

    assert_eq!(result.unwrap(), 3);
    assert!(hits.iter().all(|(name, _)| name == "lib.rs"));
    assert_eq!(hits.last().map(|(_, start)| *start), Some(54));

    Ok(())
}

#[tokio::test]
async fn test_case_insensitive_search() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("a.rs"), "let Total = total + TOTAL;")?;
    let walker = Walker::new(temp_dir.path(), &DocumentsConfig::default());
    let engine = FindLiteralReferencesSearchEngine::new(
        LiteralConfig {
            whole_token: true,
            case_sensitive: false,
        },
        SearchConfig::default(),
    );

    let (result, hits, _) = collect_hits(engine, "total", walker).await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(
        hits.iter().map(|(_, start)| *start).collect::<Vec<_>>(),
        vec![4, 12, 20]
    );

    Ok(())
}
