use anyhow::Result;
use futures::StreamExt;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::document::{Document, DocumentSet, Walker};
use crate::metrics;
use crate::progress::{ChannelProgress, ProgressBarListener, ProgressListener, ReferenceEvent};
use crate::search::{FindLiteralReferencesSearchEngine, SearchError};
use crate::symbol::{DocumentId, Location, TextSpan};
use crate::Config;

/// Options for the literal command
pub struct LiteralArgs {
    pub pattern: String,
    pub path: Option<PathBuf>,
    pub include: Option<String>,
    pub ignore_case: bool,
    pub substring: bool,
    pub metrics: bool,
}

/// Run a literal search, printing each hit as it is found
pub async fn run(args: LiteralArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => env::current_dir()?,
    };
    let config = Config::load(&root)?;

    let mut literal = config.literal.clone();
    if args.ignore_case {
        literal.case_sensitive = false;
    }
    if args.substring {
        literal.whole_token = false;
    }

    let mut walker = Walker::new(&root, &config.documents);
    if let Some(include) = &args.include {
        walker = walker.with_include(include)?;
    }
    let documents = walker.document_set();

    if documents.is_empty() {
        println!("No documents to search under {}", root.display());
        return Ok(());
    }

    let engine = FindLiteralReferencesSearchEngine::new(literal, config.search.clone());
    let (progress, mut events) = ChannelProgress::new(256);
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let search = {
        let pattern = args.pattern.clone();
        let documents = documents.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            engine
                .find_literal_references(&pattern, documents, Arc::new(progress), cancel)
                .await
        })
    };

    let bar = ProgressBarListener::new("Documents");
    let mut printer = HitPrinter::new(&root, &documents);

    while let Some(event) = events.next().await {
        match event {
            ReferenceEvent::Progress(snapshot) => bar.report_progress(snapshot).await?,
            ReferenceEvent::LiteralFound { document, span, .. } => {
                if let Some(line) = printer.format(document, span).await {
                    bar.bar().println(line);
                }
            }
            _ => {}
        }
    }

    let result = search.await?;
    interrupt.abort();

    match result {
        Ok(summary) => {
            bar.finish("Done");
            println!(
                "\nFound {} occurrence(s) of \"{}\" in {} document(s) ({:.2}s)",
                summary.references,
                args.pattern,
                summary.documents_searched,
                summary.elapsed.as_secs_f64()
            );
        }
        Err(SearchError::Cancelled) => {
            bar.finish("Cancelled");
            eprintln!("Search cancelled");
        }
        Err(e) => {
            bar.finish("Failed");
            return Err(e.into());
        }
    }

    if args.metrics {
        print!("\n{}", metrics::gather_metrics());
    }

    Ok(())
}

/// Turns hits into `path:line:col` lines, reading each document's text once.
struct HitPrinter<'a> {
    root: &'a Path,
    documents: &'a DocumentSet,
    texts: HashMap<DocumentId, Arc<str>>,
}

impl<'a> HitPrinter<'a> {
    fn new(root: &'a Path, documents: &'a DocumentSet) -> Self {
        Self {
            root,
            documents,
            texts: HashMap::new(),
        }
    }

    async fn format(&mut self, id: DocumentId, span: TextSpan) -> Option<String> {
        let document = self.documents.get(id)?;

        let text = match self.texts.get(&id) {
            Some(text) => text.clone(),
            None => match document.text().await {
                Ok(text) => {
                    self.texts.insert(id, text.clone());
                    text
                }
                Err(e) => {
                    warn!("Failed to re-read {}: {:#}", id, e);
                    return None;
                }
            },
        };

        // The file may have changed since it was searched.
        let before = text.get(..span.end)?;
        let after = text.get(span.end..)?;
        let line = format!(
            "{}{}",
            before.rsplit('\n').next().unwrap_or_default(),
            after.split('\n').next().unwrap_or_default()
        );

        let mut location = Location::new(id, span).with_position_in(&text);
        if let Some(path) = document.path() {
            let relative = path.strip_prefix(self.root).unwrap_or(path);
            location = location.with_path(Arc::from(relative));
        }

        Some(format!("{}: {}", location, line.trim()))
    }
}
