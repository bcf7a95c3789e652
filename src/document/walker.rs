use anyhow::{Context, Result};
use glob::Pattern;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{DocumentSet, FileDocument};
use crate::config::DocumentsConfig;
use crate::symbol::DocumentId;

/// Collects searchable files under a root, respecting `.gitignore`, the
/// configured ignore patterns and extensions, and an optional include glob.
pub struct Walker {
    root: PathBuf,
    extensions: HashSet<String>,
    ignore_patterns: Vec<String>,
    include: Option<Pattern>,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>, config: &DocumentsConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.extensions.iter().cloned().collect(),
            ignore_patterns: config.ignore_patterns.clone(),
            include: None,
        }
    }

    /// Only keep files whose path relative to the root matches `pattern`.
    pub fn with_include(mut self, pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern)
            .with_context(|| format!("Invalid include pattern '{}'", pattern))?;
        self.include = Some(pattern);
        Ok(self)
    }

    /// Walk the tree, yielding file paths in a stable (sorted) order.
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .hidden(true)
            .sort_by_file_path(|a, b| a.cmp(b));

        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.ignore_patterns {
            for glob in [format!("!{}", pattern), format!("!{}/**", pattern)] {
                if let Err(e) = overrides.add(&glob) {
                    warn!("Skipping ignore pattern '{}': {}", pattern, e);
                }
            }
        }
        match overrides.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => warn!("Failed to build ignore overrides: {}", e),
        }

        builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.is_wanted(path))
            .collect()
    }

    /// Collect the files as a [`DocumentSet`] with sequential ids.
    pub fn document_set(&self) -> DocumentSet {
        let files = self.collect_files();
        debug!("Collected {} documents under {}", files.len(), self.root.display());

        files
            .into_iter()
            .enumerate()
            .map(|(index, path)| {
                Arc::new(FileDocument::new(DocumentId::new(index as u32), path))
                    as Arc<dyn super::Document>
            })
            .collect()
    }

    fn is_wanted(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative_str = relative.to_string_lossy();

        if self
            .ignore_patterns
            .iter()
            .any(|pattern| relative.components().any(|c| c.as_os_str() == pattern.as_str()))
        {
            return false;
        }

        let extension_ok = self.extensions.is_empty()
            || path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| self.extensions.contains(ext));

        let include_ok = self
            .include
            .as_ref()
            .map_or(true, |pattern| pattern.matches(&relative_str));

        extension_ok && include_ok
    }
}
