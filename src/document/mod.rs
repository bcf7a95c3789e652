//! Documents to search
//!
//! A [`Document`] is anything with a stable id and text. [`DocumentSet`]
//! is the ordered collection a search fans out over; [`Walker`] builds one
//! from a directory tree.

pub mod set;
pub mod walker;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::symbol::DocumentId;

pub use set::DocumentSet;
pub use walker::Walker;

/// A searchable document with stable identity.
#[async_trait]
pub trait Document: Send + Sync {
    fn id(&self) -> DocumentId;

    /// Path for display, if the document has one.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// The full text of the document.
    async fn text(&self) -> Result<Arc<str>>;
}

/// A document held in memory.
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: DocumentId,
    path: Option<PathBuf>,
    text: Arc<str>,
}

impl TextDocument {
    pub fn new(id: DocumentId, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            path: None,
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[async_trait]
impl Document for TextDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn text(&self) -> Result<Arc<str>> {
        Ok(self.text.clone())
    }
}

/// A document backed by a file, read on demand.
#[derive(Debug, Clone)]
pub struct FileDocument {
    id: DocumentId,
    path: PathBuf,
}

impl FileDocument {
    pub fn new(id: DocumentId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

#[async_trait]
impl Document for FileDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn text(&self) -> Result<Arc<str>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Arc::from(text))
    }
}
