//! Ordered, de-duplicated document collections.

use std::collections::HashSet;
use std::sync::Arc;

use super::Document;
use crate::symbol::DocumentId;

/// The documents a search session runs over, in insertion order.
///
/// Adding a document whose id is already present is a no-op, so every
/// document is searched (and bracketed) exactly once.
#[derive(Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Arc<dyn Document>>,
    ids: HashSet<DocumentId>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, returning `false` if its id was already present.
    pub fn insert(&mut self, document: Arc<dyn Document>) -> bool {
        if !self.ids.insert(document.id()) {
            return false;
        }
        self.documents.push(document);
        true
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Arc<dyn Document>> {
        if !self.contains(id) {
            return None;
        }
        self.documents.iter().find(|doc| doc.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Document>> + '_ {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Arc<dyn Document>> for DocumentSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Document>>>(iter: I) -> Self {
        let mut set = Self::new();
        for document in iter {
            set.insert(document);
        }
        set
    }
}

impl IntoIterator for DocumentSet {
    type Item = Arc<dyn Document>;
    type IntoIter = std::vec::IntoIter<Arc<dyn Document>>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl std::fmt::Debug for DocumentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSet")
            .field("len", &self.documents.len())
            .finish()
    }
}
