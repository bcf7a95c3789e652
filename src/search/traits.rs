//! Collaborator traits the search engines depend on.
//!
//! The engines do not know how symbols are located inside a document or how
//! projects link source files together; callers plug those capabilities in
//! through [`ReferenceFinder`] and [`Workspace`].

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::document::Document;
use crate::symbol::{Location, SymbolHandle};

/// A site located by a [`ReferenceFinder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundReference {
    /// The handle resolved at the site.
    pub symbol: SymbolHandle,
    pub location: Location,
    /// The site declares `symbol` rather than using it.
    pub is_definition: bool,
}

impl FoundReference {
    pub fn reference(symbol: SymbolHandle, location: Location) -> Self {
        Self {
            symbol,
            location,
            is_definition: false,
        }
    }

    pub fn definition(symbol: SymbolHandle, location: Location) -> Self {
        Self {
            symbol,
            location,
            is_definition: true,
        }
    }
}

/// Locates references to a symbol inside one document.
///
/// The stream is consumed in order, so references within a document are
/// reported in the order the finder yields them. An `Err` item fails the
/// document; items already yielded stay reported.
pub trait ReferenceFinder: Send + Sync {
    fn find_in_document<'a>(
        &'a self,
        symbol: &'a SymbolHandle,
        document: &'a dyn Document,
    ) -> BoxStream<'a, Result<FoundReference>>;
}

/// The project model's knowledge of linked symbols.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Handles for the same declaration in every project context that
    /// compiles it, `symbol` included.
    async fn linked_symbols(&self, symbol: &SymbolHandle) -> Result<Vec<SymbolHandle>>;
}

/// A workspace where no source file is shared between projects.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlinkedWorkspace;

#[async_trait]
impl Workspace for UnlinkedWorkspace {
    async fn linked_symbols(&self, symbol: &SymbolHandle) -> Result<Vec<SymbolHandle>> {
        Ok(vec![symbol.clone()])
    }
}
