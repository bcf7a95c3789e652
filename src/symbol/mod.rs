//! Symbol handles, equivalence, and grouping
//!
//! This module defines the handle type the search engine passes around,
//! the metadata-unifying comparer that decides when two handles denote the
//! same entity, and the [`SymbolGroup`] value definitions are reported as.

pub mod comparer;
pub mod group;
pub mod handle;

pub use comparer::{EquivalenceKey, MetadataUnifyingComparer};
pub use group::SymbolGroup;
pub use handle::{
    DocumentId, ImageId, LineCol, Location, ProjectId, SymbolHandle, SymbolKey, SymbolOrigin,
    TextSpan,
};
