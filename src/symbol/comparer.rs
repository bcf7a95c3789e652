//! Metadata-unifying symbol equivalence.
//!
//! Two handles are equivalent when they name the same entity in the same
//! compiled image. A source handle stands for its project's output image,
//! so a metadata handle read from that output unifies with it. Two metadata
//! handles only match when they are the same handle, because a metadata
//! handle's image is part of its own identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::handle::{ImageId, SymbolHandle, SymbolKey};

/// The projection two equivalent handles share.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EquivalenceKey {
    pub symbol: SymbolKey,
    pub image: ImageId,
}

/// Stateless equivalence comparer over [`SymbolHandle`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct MetadataUnifyingComparer;

impl MetadataUnifyingComparer {
    pub const INSTANCE: Self = MetadataUnifyingComparer;

    pub fn key(&self, handle: &SymbolHandle) -> EquivalenceKey {
        EquivalenceKey {
            symbol: handle.key().clone(),
            image: handle.origin().image(),
        }
    }

    pub fn equals(&self, a: &SymbolHandle, b: &SymbolHandle) -> bool {
        if a.is_from_metadata() && b.is_from_metadata() {
            return a == b;
        }
        a.key() == b.key() && a.origin().image() == b.origin().image()
    }

    /// Hash compatible with [`Self::equals`]. Deterministic across calls and
    /// processes.
    pub fn hash(&self, handle: &SymbolHandle) -> u64 {
        let mut hasher = DefaultHasher::new();
        handle.key().hash(&mut hasher);
        handle.origin().image().hash(&mut hasher);
        hasher.finish()
    }
}
