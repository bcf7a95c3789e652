//! Symbol groups: the unit of identity for definitions.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use super::comparer::{EquivalenceKey, MetadataUnifyingComparer};
use super::handle::SymbolHandle;

/// An immutable set of equivalent or linked handles around the handle the
/// search was started for.
///
/// Equality is set equality of the members under
/// [`MetadataUnifyingComparer`]; which member is primary and the order the
/// members were supplied in do not matter.
pub struct SymbolGroup {
    primary: SymbolHandle,
    members: HashMap<EquivalenceKey, SymbolHandle>,
    hash: OnceLock<u64>,
}

impl SymbolGroup {
    /// Build a group from `symbols`, which must contain `primary`.
    ///
    /// # Panics
    ///
    /// Panics if `symbols` is empty, does not contain `primary`, or has two
    /// or more entries of which any is resolved from metadata.
    pub fn new(primary: SymbolHandle, symbols: impl IntoIterator<Item = SymbolHandle>) -> Self {
        let comparer = MetadataUnifyingComparer;
        let symbols: Vec<SymbolHandle> = symbols.into_iter().collect();

        assert!(!symbols.is_empty(), "symbol group must not be empty");
        assert!(
            symbols.iter().any(|s| comparer.equals(s, &primary)),
            "symbol group must contain its primary symbol {primary}"
        );
        assert!(
            symbols.len() < 2 || !symbols.iter().any(SymbolHandle::is_from_metadata),
            "multi-symbol groups may only contain source symbols"
        );

        let mut members = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            members.entry(comparer.key(&symbol)).or_insert(symbol);
        }

        Self {
            primary,
            members,
            hash: OnceLock::new(),
        }
    }

    /// A group with exactly one member.
    pub fn single(symbol: SymbolHandle) -> Self {
        Self::new(symbol.clone(), [symbol])
    }

    pub fn primary(&self) -> &SymbolHandle {
        &self.primary
    }

    pub fn members(&self) -> impl Iterator<Item = &SymbolHandle> + '_ {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `symbol` is equivalent to one of the members.
    pub fn contains(&self, symbol: &SymbolHandle) -> bool {
        self.members
            .contains_key(&MetadataUnifyingComparer.key(symbol))
    }

    /// Equivalence keys of all members.
    pub fn keys(&self) -> impl Iterator<Item = &EquivalenceKey> + '_ {
        self.members.keys()
    }

    /// Order-independent hash of the members, computed on first use.
    pub fn member_hash(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let comparer = MetadataUnifyingComparer;
            self.members
                .values()
                .fold(0u64, |acc, member| acc.wrapping_add(comparer.hash(member)))
        })
    }
}

impl PartialEq for SymbolGroup {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.members.len() == other.members.len()
            && self.member_hash() == other.member_hash()
            && self.members.keys().all(|key| other.members.contains_key(key))
    }
}

impl Eq for SymbolGroup {}

impl Hash for SymbolGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.member_hash());
    }
}

impl fmt::Debug for SymbolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolGroup")
            .field("primary", &self.primary)
            .field("members", &self.members.len())
            .finish()
    }
}

impl fmt::Display for SymbolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if self.members.len() > 1 {
            write!(f, " (+{} linked)", self.members.len() - 1)?;
        }
        Ok(())
    }
}
