//! Streaming, concurrent reference search.
//!
//! This module contains:
//! - `traits` - The reference finder and workspace collaborators
//! - `registry` - The shared equivalence class to definition group mapping
//! - `pool` - Bounded per-document task fan-out with session cancellation
//! - `engine` - Symbol-reference search sessions
//! - `literal` - Text occurrence search sessions
//! - `errors` - Session errors and per-document failure collection

pub mod engine;
pub mod errors;
pub mod literal;
mod pool;
pub mod registry;
pub mod traits;

pub use engine::{FindReferencesSearchEngine, SearchSummary};
pub use errors::{DocumentFailure, FailureCollector, FailureReport, SearchError};
pub use literal::{find_literal_spans, FindLiteralReferencesSearchEngine};
pub use pool::{DocumentStatus, PoolOutcome};
pub use registry::GroupRegistry;
pub use traits::{FoundReference, ReferenceFinder, UnlinkedWorkspace, Workspace};
