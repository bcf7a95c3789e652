//! Progress reporting for search sessions
//!
//! This module contains:
//! - `tracker` - Concurrency-safe completed/total counters and their listeners
//! - `protocol` - The callback contracts for symbol and literal searches
//! - `collector` - A listener that aggregates results in memory
//! - `channel` - A listener that streams results as events over a channel
//! - `bar` - A terminal progress bar listener

pub mod bar;
pub mod channel;
pub mod collector;
pub mod protocol;
pub mod tracker;

pub use bar::ProgressBarListener;
pub use channel::{ChannelProgress, ReferenceEvent};
pub use collector::{ProgressCollector, ReferenceSite, ReferencedSymbol, SearchResults};
pub use protocol::{
    FindLiteralReferencesProgress, FindReferencesProgress, NoOpFindReferencesProgress,
    NoOpLiteralProgress,
};
pub use tracker::{
    NoOpProgressTracker, ProgressListener, ProgressSnapshot, ProgressTracker,
    StreamingProgressTracker,
};
