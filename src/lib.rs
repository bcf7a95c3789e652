pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod search;
pub mod symbol;

pub use config::Config;
pub use document::{Document, DocumentSet};
pub use progress::{FindLiteralReferencesProgress, FindReferencesProgress, ProgressTracker};
pub use search::{FindLiteralReferencesSearchEngine, FindReferencesSearchEngine, SearchError};
pub use symbol::{SymbolGroup, SymbolHandle};
