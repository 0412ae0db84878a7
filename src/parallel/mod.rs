pub mod importer;
pub mod progress;

pub use importer::{ImportSummary, Importer, INDEX_VERSION};
pub use progress::{NoProgress, ProgressHandler, ProgressTracker};
