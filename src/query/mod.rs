pub mod cache;
pub mod expansion;
pub mod reversal;

pub use cache::QueryCache;
pub use expansion::initial_tags;
pub use reversal::reversed_results;
