pub mod iterator;

pub use iterator::PeptideIterator;
