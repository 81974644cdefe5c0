pub mod executor;
pub mod filters;
pub mod sanitize;
pub mod scoring;
pub mod similarity;

pub use executor::{ChunkedExecutor, ProgressSink};
pub use sanitize::sanitize;
pub use scoring::ScoringEngine;
pub use similarity::SimilarityIndex;
