pub mod cache;
pub mod macros;

pub use cache::CacheKey;
pub use cache::ResultCache;
