mod query_cache;
mod types;

pub use query_cache::{CacheStats, QueryCache};
pub use types::{CacheEntry, CoordinateKey};
