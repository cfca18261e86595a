pub mod resource_cache;

pub use resource_cache::CacheKey;
pub use resource_cache::Caches;
pub use resource_cache::ResourceCache;
