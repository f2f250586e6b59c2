//! Cache infrastructure - Cache implementations and the Redis connection pool

mod factory;
mod in_memory;
mod pool;
mod redis;

pub use factory::CacheFactory;
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use pool::{PoolStatus, RedisPool, RedisPoolConfig};
pub use redis::{RedisCache, RedisCacheConfig};
