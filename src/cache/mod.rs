// 缓存模块
// 会话与限流计数的短期存储，配置了 REDIS_URL 时使用 Redis，否则使用进程内存

pub mod keys;
pub mod models;
pub mod operations;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::{AsyncCommands, Client as RedisClient};
use thiserror::Error;
use tokio::sync::Mutex;

pub use models::session::{
    Flash, FlashLevel, LastReport, PendingRegistration, SessionData, SessionUser,
};
pub use operations::{RateLimitCacheOperations, SessionCacheOperations};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Clone)]
pub enum CacheBackend {
    Redis(Arc<RedisClient>),
    Memory(Arc<MemoryCache>),
}

impl CacheBackend {
    pub fn redis(client: RedisClient) -> Self {
        CacheBackend::Redis(Arc::new(client))
    }

    pub fn memory() -> Self {
        CacheBackend::Memory(Arc::new(MemoryCache::default()))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            CacheBackend::Redis(client) => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let value: Option<String> = conn.get(key).await?;
                Ok(value)
            }
            CacheBackend::Memory(cache) => Ok(cache.get(key).await),
        }
    }

    pub async fn set_ex(&self, key: &str, value: String, ttl: u64) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(client) => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.set_ex(key, value, ttl).await?;
                Ok(())
            }
            CacheBackend::Memory(cache) => {
                cache.set_ex(key, value, Duration::from_secs(ttl)).await;
                Ok(())
            }
        }
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(client) => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.del(key).await?;
                Ok(())
            }
            CacheBackend::Memory(cache) => {
                cache.del(key).await;
                Ok(())
            }
        }
    }

    /// 计数加一，首次计数时设置过期时间（固定窗口）
    pub async fn incr_window(&self, key: &str, window: u64) -> Result<i64, CacheError> {
        match self {
            CacheBackend::Redis(client) => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let count: i64 = conn.incr(key, 1).await?;
                if count == 1 {
                    let _: () = conn.expire(key, window as i64).await?;
                }
                Ok(count)
            }
            CacheBackend::Memory(cache) => {
                Ok(cache.incr_window(key, Duration::from_secs(window)).await)
            }
        }
    }
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// 进程内缓存，过期条目在访问时清除
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    async fn del(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn incr_window(&self, key: &str, window: Duration) -> i64 {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                let count = entry.value.parse::<i64>().unwrap_or(0) + 1;
                entry.value = count.to_string();
                count
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    MemoryEntry {
                        value: "1".to_string(),
                        expires_at: now + window,
                    },
                );
                1
            }
        }
    }
}
