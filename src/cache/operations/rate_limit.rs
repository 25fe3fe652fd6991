use crate::cache::keys::rate_limit_key;
use crate::cache::{CacheBackend, CacheError};

/// 速率限制缓存操作
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// 记录一次请求，返回当前窗口内的请求数
    pub async fn hit(cache: &CacheBackend, ip: &str, window_secs: u64) -> Result<i64, CacheError> {
        cache.incr_window(&rate_limit_key(ip), window_secs).await
    }
}
