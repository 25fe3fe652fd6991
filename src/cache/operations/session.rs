use crate::cache::keys::session_key;
use crate::cache::models::session::SessionData;
use crate::cache::{CacheBackend, CacheError};

/// 会话缓存操作
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// 获取会话
    pub async fn load(
        cache: &CacheBackend,
        session_id: &str,
    ) -> Result<Option<SessionData>, CacheError> {
        match cache.get(&session_key(session_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 缓存会话，每次写入都会刷新过期时间
    pub async fn store(
        cache: &CacheBackend,
        session_id: &str,
        data: &SessionData,
        ttl: u64,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(data)?;
        cache.set_ex(&session_key(session_id), json, ttl).await
    }

    /// 删除会话
    pub async fn remove(cache: &CacheBackend, session_id: &str) -> Result<(), CacheError> {
        cache.del(&session_key(session_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FlashLevel, SessionUser};

    #[tokio::test]
    async fn store_load_remove() {
        let cache = CacheBackend::memory();
        assert!(SessionCacheOperations::load(&cache, "sid").await.unwrap().is_none());

        let mut data = SessionData {
            user: Some(SessionUser {
                email: "a@x.com".into(),
                name: "A".into(),
            }),
            ..Default::default()
        };
        data.flash(FlashLevel::Success, "hi");
        SessionCacheOperations::store(&cache, "sid", &data, 60).await.unwrap();

        let loaded = SessionCacheOperations::load(&cache, "sid").await.unwrap().unwrap();
        assert_eq!(loaded.user, data.user);
        assert_eq!(loaded.flashes, data.flashes);

        SessionCacheOperations::remove(&cache, "sid").await.unwrap();
        assert!(SessionCacheOperations::load(&cache, "sid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_session_is_a_codec_error() {
        let cache = CacheBackend::memory();
        cache.set_ex(&session_key("sid"), "not json".into(), 60).await.unwrap();
        let err = SessionCacheOperations::load(&cache, "sid").await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }
}
