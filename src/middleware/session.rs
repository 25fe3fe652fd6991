use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    AppState,
    cache::{CacheError, SessionCacheOperations, SessionData},
    error::AppError,
};

pub const SESSION_COOKIE: &str = "glyco_sid";

/// 当前请求的会话，处理函数通过 `Extension<SessionHandle>` 取得
#[derive(Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    data: Arc<Mutex<SessionData>>,
    rotate: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new(id: String, data: SessionData) -> Self {
        Self {
            id: Arc::from(id),
            data: Arc::new(Mutex::new(data)),
            rotate: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.data.lock().await
    }

    /// 响应时换发新的会话ID（登录后调用）
    pub fn rotate_id(&self) {
        self.rotate.store(true, Ordering::Relaxed);
    }
}

fn session_cookie(id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let existing = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let id = cookie.value().to_string();
            match SessionCacheOperations::load(&state.cache, &id).await {
                Ok(data) => data.map(|data| (id, data)),
                Err(CacheError::Codec(e)) => {
                    tracing::warn!("Discarding unreadable session: {}", e);
                    None
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => None,
    };

    // 未知或已过期的会话ID不沿用，始终换发新ID
    let (loaded_id, data) = match existing {
        Some((id, data)) => (Some(id), data),
        None => (None, SessionData::default()),
    };
    let handle = SessionHandle::new(
        loaded_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        data,
    );
    req.extensions_mut().insert(handle.clone());

    let response = next.run(req).await;

    let data = handle.lock().await.clone();
    let ttl = state.config.session_ttl_secs;

    if data.is_empty() {
        if let Some(id) = loaded_id {
            SessionCacheOperations::remove(&state.cache, &id).await?;
            let removal = Cookie::build(SESSION_COOKIE).path("/");
            return Ok((jar.remove(removal), response).into_response());
        }
        return Ok(response);
    }

    let id = if handle.rotate.load(Ordering::Relaxed) {
        if let Some(old) = &loaded_id {
            SessionCacheOperations::remove(&state.cache, old).await?;
        }
        Uuid::new_v4().to_string()
    } else {
        handle.id().to_string()
    };

    SessionCacheOperations::store(&state.cache, &id, &data, ttl).await?;
    let jar = jar.add(session_cookie(id, state.config.secure_cookies));
    Ok((jar, response).into_response())
}
