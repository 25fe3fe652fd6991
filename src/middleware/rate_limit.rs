use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    cache::{CacheBackend, RateLimitCacheOperations},
    config::Config,
    error::AppError,
    utils::{error_codes, error_to_api_response},
};

#[derive(Clone)]
pub struct RateLimiter {
    cache: CacheBackend,
    config: Arc<Config>,
}

/// 客户端IP：信任代理时依次取 x-real-ip、x-forwarded-for 的第一个地址，否则只用连接地址
pub fn client_ip(req: &Request, trust_proxy_headers: bool) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    if !trust_proxy_headers {
        return remote_ip.unwrap_or_else(|| "unknown".to_string());
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .to_string()
}

impl RateLimiter {
    pub fn new(cache: CacheBackend, config: Config) -> Self {
        Self {
            cache,
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(&self, req: Request, next: Next) -> Result<Response, AppError> {
        let ip = client_ip(&req, self.config.trust_proxy_headers);
        let window = self.config.rate_limit_window().as_secs();

        let count = RateLimitCacheOperations::hit(&self.cache, &ip, window).await?;

        if count > i64::from(self.config.rate_limit_requests) {
            tracing::warn!(%ip, count, "Rate limit exceeded");
            return Ok((
                StatusCode::TOO_MANY_REQUESTS,
                error_to_api_response::<()>(
                    error_codes::RATE_LIMIT,
                    format!("Too many requests, retry in {} seconds", window),
                ),
            )
                .into_response());
        }

        Ok(next.run(req).await)
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}
