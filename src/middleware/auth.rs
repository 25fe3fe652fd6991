use axum::{
    Extension,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::cache::FlashLevel;

use super::session::SessionHandle;

/// 受保护路由的登录检查，通过后把 `SessionUser` 放入请求扩展
pub async fn require_login(
    Extension(session): Extension<SessionHandle>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = {
        let mut data = session.lock().await;
        if data.user.is_none() {
            data.flash(FlashLevel::Warning, "Please login first!");
        }
        data.user.clone()
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "Rejected anonymous request");
            Redirect::to("/login").into_response()
        }
    }
}
