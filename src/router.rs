use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::{RateLimiter, log_errors, rate_limit, require_login, session_layer},
    routes,
};

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(state.cache.clone(), state.config.clone()));

    // 公开路由
    let public_routes = Router::new()
        .route("/", get(routes::dashboard::home))
        .route(
            "/register",
            get(routes::user::register_page).post(routes::user::register),
        )
        .route(
            "/verify_otp",
            get(routes::user::verify_otp_page).post(routes::user::verify_otp),
        )
        .route(
            "/login",
            get(routes::user::login_page).post(routes::user::login),
        )
        .route("/logout", get(routes::user::logout));

    // 需要登录的路由
    let protected_routes = Router::new()
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route(
            "/predict_clinical",
            get(routes::report::clinical_page).post(routes::report::predict_clinical),
        )
        .route(
            "/predict_symptoms",
            get(routes::report::symptoms_page).post(routes::report::predict_symptoms),
        )
        .route("/result", get(routes::report::show_result))
        .route("/food_chart", get(routes::report::food_chart))
        .route("/profile", get(routes::user::profile))
        .route_layer(axum::middleware::from_fn(require_login));

    // 外层到内层：请求追踪、限流、错误日志、会话
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_layer,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(routes::not_found)
        .layer(layers);

    // 开发模式允许所有来源
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
