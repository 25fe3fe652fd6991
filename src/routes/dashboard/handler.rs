use axum::{extract::Extension, response::IntoResponse};
use serde::Serialize;

use crate::{cache::SessionUser, middleware::SessionHandle, routes::page};

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub authenticated: bool,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub name: String,
}

#[axum::debug_handler]
pub async fn home(Extension(session): Extension<SessionHandle>) -> impl IntoResponse {
    let name = session.lock().await.user.as_ref().map(|user| user.name.clone());
    let view = HomeView {
        authenticated: name.is_some(),
        name,
    };
    page(&session, view).await
}

#[axum::debug_handler]
pub async fn dashboard(
    Extension(session): Extension<SessionHandle>,
    Extension(user): Extension<SessionUser>,
) -> impl IntoResponse {
    page(&session, DashboardView { name: user.name }).await
}
