pub mod dashboard;
pub mod report;
pub mod user;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::{
    cache::{Flash, FlashLevel},
    middleware::SessionHandle,
    result::ApiResponse,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

/// 页面数据：渲染模板所需的字段加上待展示的提示消息
#[derive(Debug, Serialize)]
pub struct PageView<T: Serialize> {
    #[serde(flatten)]
    pub data: T,
    pub flashes: Vec<Flash>,
}

/// 取出会话中的提示消息并生成页面响应
pub async fn page<T: Serialize>(
    session: &SessionHandle,
    data: T,
) -> Json<ApiResponse<PageView<T>>> {
    let flashes = session.lock().await.take_flashes();
    success_to_api_response(PageView { data, flashes })
}

/// 写入提示消息后重定向
pub async fn flash_redirect(
    session: &SessionHandle,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    session.lock().await.flash(level, message);
    Redirect::to(to).into_response()
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response::<()>(error_codes::NOT_FOUND, "Not found".to_string()),
    )
}
