use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::routes::user::AccountError;
use crate::utils::{error_codes, error_to_api_response};

/// 请求处理过程中的非预期错误，统一返回 500
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session store error: {0}")]
    Cache(#[from] CacheError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("account store error: {0}")]
    Account(#[from] AccountError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response::<()>(
                error_codes::INTERNAL_ERROR,
                "Internal server error".to_string(),
            ),
        )
            .into_response()
    }
}
