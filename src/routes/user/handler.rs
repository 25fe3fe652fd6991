use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, Utc};
use serde::Serialize;

use crate::{
    AppState,
    cache::{FlashLevel, PendingRegistration, SessionUser},
    error::AppError,
    middleware::SessionHandle,
    routes::{flash_redirect, page, report::Report},
    utils::{generate_otp, hash_password},
};

use super::model::{Account, LoginForm, NewAccount, RegisterForm, VerifyOtpForm, VerifyOtpView};

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user: Account,
    pub reports: Vec<Report>,
}

#[axum::debug_handler]
pub async fn register_page(Extension(session): Extension<SessionHandle>) -> impl IntoResponse {
    page(&session, ()).await
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(e) = form.validate() {
        let message = e.to_string();
        return Ok(flash_redirect(&session, FlashLevel::Danger, message, "/register").await);
    }

    let email = form.email.trim().to_string();

    // 邮箱已注册时不发验证码
    if Account::find_by_email(&state.pool, &email).await?.is_some() {
        let message = "Email already exists!";
        return Ok(flash_redirect(&session, FlashLevel::Info, message, "/login").await);
    }

    let password_hash = hash_password(&form.password, state.config.bcrypt_cost)?;
    let code = generate_otp();

    // 没有真实的发送渠道，验证码只输出到服务端日志
    tracing::info!(email = %email, otp = %code, "One-time code issued");

    let pending = PendingRegistration {
        name: form.first_name.trim().to_string(),
        email,
        phone: form.phone.trim().to_string(),
        password_hash,
        join_date: Local::now().format("%B %Y").to_string(),
        code,
        issued_at: Utc::now().timestamp(),
        failed_attempts: 0,
    };

    let mut data = session.lock().await;
    data.pending = Some(pending);
    data.flash(FlashLevel::Info, "OTP sent! Check the server console.");

    Ok(Redirect::to("/verify_otp").into_response())
}

/// 取出未过期的待确认注册，过期时清除并提示重新注册
async fn live_pending(session: &SessionHandle, ttl_secs: u64) -> Option<PendingRegistration> {
    let mut data = session.lock().await;
    let pending = data.pending.clone()?;

    if pending.is_expired(ttl_secs, Utc::now().timestamp()) {
        data.pending = None;
        data.flash(FlashLevel::Warning, "OTP expired, please register again.");
        return None;
    }
    Some(pending)
}

#[axum::debug_handler]
pub async fn verify_otp_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response, AppError> {
    let ttl = state.config.otp_ttl_secs;
    let Some(pending) = live_pending(&session, ttl).await else {
        return Ok(Redirect::to("/register").into_response());
    };

    let view = VerifyOtpView {
        expires_in_secs: pending.expires_in(ttl, Utc::now().timestamp()),
        email: pending.email,
    };
    Ok(page(&session, view).await.into_response())
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<VerifyOtpForm>,
) -> Result<Response, AppError> {
    let Some(pending) = live_pending(&session, state.config.otp_ttl_secs).await else {
        return Ok(Redirect::to("/register").into_response());
    };

    if form.code() != pending.code {
        let mut data = session.lock().await;
        let Some(stored) = data.pending.as_mut() else {
            return Ok(Redirect::to("/register").into_response());
        };

        // 尝试次数用完后作废本次注册
        if stored.record_failure(state.config.otp_max_attempts) {
            tracing::warn!(email = %pending.email, "One-time code attempts exhausted");
            data.pending = None;
            data.flash(
                FlashLevel::Danger,
                "Too many invalid attempts, please register again.",
            );
            return Ok(Redirect::to("/register").into_response());
        }

        tracing::debug!(email = %pending.email, "One-time code mismatch");
        data.flash(FlashLevel::Danger, "Invalid OTP!");
        return Ok(Redirect::to("/verify_otp").into_response());
    }

    match Account::create(&state.pool, NewAccount::from(pending)).await {
        Ok(_) => {
            let mut data = session.lock().await;
            data.pending = None;
            data.flash(FlashLevel::Success, "Registered! Please Login.");
            Ok(Redirect::to("/login").into_response())
        }
        // 存储错误原样展示给用户，待确认注册保留以便重试
        Err(e) => {
            let message = format!("Error: {e}");
            Ok(flash_redirect(&session, FlashLevel::Danger, message, "/verify_otp").await)
        }
    }
}

#[axum::debug_handler]
pub async fn login_page(Extension(session): Extension<SessionHandle>) -> impl IntoResponse {
    page(&session, ()).await
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();

    match Account::verify_credentials(&state.pool, email, &form.password).await? {
        Some(account) => {
            session.lock().await.user = Some(SessionUser {
                email: account.email,
                name: account.name,
            });
            session.rotate_id();
            Ok(Redirect::to("/dashboard").into_response())
        }
        None => {
            tracing::warn!(email = %email, "Login failed");
            Ok(flash_redirect(&session, FlashLevel::Danger, "Invalid Credentials", "/login").await)
        }
    }
}

#[axum::debug_handler]
pub async fn logout(Extension(session): Extension<SessionHandle>) -> Redirect {
    session.lock().await.clear();
    Redirect::to("/")
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, AppError> {
    let Some(account) = Account::find_by_email(&state.pool, &user.email).await? else {
        // 会话中的账户已不存在
        let mut data = session.lock().await;
        data.user = None;
        data.flash(FlashLevel::Warning, "Please login first!");
        return Ok(Redirect::to("/login").into_response());
    };

    let reports = Report::list_by_account(&state.pool, &account.email).await?;

    let view = ProfileView {
        user: account,
        reports,
    };
    Ok(page(&session, view).await.into_response())
}
