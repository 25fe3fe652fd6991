use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;

use crate::assessment::ValidationError;
use crate::cache::PendingRegistration;
use crate::utils::verify_password;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already exists!")]
    DuplicateEmail,

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub join_date: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub join_date: String,
}

impl From<PendingRegistration> for NewAccount {
    fn from(pending: PendingRegistration) -> Self {
        Self {
            name: pending.name,
            email: pending.email,
            phone: pending.phone,
            password_hash: pending.password_hash,
            join_date: pending.join_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("Email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok(())
    }
}

/// 验证码可以整体提交（otp），也可以按位提交（otp1..otp4）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOtpForm {
    pub otp: Option<String>,
    pub otp1: Option<String>,
    pub otp2: Option<String>,
    pub otp3: Option<String>,
    pub otp4: Option<String>,
}

impl VerifyOtpForm {
    pub fn code(&self) -> String {
        match self.otp.as_deref().map(str::trim) {
            Some(otp) if !otp.is_empty() => otp.to_string(),
            _ => [&self.otp1, &self.otp2, &self.otp3, &self.otp4]
                .into_iter()
                .map(|digit| digit.as_deref().unwrap_or("").trim())
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpView {
    pub email: String,
    pub expires_in_secs: i64,
}

// 旧版本的库中文本列可能为 NULL
const ACCOUNT_COLUMNS: &str = "id, COALESCE(name, '') AS name, email, \
     COALESCE(phone, '') AS phone, COALESCE(password, '') AS password, \
     COALESCE(join_date, '') AS join_date";

impl Account {
    pub async fn create(pool: &SqlitePool, new: NewAccount) -> Result<Self, AccountError> {
        let sql = format!(
            "INSERT INTO users (name, email, phone, password, join_date) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {ACCOUNT_COLUMNS}"
        );

        let result = sqlx::query_as::<_, Account>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.password_hash)
            .bind(&new.join_date)
            .fetch_one(pool)
            .await;

        match result {
            Ok(account) => {
                tracing::info!(id = account.id, email = %account.email, "Created account");
                Ok(account)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::debug!(email = %new.email, "Account already exists");
                Err(AccountError::DuplicateEmail)
            }
            Err(e) => {
                tracing::error!("Failed to create account: {:?}", e);
                Err(e.into())
            }
        }
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = ?1");

        sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// 未知邮箱与密码错误都返回 None
    pub async fn verify_credentials(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, AccountError> {
        let Some(account) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        match verify_password(password, &account.password_hash) {
            Ok(true) => Ok(Some(account)),
            Ok(false) => Ok(None),
            Err(e) => {
                // 非 bcrypt 格式的旧数据不允许登录
                tracing::warn!(
                    email = %account.email,
                    "Stored password is not a valid hash: {}",
                    e
                );
                Ok(None)
            }
        }
    }
}
