use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, AssessmentType, RiskCategory, RiskColor};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// 一次性提示消息，下一次页面渲染时取出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// 已登录用户
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
}

/// 等待验证码确认的注册信息
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PendingRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub join_date: String,
    pub code: String,
    pub issued_at: i64, // Unix timestamp
    #[serde(default)]
    pub failed_attempts: u32,
}

impl PendingRegistration {
    pub fn is_expired(&self, ttl_secs: u64, now: i64) -> bool {
        now - self.issued_at >= ttl_secs as i64
    }

    pub fn expires_in(&self, ttl_secs: u64, now: i64) -> i64 {
        (self.issued_at + ttl_secs as i64 - now).max(0)
    }

    /// 记录一次错误验证码，返回是否已用完尝试次数
    pub fn record_failure(&mut self, max_attempts: u32) -> bool {
        self.failed_attempts += 1;
        self.failed_attempts >= max_attempts
    }
}

/// 最近一次评估结果，供结果页和饮食建议页使用
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LastReport {
    pub patient_name: String,
    pub result: RiskCategory,
    #[serde(default, deserialize_with = "RiskColor::deserialize_lenient")]
    pub color: RiskColor,
    pub message: String,
    pub assessment_type: AssessmentType,
}

impl LastReport {
    pub fn new(patient_name: String, assessment: &Assessment) -> Self {
        Self {
            patient_name,
            result: assessment.category,
            color: assessment.color(),
            message: assessment.message.to_string(),
            assessment_type: assessment.kind,
        }
    }
}

/// 会话缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SessionData {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub pending: Option<PendingRegistration>,
    #[serde(default)]
    pub report: Option<LastReport>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.pending.is_none()
            && self.report.is_none()
            && self.flashes.is_empty()
    }

    pub fn clear(&mut self) {
        *self = SessionData::default();
    }
}
