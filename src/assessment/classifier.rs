use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// 血糖高于此值为高风险
pub const GLUCOSE_HIGH_ABOVE: f64 = 180.0;
/// 血糖不低于此值（且非高风险）为中风险
pub const GLUCOSE_MEDIUM_FROM: f64 = 140.0;
/// 症状数达到此值为高风险
pub const SYMPTOM_HIGH_SCORE: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter valid numbers!")]
    InvalidNumber,
    #[error("Passwords not matched!")]
    PasswordMismatch,
    #[error("{0} is required.")]
    Required(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskCategory {
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Medium => "Medium Risk",
            RiskCategory::High => "High Risk",
        }
    }

    /// 等级到颜色标签的唯一映射，评估记录与饮食查询都经过这里
    pub fn color(self) -> RiskColor {
        match self {
            RiskCategory::Low => RiskColor::Success,
            RiskCategory::Medium => RiskColor::Warning,
            RiskCategory::High => RiskColor::Danger,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    #[default]
    Success,
    Warning,
    Danger,
}

impl RiskColor {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskColor::Success => "success",
            RiskColor::Warning => "warning",
            RiskColor::Danger => "danger",
        }
    }

    /// 未知标签按低风险处理
    pub fn parse_or_default(tag: &str) -> Self {
        match tag.trim() {
            "danger" => RiskColor::Danger,
            "warning" => RiskColor::Warning,
            _ => RiskColor::Success,
        }
    }

    /// 反序列化已存储的标签，空值或未知值读作 `Success`
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map_or(RiskColor::Success, RiskColor::parse_or_default))
    }
}

impl fmt::Display for RiskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    Clinical,
    Symptom,
}

impl AssessmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::Clinical => "Clinical",
            AssessmentType::Symptom => "Symptom",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub category: RiskCategory,
    pub message: &'static str,
    pub kind: AssessmentType,
}

impl Assessment {
    pub fn color(&self) -> RiskColor {
        self.category.color()
    }
}

/// 解析表单中的血糖值，字段缺失时读作 0
pub fn parse_glucose(raw: Option<&str>) -> Result<f64, ValidationError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber)?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber);
    }
    Ok(value)
}

pub fn classify_glucose(value: f64) -> Assessment {
    let (category, message) = if value > GLUCOSE_HIGH_ABOVE {
        (RiskCategory::High, "Urgent medical checkup needed.")
    } else if value >= GLUCOSE_MEDIUM_FROM {
        (RiskCategory::Medium, "Monitor your diet.")
    } else {
        (RiskCategory::Low, "You are healthy.")
    };

    Assessment {
        category,
        message,
        kind: AssessmentType::Clinical,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymptomAnswers {
    pub polyuria: bool,
    pub polydipsia: bool,
    pub polyphagia: bool,
}

impl SymptomAnswers {
    /// 只有完全等于 "Yes" 的回答才计数
    pub fn from_form(
        polyuria: Option<&str>,
        polydipsia: Option<&str>,
        polyphagia: Option<&str>,
    ) -> Self {
        let yes = |answer: Option<&str>| answer == Some("Yes");
        Self {
            polyuria: yes(polyuria),
            polydipsia: yes(polydipsia),
            polyphagia: yes(polyphagia),
        }
    }

    pub fn score(&self) -> u8 {
        [self.polyuria, self.polydipsia, self.polyphagia]
            .into_iter()
            .filter(|answer| *answer)
            .count() as u8
    }
}

// 症状评估没有中风险等级
pub fn classify_symptoms(answers: &SymptomAnswers) -> Assessment {
    let (category, message) = if answers.score() >= SYMPTOM_HIGH_SCORE {
        (RiskCategory::High, "Multiple symptoms detected.")
    } else {
        (RiskCategory::Low, "Stable.")
    };

    Assessment {
        category,
        message,
        kind: AssessmentType::Symptom,
    }
}
