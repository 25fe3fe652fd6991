use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::assessment::{Assessment, AssessmentType, DietPlan, RiskCategory, RiskColor};
use crate::cache::LastReport;

/// 评估记录，只追加不修改
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Report {
    pub id: i64,
    pub user_email: String,
    pub result: String,
    pub risk_color: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub report_type: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_email: String,
    pub category: RiskCategory,
    pub kind: AssessmentType,
    pub date: String,
}

impl NewReport {
    pub fn dated_today(user_email: &str, assessment: &Assessment) -> Self {
        Self {
            user_email: user_email.to_string(),
            category: assessment.category,
            kind: assessment.kind,
            date: Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClinicalForm {
    pub glucose: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SymptomForm {
    pub p_name: Option<String>,
    pub polyuria: Option<String>,
    pub polydipsia: Option<String>,
    pub polyphagia: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    #[serde(flatten)]
    pub report: LastReport,
}

#[derive(Debug, Serialize)]
pub struct FoodChartView {
    pub dos: &'static [&'static str],
    pub donts: &'static [&'static str],
    pub risk: RiskColor,
    pub name: String,
}

impl FoodChartView {
    pub fn for_report(report: &LastReport) -> Self {
        let plan = DietPlan::for_color(report.color);
        Self {
            dos: plan.dos,
            donts: plan.donts,
            risk: report.color,
            name: report.patient_name.clone(),
        }
    }
}

const REPORT_COLUMNS: &str = "id, COALESCE(user_email, '') AS user_email, \
     COALESCE(result, '') AS result, COALESCE(risk_color, '') AS risk_color, \
     COALESCE(type, '') AS type, COALESCE(date, '') AS date";

impl Report {
    pub async fn append(pool: &SqlitePool, new: NewReport) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO reports (user_email, result, risk_color, type, date) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {REPORT_COLUMNS}"
        );

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(&new.user_email)
            .bind(new.category.label())
            .bind(new.category.color().as_str())
            .bind(new.kind.as_str())
            .bind(&new.date)
            .fetch_one(pool)
            .await?;

        tracing::info!(
            id = report.id,
            email = %report.user_email,
            result = %report.result,
            kind = %report.report_type,
            "Appended report"
        );
        Ok(report)
    }

    /// 按创建顺序倒序
    pub async fn list_by_account(pool: &SqlitePool, email: &str) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_email = ?1 ORDER BY id DESC"
        );

        sqlx::query_as::<_, Report>(&sql)
            .bind(email)
            .fetch_all(pool)
            .await
    }
}
