use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    assessment::{Assessment, SymptomAnswers, classify_glucose, classify_symptoms, parse_glucose},
    cache::{FlashLevel, LastReport, SessionUser},
    error::AppError,
    middleware::SessionHandle,
    routes::{flash_redirect, page},
};

use super::model::{ClinicalForm, FoodChartView, NewReport, Report, ResultView, SymptomForm};

/// 先写入评估记录，再替换会话中的最近结果
async fn record(
    state: &AppState,
    session: &SessionHandle,
    user: &SessionUser,
    patient_name: String,
    assessment: Assessment,
) -> Result<Response, AppError> {
    Report::append(&state.pool, NewReport::dated_today(&user.email, &assessment)).await?;
    session.lock().await.report = Some(LastReport::new(patient_name, &assessment));
    Ok(Redirect::to("/result").into_response())
}

#[axum::debug_handler]
pub async fn clinical_page(Extension(session): Extension<SessionHandle>) -> impl IntoResponse {
    page(&session, ()).await
}

#[axum::debug_handler]
pub async fn predict_clinical(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<ClinicalForm>,
) -> Result<Response, AppError> {
    let glucose = match parse_glucose(form.glucose.as_deref()) {
        Ok(value) => value,
        Err(e) => {
            let message = e.to_string();
            let to = "/predict_clinical";
            return Ok(flash_redirect(&session, FlashLevel::Warning, message, to).await);
        }
    };

    let assessment = classify_glucose(glucose);
    tracing::debug!(glucose, result = %assessment.category, "Clinical assessment");

    let patient_name = user.name.clone();
    record(&state, &session, &user, patient_name, assessment).await
}

#[axum::debug_handler]
pub async fn symptoms_page(Extension(session): Extension<SessionHandle>) -> impl IntoResponse {
    page(&session, ()).await
}

#[axum::debug_handler]
pub async fn predict_symptoms(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<SymptomForm>,
) -> Result<Response, AppError> {
    let answers = SymptomAnswers::from_form(
        form.polyuria.as_deref(),
        form.polydipsia.as_deref(),
        form.polyphagia.as_deref(),
    );
    let assessment = classify_symptoms(&answers);
    tracing::debug!(score = answers.score(), result = %assessment.category, "Symptom assessment");

    // 未填写患者姓名时使用当前用户
    let patient_name = form
        .p_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| user.name.clone());

    record(&state, &session, &user, patient_name, assessment).await
}

#[axum::debug_handler]
pub async fn show_result(Extension(session): Extension<SessionHandle>) -> Response {
    let report = session.lock().await.report.clone();
    match report {
        Some(report) => page(&session, ResultView { report }).await.into_response(),
        None => Redirect::to("/dashboard").into_response(),
    }
}

#[axum::debug_handler]
pub async fn food_chart(Extension(session): Extension<SessionHandle>) -> Response {
    let report = session.lock().await.report.clone();
    match report {
        Some(report) => page(&session, FoodChartView::for_report(&report)).await.into_response(),
        None => Redirect::to("/dashboard").into_response(),
    }
}
