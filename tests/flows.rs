mod common;

use axum::http::StatusCode;
use common::TestApp;
use glycoguard::{cache::SessionCacheOperations, config::Config};

const REGISTER_FORM: &str =
    "first_name=Asha&email=a@x.com&phone=555-0100&password=pw1&confirm_password=pw1";

fn wrong_code(code: &str) -> &'static str {
    if code == "1000" { "1001" } else { "1000" }
}

#[tokio::test]
async fn home_is_public() {
    let mut app = TestApp::new().await;
    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["code"], 0);
    assert_eq!(response.body["resp_data"]["authenticated"], false);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let mut app = TestApp::new().await;
    let response = app.get("/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn password_mismatch_issues_no_code() {
    let mut app = TestApp::new().await;
    let response = app
        .post_form(
            "/register",
            "first_name=Asha&email=a@x.com&password=pw1&confirm_password=pw2",
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/register"));
    assert_eq!(app.pending_otp().await, None);
    assert_eq!(app.account_count().await, 0);

    let page = app.get("/register").await;
    assert_eq!(page.flash_messages(), vec!["Passwords not matched!"]);
}

#[tokio::test]
async fn full_registration_and_clinical_assessment() {
    let mut app = TestApp::new().await;

    let response = app.post_form("/register", REGISTER_FORM).await;
    assert_eq!(response.location(), Some("/verify_otp"));

    let code = app.pending_otp().await.expect("otp issued");
    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(app.account_count().await, 0);

    let page = app.get("/verify_otp").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["resp_data"]["email"], "a@x.com");

    let response = app.post_form("/verify_otp", &format!("otp={code}")).await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.account_count().await, 1);

    let response = app.login("a@x.com", "pw1").await;
    assert_eq!(response.location(), Some("/dashboard"));

    let dashboard = app.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["resp_data"]["name"], "Asha");

    let response = app.post_form("/predict_clinical", "glucose=200").await;
    assert_eq!(response.location(), Some("/result"));

    let result = app.get("/result").await;
    let data = &result.body["resp_data"];
    assert_eq!(data["result"], "High Risk");
    assert_eq!(data["color"], "danger");
    assert_eq!(data["message"], "Urgent medical checkup needed.");
    assert_eq!(data["assessment_type"], "Clinical");
    assert_eq!(data["patient_name"], "Asha");

    app.post_form("/predict_clinical", "glucose=90").await;

    let profile = app.get("/profile").await;
    let data = &profile.body["resp_data"];
    assert_eq!(data["user"]["email"], "a@x.com");
    assert!(data["user"].get("password_hash").is_none());

    let reports = data["reports"].as_array().expect("report list");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["result"], "Low Risk");
    assert_eq!(reports[1]["result"], "High Risk");
    assert_eq!(reports[1]["risk_color"], "danger");
    assert_eq!(reports[1]["type"], "Clinical");
}

#[tokio::test]
async fn otp_digits_can_be_sent_separately() {
    let mut app = TestApp::new().await;
    app.post_form("/register", REGISTER_FORM).await;

    let code: Vec<char> = app.pending_otp().await.expect("otp issued").chars().collect();
    let form = format!(
        "otp1={}&otp2={}&otp3={}&otp4={}",
        code[0], code[1], code[2], code[3]
    );
    let response = app.post_form("/verify_otp", &form).await;

    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.account_count().await, 1);
}

#[tokio::test]
async fn wrong_code_keeps_pending_registration() {
    let mut app = TestApp::new().await;
    app.post_form("/register", REGISTER_FORM).await;
    app.get("/verify_otp").await;
    let code = app.pending_otp().await.expect("otp issued");
    let wrong = wrong_code(&code);

    let response = app.post_form("/verify_otp", &format!("otp={wrong}")).await;
    assert_eq!(response.location(), Some("/verify_otp"));
    assert_eq!(app.account_count().await, 0);
    assert_eq!(app.pending_otp().await.as_deref(), Some(code.as_str()));
    assert_eq!(app.pending_failed_attempts().await, Some(1));

    let page = app.get("/verify_otp").await;
    assert_eq!(page.flash_messages(), vec!["Invalid OTP!"]);

    let response = app.post_form("/verify_otp", &format!("otp={code}")).await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.account_count().await, 1);
}

#[tokio::test]
async fn exhausted_attempts_discard_registration() {
    let config = Config {
        otp_max_attempts: 3,
        ..common::test_config()
    };
    let mut app = TestApp::with_config(config).await;
    app.post_form("/register", REGISTER_FORM).await;
    app.get("/verify_otp").await;
    let code = app.pending_otp().await.expect("otp issued");
    let wrong = wrong_code(&code);

    for _ in 0..2 {
        let response = app.post_form("/verify_otp", &format!("otp={wrong}")).await;
        assert_eq!(response.location(), Some("/verify_otp"));
    }
    let response = app.post_form("/verify_otp", &format!("otp={wrong}")).await;
    assert_eq!(response.location(), Some("/register"));
    assert_eq!(app.pending_otp().await, None);

    // 正确的验证码也不再有效
    let response = app.post_form("/verify_otp", &format!("otp={code}")).await;
    assert_eq!(response.location(), Some("/register"));
    assert_eq!(app.account_count().await, 0);

    let page = app.get("/register").await;
    assert!(
        page.flash_messages()
            .contains(&"Too many invalid attempts, please register again.".to_string())
    );
}

#[tokio::test]
async fn expired_code_discards_registration() {
    let config = Config {
        otp_ttl_secs: 0,
        ..common::test_config()
    };
    let mut app = TestApp::with_config(config).await;
    app.post_form("/register", REGISTER_FORM).await;
    let code = app.pending_otp().await.expect("otp issued");

    let response = app.post_form("/verify_otp", &format!("otp={code}")).await;
    assert_eq!(response.location(), Some("/register"));
    assert_eq!(app.account_count().await, 0);
    assert_eq!(app.pending_otp().await, None);

    let page = app.get("/register").await;
    assert!(
        page.flash_messages()
            .contains(&"OTP expired, please register again.".to_string())
    );
}

#[tokio::test]
async fn store_error_on_confirmation_is_shown_and_pending_kept() {
    let mut app = TestApp::new().await;
    app.post_form("/register", REGISTER_FORM).await;
    app.get("/verify_otp").await;
    let code = app.pending_otp().await.expect("otp issued");

    // 发出验证码后同一邮箱被抢先注册
    sqlx::query("INSERT INTO users (name, email, password) VALUES ('Other', 'a@x.com', 'x')")
        .execute(&app.state.pool)
        .await
        .unwrap();

    let response = app.post_form("/verify_otp", &format!("otp={code}")).await;
    assert_eq!(response.location(), Some("/verify_otp"));
    assert_eq!(app.account_count().await, 1);
    assert_eq!(app.pending_otp().await.as_deref(), Some(code.as_str()));

    let page = app.get("/verify_otp").await;
    assert_eq!(page.flash_messages(), vec!["Error: Email already exists!"]);
}

#[tokio::test]
async fn verify_without_pending_registration_goes_back_to_register() {
    let mut app = TestApp::new().await;
    let response = app.post_form("/verify_otp", "otp=1234").await;
    assert_eq!(response.location(), Some("/register"));
    assert_eq!(app.get("/verify_otp").await.location(), Some("/register"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_before_code_is_issued() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;

    app.forget_session();
    let response = app.post_form("/register", REGISTER_FORM).await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.pending_otp().await, None);

    let page = app.get("/login").await;
    assert_eq!(page.flash_messages(), vec!["Email already exists!"]);
    assert_eq!(app.account_count().await, 1);
}

#[tokio::test]
async fn invalid_credentials_are_indistinguishable() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;

    let wrong_password = app.login("a@x.com", "nope").await;
    assert_eq!(wrong_password.location(), Some("/login"));
    let first = app.get("/login").await.flash_messages();

    let unknown_email = app.login("b@x.com", "pw1").await;
    assert_eq!(unknown_email.location(), Some("/login"));
    let second = app.get("/login").await.flash_messages();

    assert_eq!(first, vec!["Invalid Credentials"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn login_issues_a_fresh_session_id() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;

    // 匿名访问受保护页面会留下提示消息，从而产生会话
    app.get("/dashboard").await;
    let before = app.session_id().map(str::to_string).expect("anonymous session");

    app.login("a@x.com", "pw1").await;
    let after = app.session_id().map(str::to_string).expect("authenticated session");
    assert_ne!(before, after);

    let old = SessionCacheOperations::load(&app.state.cache, &before).await.unwrap();
    assert!(old.is_none());
    assert_eq!(app.get("/dashboard").await.status, StatusCode::OK);
}

#[tokio::test]
async fn gated_routes_redirect_anonymous_users() {
    let mut app = TestApp::new().await;
    for path in [
        "/dashboard",
        "/predict_clinical",
        "/predict_symptoms",
        "/result",
        "/food_chart",
        "/profile",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "path {path}");
        assert_eq!(response.location(), Some("/login"), "path {path}");
    }

    let response = app.post_form("/predict_clinical", "glucose=200").await;
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(app.report_count().await, 0);

    let page = app.get("/login").await;
    assert!(page.flash_messages().contains(&"Please login first!".to_string()));
}

#[tokio::test]
async fn symptom_assessment_reports_high_risk() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;
    app.login("a@x.com", "pw1").await;

    let response = app
        .post_form(
            "/predict_symptoms",
            "p_name=Ravi&polyuria=Yes&polydipsia=Yes&polyphagia=No",
        )
        .await;
    assert_eq!(response.location(), Some("/result"));

    let result = app.get("/result").await;
    let data = &result.body["resp_data"];
    assert_eq!(data["result"], "High Risk");
    assert_eq!(data["message"], "Multiple symptoms detected.");
    assert_eq!(data["assessment_type"], "Symptom");
    assert_eq!(data["patient_name"], "Ravi");

    let profile = app.get("/profile").await;
    assert_eq!(profile.body["resp_data"]["reports"][0]["type"], "Symptom");
}

#[tokio::test]
async fn symptom_patient_name_defaults_to_user() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;
    app.login("a@x.com", "pw1").await;

    app.post_form("/predict_symptoms", "polyuria=Yes").await;
    let result = app.get("/result").await;
    assert_eq!(result.body["resp_data"]["result"], "Low Risk");
    assert_eq!(result.body["resp_data"]["message"], "Stable.");
    assert_eq!(result.body["resp_data"]["patient_name"], "Asha");
}

#[tokio::test]
async fn non_numeric_glucose_persists_nothing() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;
    app.login("a@x.com", "pw1").await;

    let response = app.post_form("/predict_clinical", "glucose=lots").await;
    assert_eq!(response.location(), Some("/predict_clinical"));
    assert_eq!(app.report_count().await, 0);

    let page = app.get("/predict_clinical").await;
    assert_eq!(page.flash_messages(), vec!["Enter valid numbers!"]);

    // 没有评估结果时结果页回到控制台
    assert_eq!(app.get("/result").await.location(), Some("/dashboard"));
    assert_eq!(app.get("/food_chart").await.location(), Some("/dashboard"));
}

#[tokio::test]
async fn food_chart_follows_latest_result() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;
    app.login("a@x.com", "pw1").await;

    app.post_form("/predict_clinical", "glucose=150").await;
    let chart = app.get("/food_chart").await;
    let data = &chart.body["resp_data"];
    assert_eq!(data["risk"], "warning");
    assert_eq!(data["name"], "Asha");
    assert_eq!(data["dos"][0], "Brown Rice / Millets (Korralu)");
    assert_eq!(data["donts"].as_array().map(Vec::len), Some(9));

    app.post_form("/predict_clinical", "glucose=200").await;
    let chart = app.get("/food_chart").await;
    assert_eq!(chart.body["resp_data"]["risk"], "danger");
    assert_eq!(chart.body["resp_data"]["dos"][0], "Bitter Gourd (Kakarakaya)");
}

#[tokio::test]
async fn logout_clears_the_session() {
    let mut app = TestApp::new().await;
    app.register("Asha", "a@x.com", "pw1").await;
    app.login("a@x.com", "pw1").await;
    app.post_form("/predict_clinical", "glucose=200").await;
    let sid = app.session_id().map(str::to_string).expect("session issued");

    let response = app.get("/logout").await;
    assert_eq!(response.location(), Some("/"));
    assert_eq!(app.session_id(), None);

    let stored = SessionCacheOperations::load(&app.state.cache, &sid)
        .await
        .unwrap();
    assert!(stored.is_none());

    assert_eq!(app.get("/dashboard").await.location(), Some("/login"));
}

#[tokio::test]
async fn requests_over_the_limit_are_rejected() {
    let config = Config {
        rate_limit_requests: 2,
        ..common::test_config()
    };
    let mut app = TestApp::with_config(config).await;

    assert_eq!(app.get("/").await.status, StatusCode::OK);
    assert_eq!(app.get("/").await.status, StatusCode::OK);

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["code"], 1005);
}

#[tokio::test]
async fn forwarded_headers_do_not_reset_the_limit() {
    let config = Config {
        rate_limit_requests: 2,
        ..common::test_config()
    };
    let mut app = TestApp::with_config(config).await;

    for ip in ["10.0.0.1", "10.0.0.2"] {
        let response = app.get_with_headers("/", &[("x-real-ip", ip)]).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let response = app.get_with_headers("/", &[("x-forwarded-for", "10.0.0.3")]).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}
