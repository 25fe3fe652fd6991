use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use glycoguard::{
    AppState,
    cache::{CacheBackend, SessionCacheOperations},
    config::Config,
    database::{connect_in_memory, run_migrations},
    middleware::SESSION_COOKIE,
    router::create_router,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// 页面数据中的提示消息文本
    pub fn flash_messages(&self) -> Vec<String> {
        self.body["resp_data"]["flashes"]
            .as_array()
            .map(|flashes| {
                flashes
                    .iter()
                    .filter_map(|flash| flash["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        rate_limit_requests: 10_000,
        ..Config::default()
    }
}

/// 模拟浏览器：保存会话 cookie，依次发送请求
pub struct TestApp {
    pub state: AppState,
    router: Router,
    session_id: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let pool = connect_in_memory().await.expect("open in-memory database");
        run_migrations(&pool).await.expect("migrate database");

        let state = AppState {
            pool,
            config,
            cache: CacheBackend::memory(),
        };

        Self {
            router: create_router(state.clone()),
            state,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn forget_session(&mut self) {
        self.session_id = None;
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.get_with_headers(path, &[]).await
    }

    pub async fn get_with_headers(&mut self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = self.request("GET", path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("build request");
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("build request");
        self.send(request).await
    }

    /// 当前会话中待确认注册的验证码
    pub async fn pending_otp(&self) -> Option<String> {
        let sid = self.session_id.as_deref()?;
        SessionCacheOperations::load(&self.state.cache, sid)
            .await
            .expect("load session")
            .and_then(|data| data.pending)
            .map(|pending| pending.code)
    }

    pub async fn account_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.state.pool)
            .await
            .expect("count users")
    }

    pub async fn pending_failed_attempts(&self) -> Option<u32> {
        let sid = self.session_id.as_deref()?;
        SessionCacheOperations::load(&self.state.cache, sid)
            .await
            .expect("load session")
            .and_then(|data| data.pending)
            .map(|pending| pending.failed_attempts)
    }

    pub async fn report_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.state.pool)
            .await
            .expect("count reports")
    }

    /// 注册并完成验证码确认，随后打开登录页取走提示消息
    pub async fn register(&mut self, name: &str, email: &str, password: &str) {
        let form = format!(
            "first_name={name}&email={email}&phone=555-0100\
             &password={password}&confirm_password={password}"
        );
        let response = self.post_form("/register", &form).await;
        assert_eq!(response.location(), Some("/verify_otp"));

        let code = self.pending_otp().await.expect("otp issued");
        let response = self.post_form("/verify_otp", &format!("otp={code}")).await;
        assert_eq!(response.location(), Some("/login"));
        self.get("/login").await;
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &format!("email={email}&password={password}"))
            .await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.session_id {
            Some(sid) => builder.header(header::COOKIE, format!("{SESSION_COOKIE}={sid}")),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if let Some((name, sid)) = pair.split_once('=') {
                if name.trim() == SESSION_COOKIE {
                    self.session_id = Some(sid.trim().to_string()).filter(|sid| !sid.is_empty());
                }
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
