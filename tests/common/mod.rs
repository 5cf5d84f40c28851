//! 集成测试共享工具模块
//!
//! 构造内存存储的完整 HTTP 应用，并提供发送请求、读取 cookie 的辅助函数

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Request, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use socialgraph::api::server::{create_router, AppState, HttpServer};
use socialgraph::config::{Config, StorageConfig};
use socialgraph::storage::open_engine;

pub const PASSWORD: &str = "secret-password";

/// 测试配置：内存存储、最低 bcrypt 代价、独立的媒体目录
pub fn test_config(media_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage = StorageConfig::memory();
    config.session.secret = "integration-test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.auth.failed_login_attempts = 3;
    config.media.dir = media_dir.to_string_lossy().into_owned();
    config.log.stdout = false;
    config
}

/// 测试应用实例
///
/// 媒体目录在 `TestApp` 被 drop 时自动删除
pub struct TestApp {
    pub server: Arc<HttpServer>,
    pub router: Router,
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let media_dir = tempfile::tempdir().expect("创建临时目录失败");
        let mut config = test_config(media_dir.path());
        customize(&mut config);

        let engine = open_engine(&config.storage).expect("打开存储失败");
        let server = Arc::new(HttpServer::new(config, engine));
        let router = create_router(AppState::new(Arc::clone(&server)));
        Self {
            server,
            router,
            media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("请求执行失败")
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).expect("构造请求失败"))
            .await
    }

    /// 以指定 Content-Type 发送原始请求体
    pub async fn post_raw(&self, uri: &str, content_type: &str, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body.to_string()))
                .expect("构造请求失败"),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("构造请求失败"),
        )
        .await
    }

    /// 执行 GraphQL 请求，返回 (cookie, 响应 JSON)
    pub async fn graphql(&self, query: &str, cookie: Option<&str>) -> (Option<String>, Value) {
        let response = self
            .post_json("/graphql", json!({ "query": query }), cookie)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = set_cookie(&response);
        (set_cookie, body_json(response).await)
    }

    /// 注册用户，返回 (会话 cookie, 用户资料)
    pub async fn signup(&self, username: &str) -> (String, Value) {
        let response = self
            .post_json(
                "/auth/signup",
                json!({
                    "name": username.to_uppercase(),
                    "email": format!("{}@example.com", username),
                    "username": username,
                    "password": PASSWORD,
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = session_cookie(&response).expect("注册后应设置会话 cookie");
        (cookie, body_json(response).await)
    }
}

/// 响应中的第一个 Set-Cookie 头
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 从 Set-Cookie 头中取出 `name=value`，可直接作为 Cookie 请求头使用
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie(response)
        .and_then(|v| v.split(';').next().map(str::to_string))
        .filter(|pair| pair.starts_with("sid=") && pair.len() > "sid=".len())
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    serde_json::from_slice(&bytes).expect("响应体不是 JSON")
}
