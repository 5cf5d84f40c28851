//! HTTP 接口集成测试
//!
//! 测试范围:
//! - /auth 注册、登录、登出与会话 cookie
//! - /graphql 查询、好友变更、登录校验
//! - /upload 头像上传与 /images 静态文件
//! - /health 与通用响应头

mod common;

use axum::body::{to_bytes, Body};
use common::{body_json, session_cookie, set_cookie, TestApp, PASSWORD};
use http::{header, Request, StatusCode};
use serde_json::{json, Value};

const ACCESS_DENIED: &str = "Access denied! You need to be authorized to perform this action!";

fn upload_request(content_type: &str, body: Vec<u8>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("构造请求失败")
}

// ==================== 健康检查 ====================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    app.signup("alice").await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("socialgraph"));
    assert_eq!(body["users"], json!(1));
    assert_eq!(body["sessions"], json!(1));
}

#[tokio::test]
async fn test_cors_with_configured_origin() {
    let app = TestApp::with_config(|config| {
        config.server.allowed_origins = vec!["http://localhost:3000".to_string()];
    });

    // 预检请求
    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/graphql")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .expect("构造请求失败"),
        )
        .await;
    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    // 普通请求同样带上凭证头
    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .expect("构造请求失败"),
        )
        .await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    // 未列出的来源不会被放行
    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .expect("构造请求失败"),
        )
        .await;
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_security_headers() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}

// ==================== 注册与登录 ====================

#[tokio::test]
async fn test_signup_returns_profile_and_cookie() {
    let app = TestApp::new();
    let response = app
        .post_json(
            "/auth/signup",
            json!({
                "name": "Alice",
                "email": "alice@example.com",
                "username": "alice",
                "password": PASSWORD,
            }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let raw_cookie = set_cookie(&response).expect("应设置 cookie");
    assert!(raw_cookie.starts_with("sid="));
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("SameSite=Lax"));

    let body = body_json(response).await;
    assert_eq!(body["username"], json!("alice"));
    assert_eq!(body["profileUrl"], Value::Null);
    assert_eq!(body["friends"], json!([]));
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_validation_and_duplicates() {
    let app = TestApp::new();
    app.signup("alice").await;

    let duplicate = app
        .post_json(
            "/auth/signup",
            json!({"name": "A", "email": "other@example.com", "username": "ALICE", "password": PASSWORD}),
            None,
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let body = body_json(duplicate).await;
    assert_eq!(body["status"], json!(409));

    let short_password = app
        .post_json(
            "/auth/signup",
            json!({"name": "B", "email": "b@example.com", "username": "bob", "password": "123"}),
            None,
        )
        .await;
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);

    let bad_username = app
        .post_json(
            "/auth/signup",
            json!({"name": "C", "email": "c@example.com", "username": "c d", "password": PASSWORD}),
            None,
        )
        .await;
    assert_eq!(bad_username.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_rejects_markup_in_name() {
    let app = TestApp::new();
    let response = app
        .post_json(
            "/auth/signup",
            json!({
                "name": "<img src=x onerror=alert(1)>",
                "email": "mallory@example.com",
                "username": "mallory",
                "password": PASSWORD,
            }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!(400));
    assert!(app
        .server
        .get_user_store()
        .find_by_username("mallory")
        .expect("查询失败")
        .is_none());
}

#[tokio::test]
async fn test_malformed_bodies_use_json_errors() {
    let app = TestApp::new();

    // 缺少必填字段
    let response = app
        .post_json(
            "/auth/signup",
            json!({"name": "Alice", "email": "alice@example.com", "username": "alice"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].as_str().expect("error").contains("password"));

    // JSON 语法错误
    let response = app
        .post_raw("/auth/login", "application/json", r#"{"username": "alice","#)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], json!(400));

    // 非 JSON 的 Content-Type
    let response = app
        .post_raw("/auth/login", "text/plain", r#"{"username": "alice", "password": "x"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["status"], json!(415));
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let app = TestApp::new();
    app.signup("alice").await;

    let response = app
        .post_json(
            "/auth/login",
            json!({"username": "alice", "password": PASSWORD}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("登录后应设置 cookie");
    assert_eq!(body_json(response).await["username"], json!("alice"));

    let (_, value) = app.graphql("{ me { username } }", Some(&cookie)).await;
    assert_eq!(value["data"]["me"]["username"], json!("alice"));

    let response = app
        .post_json(
            "/auth/login",
            json!({"username": "alice", "password": "wrong-password"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_login_lockout() {
    let app = TestApp::new();
    app.signup("alice").await;

    let wrong = json!({"username": "alice", "password": "wrong-password"});
    for _ in 0..2 {
        let response = app.post_json("/auth/login", wrong.clone(), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app.post_json("/auth/login", wrong, None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // 锁定期间正确的密码也被拒绝
    let response = app
        .post_json(
            "/auth/login",
            json!({"username": "alice", "password": PASSWORD}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rest_logout() {
    let app = TestApp::new();
    let (cookie, _) = app.signup("alice").await;

    let response = app.post_json("/auth/logout", json!({}), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = set_cookie(&response).expect("应清除 cookie");
    assert!(cleared.starts_with("sid="));
    assert!(cleared.contains("Max-Age=0"));

    // 旧 cookie 不再有效
    let (_, value) = app.graphql("{ me { id } }", Some(&cookie)).await;
    assert_eq!(value["data"]["me"], Value::Null);

    // 没有会话时同样返回 204
    let response = app.post_json("/auth/logout", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ==================== GraphQL ====================

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let app = TestApp::new();
    let (cookie, _) = app.signup("alice").await;

    let (session_id, _) = cookie
        .trim_start_matches("sid=")
        .rsplit_once('.')
        .expect("cookie 应包含签名");
    let forged = format!("sid={}.AAAA", session_id);
    let (_, value) = app.graphql("{ me { id } }", Some(&forged)).await;
    assert_eq!(value["data"]["me"], Value::Null);

    let unsigned = format!("sid={}", session_id);
    let (_, value) = app.graphql("{ allFriends { id } }", Some(&unsigned)).await;
    assert_eq!(value["errors"][0]["message"], json!(ACCESS_DENIED));
    assert_eq!(value["errors"][0]["extensions"]["code"], json!("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_friend_flow_over_http() {
    let app = TestApp::new();
    let (alice_cookie, _) = app.signup("alice").await;
    let (bob_cookie, bob) = app.signup("bob").await;
    app.signup("carol").await;
    let bob_id = bob["id"].as_str().expect("id").to_string();

    let (_, value) = app
        .graphql(
            &format!(r#"mutation {{ addFriend(id: "{}") {{ username }} }}"#, bob_id),
            Some(&alice_cookie),
        )
        .await;
    assert_eq!(value["data"]["addFriend"]["username"], json!("bob"));

    // 双方都能看到对方
    let (_, value) = app
        .graphql("{ allFriends { username } NoFriends { username } }", Some(&bob_cookie))
        .await;
    assert_eq!(value["data"]["allFriends"], json!([{"username": "alice"}]));
    assert_eq!(value["data"]["NoFriends"], json!([{"username": "carol"}]));

    let (_, value) = app
        .graphql(
            &format!(r#"mutation {{ removeFriend(id: "{}") {{ username }} }}"#, bob_id),
            Some(&alice_cookie),
        )
        .await;
    assert_eq!(value["data"]["removeFriend"]["username"], json!("bob"));

    let (_, value) = app.graphql("{ allFriends { username } }", Some(&bob_cookie)).await;
    assert_eq!(value["data"]["allFriends"], json!([]));

    let (_, value) = app
        .graphql(r#"{ users { username } user(id: "nope") { id } }"#, None)
        .await;
    assert_eq!(value["data"]["users"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["data"]["user"], Value::Null);
}

#[tokio::test]
async fn test_graphql_logout_clears_cookie() {
    let app = TestApp::new();
    let (cookie, _) = app.signup("alice").await;

    let (set_cookie, value) = app.graphql("mutation { logout }", Some(&cookie)).await;
    assert_eq!(value["data"]["logout"], json!(true));
    let cleared = set_cookie.expect("应清除 cookie");
    assert!(cleared.contains("Max-Age=0"));

    let (_, value) = app.graphql("{ me { id } }", Some(&cookie)).await;
    assert_eq!(value["data"]["me"], Value::Null);
}

#[tokio::test]
async fn test_graphiql_page() {
    let app = TestApp::new();
    let response = app.get("/graphql").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.to_lowercase().contains("graphiql"));
}

// ==================== 前端静态文件 ====================

#[tokio::test]
async fn test_static_dir_falls_back_to_index() {
    let static_dir = tempfile::tempdir().expect("创建临时目录失败");
    std::fs::write(static_dir.path().join("index.html"), "<html>client</html>").expect("写入失败");
    std::fs::write(static_dir.path().join("app.js"), "console.log('app')").expect("写入失败");
    std::fs::write(static_dir.path().join("app.js.gz"), b"gzipped-app").expect("写入失败");

    let dir = static_dir.path().to_string_lossy().into_owned();
    let app = TestApp::with_config(move |config| config.server.static_dir = Some(dir));

    // 前端路由回退到 index.html
    let response = app.get("/friends/alice").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    assert_eq!(&bytes[..], b"<html>client</html>");

    let response = app.get("/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    assert_eq!(&bytes[..], b"console.log('app')");

    // 客户端接受 gzip 时返回预压缩文件
    let response = app
        .send(
            Request::builder()
                .uri("/app.js")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .expect("构造请求失败"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    assert_eq!(&bytes[..], b"gzipped-app");

    // API 路由不受回退影响
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);
}

// ==================== 上传 ====================

#[tokio::test]
async fn test_upload_requires_session() {
    let app = TestApp::new();
    let response = app
        .send(upload_request("image/png", b"fake-png".to_vec(), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!(ACCESS_DENIED));
    assert_eq!(body["status"], json!(401));
}

#[tokio::test]
async fn test_upload_rejects_bad_input() {
    let app = TestApp::new();
    let (cookie, _) = app.signup("alice").await;

    let response = app
        .send(upload_request("text/plain", b"hello".to_vec(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = app
        .send(upload_request("image/png", Vec::new(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::with_config(|config| config.media.max_upload_bytes = 16);
    let (cookie, _) = app.signup("alice").await;

    let response = app
        .send(upload_request("image/png", vec![0u8; 64], Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!(413));
    assert!(body["error"].is_string());

    // 未写入任何文件，头像保持为空
    let (_, value) = app.graphql("{ me { profileUrl } }", Some(&cookie)).await;
    assert_eq!(value["data"]["me"]["profileUrl"], Value::Null);
}

#[tokio::test]
async fn test_upload_sets_profile_url() {
    let app = TestApp::new();
    let (cookie, _) = app.signup("alice").await;
    let image = b"\x89PNG\r\n\x1a\nfake-image-data".to_vec();

    let response = app
        .send(upload_request("image/png", image.clone(), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let url = body["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("/images/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["user"]["profileUrl"], json!(url));

    let (_, value) = app.graphql("{ me { profileUrl } }", Some(&cookie)).await;
    assert_eq!(value["data"]["me"]["profileUrl"], json!(url));

    // 文件通过静态路由提供
    let response = app.get(&url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let served = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("读取响应体失败");
    assert_eq!(served.to_vec(), image);
}
