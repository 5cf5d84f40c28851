use axum::{extract::Request, middleware::Next, response::Response};
use log::{error, warn};

/// 服务端错误按 error 级别记录，认证失败按 warn 记录
pub async fn error_handling_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        error!("{} {} returned {}", method, path, status);
    } else if status.as_u16() == 401 || status.as_u16() == 429 {
        warn!("{} {} rejected with {}", method, path, status);
    }

    response
}
