use axum::{extract::Request, middleware::Next, response::Response};
use log::{debug, info};
use std::time::Instant;

/// 记录每个请求的方法、路径、状态码和耗时
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let elapsed = started.elapsed();

    // 健康检查频繁，只在 debug 级别输出
    if path == "/health" {
        debug!("{} {} -> {} ({:?})", method, path, response.status(), elapsed);
    } else {
        info!("{} {} -> {} ({:?})", method, path, response.status(), elapsed);
    }

    response
}
