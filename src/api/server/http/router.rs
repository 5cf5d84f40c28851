use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use std::path::Path;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{
    handlers::{auth, graphql, health, media},
    middleware::{auth::auth_middleware, error, logging},
    state::AppState,
};
use crate::config::Config;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn graphql_route(config: &Config) -> MethodRouter<AppState> {
    if config.graphql.playground {
        get(graphql::graphiql).post(graphql::execute)
    } else {
        get(graphql::execute).post(graphql::execute)
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.server.get_config().clone();

    let upload = Router::new()
        .route("/upload", post(media::upload))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(config.media.max_upload_bytes));

    let mut router = Router::new()
        .route(&config.graphql.path, graphql_route(&config))
        .route("/health", get(health::check))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .merge(upload)
        .nest_service(
            config.media.url_prefix.trim_end_matches('/'),
            ServeDir::new(&config.media.dir),
        );

    // 前端构建目录，未知路径回退到 index.html；客户端接受 gzip 时优先返回 .gz 文件
    if let Some(dir) = &config.server.static_dir {
        let index = ServeFile::new(Path::new(dir).join("index.html")).precompressed_gzip();
        router = router.fallback_service(
            ServeDir::new(dir)
                .precompressed_gzip()
                .fallback(index),
        );
    }

    router
        .layer(middleware::from_fn(logging::logging_middleware))
        .layer(middleware::from_fn(error::error_handling_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.allowed_origins))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .with_state(state)
}
