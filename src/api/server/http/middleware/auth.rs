use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::server::http::{error::HttpError, state::AppState};

/// 要求请求带有效会话，并把当前用户放入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let jar = CookieJar::from_headers(request.headers());
    let (user, _session) = state
        .server
        .resolve_viewer(&jar)?
        .ok_or_else(HttpError::unauthorized)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
