use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Json as JsonResponse,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task;

use crate::api::server::http::{error::HttpError, server::HttpServer, state::AppState};
use crate::api::service::Authenticator;
use crate::core::user::validate_password;
use crate::core::{NewUser, User, UserProfile};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 丢弃请求里已有的会话，再为 `user` 创建新会话并写入 cookie
fn start_session(server: &HttpServer, jar: CookieJar, user: &User) -> Result<CookieJar, HttpError> {
    if let Some(old) = server.session_cookie().session_id(&jar) {
        if let Err(e) = server.get_session_manager().remove_session(&old) {
            warn!("Failed to drop previous session: {}", e);
        }
    }
    let session = server.get_session_manager().create_session(user.id)?;
    Ok(server.session_cookie().set(jar, &session.id))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SignupRequest>, HttpError>,
) -> Result<(StatusCode, CookieJar, JsonResponse<UserProfile>), HttpError> {
    validate_password(&request.password)?;
    let new_user = NewUser::new(request.name, request.email, request.username).normalized()?;

    // bcrypt 是 CPU 密集操作，放到阻塞线程池
    let server = Arc::clone(&state.server);
    let password = request.password;
    let hash = task::spawn_blocking(move || server.get_auth_service().hash_password(&password))
        .await
        .map_err(|e| HttpError::InternalError(format!("任务执行失败: {}", e)))??;

    let user = state.server.get_user_store().create_user(new_user, Some(hash))?;
    let jar = start_session(&state.server, jar, &user)?;

    info!("User {} signed up", user.username);
    Ok((StatusCode::CREATED, jar, JsonResponse(user.profile())))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, HttpError>,
) -> Result<(CookieJar, JsonResponse<UserProfile>), HttpError> {
    let server = Arc::clone(&state.server);
    let user = task::spawn_blocking(move || {
        server
            .get_auth_service()
            .authenticate(&request.username, &request.password)
    })
    .await
    .map_err(|e| HttpError::InternalError(format!("任务执行失败: {}", e)))??;

    let jar = start_session(&state.server, jar, &user)?;
    Ok((jar, JsonResponse(user.profile())))
}

/// 没有会话时也返回 204
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), HttpError> {
    let cookie = state.server.session_cookie();
    if let Some(session_id) = cookie.session_id(&jar) {
        state.server.get_session_manager().remove_session(&session_id)?;
    }
    Ok((StatusCode::NO_CONTENT, cookie.clear(jar)))
}
