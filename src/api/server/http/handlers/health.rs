use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::api::server::http::{error::HttpError, state::AppState};

pub async fn check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), HttpError> {
    let users = state.server.get_user_store().count()?;
    let sessions = state.server.get_session_manager().session_count()?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "socialgraph",
            "version": env!("CARGO_PKG_VERSION"),
            "users": users,
            "sessions": sessions,
        })),
    ))
}
