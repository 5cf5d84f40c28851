//! 头像上传
//!
//! 请求体为原始图片数据，文件写入媒体目录后通过 `/images` 静态路由提供

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::Json,
};
use log::info;
use serde::Serialize;
use std::path::Path;

use crate::api::server::http::{error::HttpError, state::AppState};
use crate::core::{User, UserProfile};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub user: UserProfile,
}

/// 支持的图片类型及对应扩展名
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), HttpError> {
    let media = &state.server.get_config().media;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let extension = image_extension(content_type).ok_or_else(|| {
        HttpError::UnsupportedMediaType(format!("unsupported content type '{}'", content_type))
    })?;

    // 大小上限由路由上的 DefaultBodyLimit 保证
    let body = body?;
    if body.is_empty() {
        return Err(HttpError::BadRequest("empty upload".to_string()));
    }

    let file_name = format!("{}-{}.{}", user.id, uuid::Uuid::new_v4().simple(), extension);
    tokio::fs::create_dir_all(&media.dir)
        .await
        .map_err(|e| HttpError::InternalError(format!("无法创建媒体目录: {}", e)))?;
    tokio::fs::write(Path::new(&media.dir).join(&file_name), &body)
        .await
        .map_err(|e| HttpError::InternalError(format!("无法写入文件: {}", e)))?;

    let url = format!("{}/{}", media.url_prefix.trim_end_matches('/'), file_name);
    let user = state
        .server
        .get_user_store()
        .set_profile_url(&user.id, Some(url.clone()))?;

    info!("User {} uploaded {} ({} bytes)", user.username, file_name, body.len());
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            user: user.profile(),
        }),
    ))
}
