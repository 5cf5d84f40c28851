use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;

use crate::core::error::{AuthError, SessionError, SocialError, StorageError, UserError};

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    TooManyRequests(String),
    ServiceUnavailable(String),
    InternalError(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HttpError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            HttpError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        HttpError::Unauthorized(AuthError::Unauthorized.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            HttpError::BadRequest(msg)
            | HttpError::Unauthorized(msg)
            | HttpError::NotFound(msg)
            | HttpError::Conflict(msg)
            | HttpError::PayloadTooLarge(msg)
            | HttpError::UnsupportedMediaType(msg)
            | HttpError::TooManyRequests(msg)
            | HttpError::ServiceUnavailable(msg)
            | HttpError::InternalError(msg) => msg,
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for HttpError {
    fn from(err: StorageError) -> Self {
        error!("Storage failure: {}", err);
        HttpError::InternalError(err.to_string())
    }
}

impl From<UserError> for HttpError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidId(_) | UserError::Validation(_) => HttpError::BadRequest(err.to_string()),
            UserError::NotFound(msg) => HttpError::NotFound(msg),
            UserError::Duplicate { .. } => HttpError::Conflict(err.to_string()),
            UserError::Storage(e) => e.into(),
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyCredentials => HttpError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials | AuthError::Unauthorized => {
                HttpError::Unauthorized(err.to_string())
            }
            AuthError::MaxAttemptsExceeded(_) => HttpError::TooManyRequests(err.to_string()),
            AuthError::Hash(msg) => HttpError::InternalError(msg),
            AuthError::User(e) => e.into(),
        }
    }
}

impl From<SessionError> for HttpError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound(_) => HttpError::unauthorized(),
            SessionError::MaxSessionsExceeded => HttpError::ServiceUnavailable(err.to_string()),
            SessionError::Storage(e) => e.into(),
        }
    }
}

impl From<SocialError> for HttpError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::Storage(e) => e.into(),
            SocialError::User(e) => e.into(),
            SocialError::Auth(e) => e.into(),
            SocialError::Session(e) => e.into(),
        }
    }
}

/// 请求体读取失败：超出 `DefaultBodyLimit` 时为 413，其余为 400
impl From<BytesRejection> for HttpError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HttpError::PayloadTooLarge(rejection.body_text())
        } else {
            HttpError::BadRequest(rejection.body_text())
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(inner) => inner.into(),
            JsonRejection::MissingJsonContentType(_) => {
                HttpError::UnsupportedMediaType(rejection.body_text())
            }
            // 语法错误与缺失字段都按 400 处理
            _ => HttpError::BadRequest(rejection.body_text()),
        }
    }
}
