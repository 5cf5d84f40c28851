//! 存储和认证错误到 GraphQL 错误的映射
//!
//! 客户端只能看到错误消息和一个粗粒度的 `code` 扩展字段

use async_graphql::{Error, ErrorExtensions};

use crate::core::error::{AuthError, SessionError, UserError};

pub const CODE_UNAUTHENTICATED: &str = "UNAUTHENTICATED";
pub const CODE_BAD_USER_INPUT: &str = "BAD_USER_INPUT";
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_INTERNAL: &str = "INTERNAL_SERVER_ERROR";

fn coded(message: impl Into<String>, code: &'static str) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}

pub fn not_found() -> Error {
    coded("Not Found", CODE_NOT_FOUND)
}

pub fn unauthenticated() -> Error {
    AuthError::Unauthorized.extend()
}

impl ErrorExtensions for UserError {
    fn extend(&self) -> Error {
        let code = match self {
            UserError::InvalidId(_) | UserError::Duplicate { .. } | UserError::Validation(_) => {
                CODE_BAD_USER_INPUT
            }
            UserError::NotFound(_) => CODE_NOT_FOUND,
            UserError::Storage(_) => CODE_INTERNAL,
        };
        coded(self.to_string(), code)
    }
}

impl ErrorExtensions for AuthError {
    fn extend(&self) -> Error {
        match self {
            AuthError::User(e) => e.extend(),
            AuthError::Hash(_) => coded(self.to_string(), CODE_INTERNAL),
            _ => coded(self.to_string(), CODE_UNAUTHENTICATED),
        }
    }
}

impl ErrorExtensions for SessionError {
    fn extend(&self) -> Error {
        coded(self.to_string(), CODE_INTERNAL)
    }
}
