//! 统一错误处理系统 for SocialGraph
//!
//! ## 设计理念
//!
//! 1. **按层划分**：存储、用户、认证、会话各自一个枚举，调用方只看到本层关心的错误
//! 2. **分层转换**：下层错误通过 `#[from]` 自动转换为上层错误，保留完整信息
//! 3. **统一接口**：`SocialResult<T>` 提供统一的返回类型，简化错误传播

use thiserror::Error;

/// 统一的服务错误类型
#[derive(Error, Debug)]
pub enum SocialError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    User(#[from] UserError),

    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
}

/// 统一的结果类型
pub type SocialResult<T> = Result<T, SocialError>;

/// 存储层错误类型
///
/// 涵盖底层键值引擎和文档编解码相关的错误
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    DbError(String),
    #[error("序列化错误: {0}")]
    SerializationError(String),
    #[error("反序列化错误: {0}")]
    DeserializationError(String),
}

impl StorageError {
    pub fn encode(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }

    pub fn decode(err: serde_json::Error) -> Self {
        StorageError::DeserializationError(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// 用户文档操作错误
#[derive(Error, Debug, Clone)]
pub enum UserError {
    /// The given string is not a well-formed user id
    #[error("invalid user id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{field} '{value}' is already taken")]
    Duplicate { field: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type UserResult<T> = Result<T, UserError>;

/// 认证相关错误
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("用户名和密码不能为空")]
    EmptyCredentials,

    #[error("用户名或密码错误")]
    InvalidCredentials,

    #[error("登录失败次数已达到最大尝试次数，请 {0} 秒后重试")]
    MaxAttemptsExceeded(u64),

    #[error("Access denied! You need to be authorized to perform this action!")]
    Unauthorized,

    #[error("密码哈希失败: {0}")]
    Hash(String),

    #[error(transparent)]
    User(#[from] UserError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// 会话相关错误
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("会话不存在: {0}")]
    SessionNotFound(String),

    #[error("超过最大会话数限制")]
    MaxSessionsExceeded,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type SessionResult<T> = Result<T, SessionError>;
