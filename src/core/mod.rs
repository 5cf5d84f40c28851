pub mod error;
pub mod id;
pub mod user;

// 错误和结果类型
pub use error::{
    AuthError, AuthResult, SessionError, SessionResult, SocialError, SocialResult, StorageError,
    StorageResult, UserError, UserResult,
};

// 核心数据类型
pub use id::UserId;
pub use user::{NewUser, User, UserProfile};
