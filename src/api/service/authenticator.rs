use log::{info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AuthConfig;
use crate::core::error::{AuthError, AuthResult};
use crate::core::User;
use crate::storage::UserStore;

/// 认证 trait
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> AuthResult<User>;
}

/// 登录失败记录
#[derive(Debug, Clone)]
struct LoginAttempt {
    /// 剩余尝试次数
    remaining_attempts: u32,
    /// 锁定截止时间
    locked_until: Option<Instant>,
}

/// 生成 bcrypt 密码哈希
pub fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hash(e.to_string()))
}

/// 密码认证器 - 支持登录失败限制和账户锁定
pub struct PasswordAuthenticator {
    users: UserStore,
    config: AuthConfig,
    /// 用户登录尝试记录，键为小写用户名
    login_attempts: Arc<RwLock<HashMap<String, LoginAttempt>>>,
}

impl PasswordAuthenticator {
    pub fn new(users: UserStore, config: AuthConfig) -> Self {
        Self {
            users,
            config,
            login_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        hash_password(password, self.config.bcrypt_cost)
    }

    fn attempt_key(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// 账户仍处于锁定期时返回剩余秒数
    fn locked_for(&self, key: &str) -> Option<u64> {
        let attempts = self.login_attempts.read();
        let until = attempts.get(key)?.locked_until?;
        let now = Instant::now();
        (until > now).then(|| (until - now).as_secs().max(1))
    }

    /// 记录登录失败，达到上限时锁定账户
    fn record_failed_attempt(&self, key: &str) -> AuthError {
        // 如果未启用登录失败限制，直接返回
        if self.config.failed_login_attempts == 0 {
            return AuthError::InvalidCredentials;
        }

        let mut attempts = self.login_attempts.write();
        let attempt = attempts.entry(key.to_string()).or_insert(LoginAttempt {
            remaining_attempts: self.config.failed_login_attempts,
            locked_until: None,
        });

        attempt.remaining_attempts = attempt.remaining_attempts.saturating_sub(1);
        if attempt.remaining_attempts > 0 {
            return AuthError::InvalidCredentials;
        }

        warn!("Too many failed logins for '{}', locking for {}s", key, self.config.lockout_secs);
        attempt.locked_until = Some(Instant::now() + Duration::from_secs(self.config.lockout_secs));
        attempt.remaining_attempts = self.config.failed_login_attempts;
        AuthError::MaxAttemptsExceeded(self.config.lockout_secs)
    }

    /// 重置登录尝试记录（登录成功时调用）
    fn reset_attempts(&self, key: &str) {
        self.login_attempts.write().remove(key);
    }

    /// 验证用户密码
    fn verify_password(&self, user: &User, password: &str) -> AuthResult<bool> {
        match &user.password_hash {
            Some(hash) => bcrypt::verify(password, hash).map_err(|e| AuthError::Hash(e.to_string())),
            None => Ok(false),
        }
    }
}

impl Authenticator for PasswordAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::EmptyCredentials);
        }

        let key = Self::attempt_key(username);
        if let Some(secs) = self.locked_for(&key) {
            return Err(AuthError::MaxAttemptsExceeded(secs));
        }

        let verified = match self.users.find_by_username(username)? {
            Some(user) => {
                if self.verify_password(&user, password)? {
                    Some(user)
                } else {
                    None
                }
            }
            None => None,
        };

        match verified {
            Some(user) => {
                // 登录成功，重置尝试记录
                self.reset_attempts(&key);
                info!("User {} authenticated", user.username);
                Ok(user)
            }
            None => Err(self.record_failed_attempt(&key)),
        }
    }
}
