//! 用户文档模型
//!
//! `User` 是持久化的完整文档（包含密码哈希），`UserProfile` 是对外暴露的视图

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::error::{UserError, UserResult};
use super::id::UserId;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    /// 好友ID集合，保持插入顺序且不重复
    #[serde(default)]
    pub friends: Vec<UserId>,
    #[serde(default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(new_user: NewUser, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            name: new_user.name,
            email: new_user.email,
            username: new_user.username,
            profile_url: new_user.profile_url,
            friends: Vec::new(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds `friend` to the set. Returns false if it was already present.
    pub fn add_friend(&mut self, friend: UserId) -> bool {
        if self.friends.contains(&friend) {
            return false;
        }
        self.friends.push(friend);
        self.updated_at = Utc::now();
        true
    }

    /// Removes every occurrence of `friend`. Returns false if nothing changed.
    pub fn remove_friend(&mut self, friend: &UserId) -> bool {
        let before = self.friends.len();
        self.friends.retain(|id| id != friend);
        let changed = self.friends.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn is_friend(&self, other: &UserId) -> bool {
        self.friends.contains(other)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// 注册用户时的输入
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub profile_url: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            username: username.into(),
            profile_url: None,
        }
    }

    /// Trims the fields and checks their shape.
    ///
    /// 显示名中不允许出现 HTML 标记字符，用户名和邮箱由正则限制
    pub fn normalized(self) -> UserResult<Self> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let username = self.username.trim().to_string();

        if name.is_empty() {
            return Err(UserError::Validation("name must not be empty".to_string()));
        }
        if name.contains(MARKUP_CHARS) {
            return Err(UserError::Validation("name must not contain '<' or '>'".to_string()));
        }
        if !username_regex().is_match(&username) {
            return Err(UserError::Validation(
                "username must be 3-32 characters of letters, digits, '_', '.' or '-'".to_string(),
            ));
        }
        if !email_regex().is_match(&email) {
            return Err(UserError::Validation(format!("'{}' is not a valid email", email)));
        }

        Ok(Self {
            name,
            email,
            username,
            profile_url: self.profile_url,
        })
    }
}

const MARKUP_CHARS: &[char] = &['<', '>'];

pub fn validate_password(password: &str) -> UserResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").expect("valid username regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+$").expect("valid email regex")
    })
}

/// 对外暴露的用户视图，不含密码哈希
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub friends: Vec<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            profile_url: user.profile_url.clone(),
            friends: user.friends.iter().map(|id| id.to_string()).collect(),
        }
    }
}
