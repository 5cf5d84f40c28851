//! 用户集合
//!
//! 用户文档以 JSON 形式存储在 `users/<id>` 下，用户名和邮箱各有一个唯一索引。
//! 好友关系是对称的：添加/删除好友时两个文档在同一个批次中写入。

use chrono::Utc;
use log::{debug, info};
use std::collections::HashSet;

use super::engine::{Engine, Operation};
use super::SharedEngine;
use crate::core::{NewUser, StorageError, User, UserError, UserId, UserResult};

const USER_PREFIX: &str = "users/";
const USERNAME_INDEX_PREFIX: &str = "idx/username/";
const EMAIL_INDEX_PREFIX: &str = "idx/email/";

pub const USER_NOT_FOUND: &str = "User not found";

fn user_key(id: &UserId) -> Vec<u8> {
    format!("{}{}", USER_PREFIX, id).into_bytes()
}

fn username_key(username: &str) -> Vec<u8> {
    format!("{}{}", USERNAME_INDEX_PREFIX, username.to_lowercase()).into_bytes()
}

fn email_key(email: &str) -> Vec<u8> {
    format!("{}{}", EMAIL_INDEX_PREFIX, email.to_lowercase()).into_bytes()
}

fn encode(user: &User) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(user).map_err(StorageError::encode)
}

fn decode(bytes: &[u8]) -> Result<User, StorageError> {
    serde_json::from_slice(bytes).map_err(StorageError::decode)
}

/// Parses an id coming from a client
pub fn parse_user_id(id: &str) -> UserResult<UserId> {
    UserId::parse(id).ok_or_else(|| UserError::InvalidId(id.to_string()))
}

#[derive(Clone)]
pub struct UserStore {
    engine: SharedEngine,
}

impl UserStore {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    fn load(engine: &dyn Engine, id: &UserId) -> UserResult<Option<User>> {
        match engine.get(&user_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_via_index(engine: &dyn Engine, index_key: &[u8]) -> UserResult<Option<User>> {
        let Some(raw_id) = engine.get(index_key)? else {
            return Ok(None);
        };
        let id_str = String::from_utf8(raw_id)
            .map_err(|e| StorageError::DeserializationError(e.to_string()))?;
        let id = UserId::parse(&id_str).ok_or_else(|| {
            StorageError::DeserializationError(format!("corrupt index entry: {}", id_str))
        })?;
        Self::load(engine, &id)
    }

    fn load_all(engine: &dyn Engine) -> UserResult<Vec<User>> {
        engine
            .scan(USER_PREFIX.as_bytes())?
            .into_iter()
            .map(|(_, bytes)| decode(&bytes).map_err(UserError::from))
            .collect()
    }

    /// 创建用户，用户名和邮箱不区分大小写唯一
    pub fn create_user(&self, new_user: NewUser, password_hash: Option<String>) -> UserResult<User> {
        let new_user = new_user.normalized()?;
        let mut engine = self.engine.lock();

        if engine.get(&username_key(&new_user.username))?.is_some() {
            return Err(UserError::Duplicate {
                field: "username",
                value: new_user.username,
            });
        }
        if engine.get(&email_key(&new_user.email))?.is_some() {
            return Err(UserError::Duplicate {
                field: "email",
                value: new_user.email,
            });
        }

        let user = User::new(new_user, password_hash);
        let id_bytes = user.id.to_string().into_bytes();
        engine.batch(vec![
            Operation::put(user_key(&user.id), encode(&user)?),
            Operation::put(username_key(&user.username), id_bytes.clone()),
            Operation::put(email_key(&user.email), id_bytes),
        ])?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn find_by_id(&self, id: &UserId) -> UserResult<Option<User>> {
        let engine = self.engine.lock();
        Self::load(engine.as_ref(), id)
    }

    pub fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let engine = self.engine.lock();
        Self::load_via_index(engine.as_ref(), &username_key(username.trim()))
    }

    pub fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let engine = self.engine.lock();
        Self::load_via_index(engine.as_ref(), &email_key(email.trim()))
    }

    /// 全部用户，按创建顺序
    pub fn find_all(&self) -> UserResult<Vec<User>> {
        let engine = self.engine.lock();
        Self::load_all(engine.as_ref())
    }

    /// Users whose id is in `ids`, in creation order. Unknown ids are skipped.
    pub fn find_many(&self, ids: &[UserId]) -> UserResult<Vec<User>> {
        let wanted: HashSet<&UserId> = ids.iter().collect();
        let engine = self.engine.lock();
        let mut users = Vec::with_capacity(wanted.len());
        let mut sorted: Vec<&UserId> = wanted.into_iter().collect();
        sorted.sort();
        for id in sorted {
            if let Some(user) = Self::load(engine.as_ref(), id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Users whose id is not in `ids`, in creation order
    pub fn find_excluding(&self, ids: &[UserId]) -> UserResult<Vec<User>> {
        let excluded: HashSet<&UserId> = ids.iter().collect();
        let engine = self.engine.lock();
        Ok(Self::load_all(engine.as_ref())?
            .into_iter()
            .filter(|user| !excluded.contains(&user.id))
            .collect())
    }

    pub fn count(&self) -> UserResult<usize> {
        let engine = self.engine.lock();
        Ok(engine.scan(USER_PREFIX.as_bytes())?.len())
    }

    /// 添加好友：双方文档的好友集合都加入对方，返回更新后的好友文档
    pub fn add_friend(&self, viewer_id: &UserId, friend_id: &UserId) -> UserResult<User> {
        self.update_friendship(viewer_id, friend_id, |user, other| {
            user.add_friend(*other);
        })
    }

    /// 删除好友：双方文档的好友集合都移除对方，返回更新后的好友文档
    pub fn remove_friend(&self, viewer_id: &UserId, friend_id: &UserId) -> UserResult<User> {
        self.update_friendship(viewer_id, friend_id, |user, other| {
            user.remove_friend(other);
        })
    }

    fn update_friendship<F>(&self, viewer_id: &UserId, friend_id: &UserId, apply: F) -> UserResult<User>
    where
        F: Fn(&mut User, &UserId),
    {
        if viewer_id == friend_id {
            return Err(UserError::Validation(
                "a user cannot be their own friend".to_string(),
            ));
        }

        let mut engine = self.engine.lock();
        let mut friend = Self::load(engine.as_ref(), friend_id)?
            .ok_or_else(|| UserError::NotFound(USER_NOT_FOUND.to_string()))?;
        let mut viewer = Self::load(engine.as_ref(), viewer_id)?
            .ok_or_else(|| UserError::NotFound(USER_NOT_FOUND.to_string()))?;

        apply(&mut friend, viewer_id);
        apply(&mut viewer, friend_id);

        engine.batch(vec![
            Operation::put(user_key(&friend.id), encode(&friend)?),
            Operation::put(user_key(&viewer.id), encode(&viewer)?),
        ])?;

        debug!(
            "Friendship updated: {} now has {} friends, {} now has {} friends",
            viewer.id,
            viewer.friends.len(),
            friend.id,
            friend.friends.len()
        );
        Ok(friend)
    }

    pub fn set_profile_url(&self, id: &UserId, url: Option<String>) -> UserResult<User> {
        let mut engine = self.engine.lock();
        let mut user = Self::load(engine.as_ref(), id)?
            .ok_or_else(|| UserError::NotFound(USER_NOT_FOUND.to_string()))?;
        user.profile_url = url;
        user.updated_at = Utc::now();
        engine.put(&user_key(id), &encode(&user)?)?;
        Ok(user)
    }
}
