//! 会话集合
//!
//! 会话记录持久化在 `sessions/<id>` 下，服务重启后登录状态仍然有效

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::engine::Operation;
use super::SharedEngine;
use crate::core::{StorageError, StorageResult, UserId};

const SESSION_PREFIX: &str = "sessions/";

fn session_key(id: &str) -> Vec<u8> {
    format!("{}{}", SESSION_PREFIX, id).into_bytes()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// 新会话，ID 为随机 UUID
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[derive(Clone)]
pub struct SessionStore {
    engine: SharedEngine,
}

impl SessionStore {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    pub fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let bytes = serde_json::to_vec(record).map_err(StorageError::encode)?;
        self.engine.lock().put(&session_key(&record.id), &bytes)
    }

    pub fn load(&self, id: &str) -> StorageResult<Option<SessionRecord>> {
        let bytes = self.engine.lock().get(&session_key(id))?;
        bytes
            .map(|b| serde_json::from_slice(&b).map_err(StorageError::decode))
            .transpose()
    }

    pub fn delete(&self, id: &str) -> StorageResult<()> {
        self.engine.lock().delete(&session_key(id))
    }

    pub fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        self.engine
            .lock()
            .scan(SESSION_PREFIX.as_bytes())?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(StorageError::decode))
            .collect()
    }

    /// 删除所有在 `now` 之前过期的会话，返回被删除的会话ID
    pub fn delete_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<String>> {
        let mut engine = self.engine.lock();
        let mut expired = Vec::new();
        for (_, bytes) in engine.scan(SESSION_PREFIX.as_bytes())? {
            let record: SessionRecord =
                serde_json::from_slice(&bytes).map_err(StorageError::decode)?;
            if record.is_expired_at(now) {
                expired.push(record.id);
            }
        }

        if !expired.is_empty() {
            engine.batch(
                expired
                    .iter()
                    .map(|id| Operation::delete(session_key(id)))
                    .collect(),
            )?;
        }
        Ok(expired)
    }
}
