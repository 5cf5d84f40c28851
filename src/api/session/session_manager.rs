use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::config::SessionConfig;
use crate::core::error::{SessionError, SessionResult};
use crate::core::UserId;
use crate::storage::{SessionRecord, SessionStore};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7天
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// 会话管理器
///
/// 会话记录持久化在 `SessionStore` 中，`DashMap` 作为进程内缓存。
/// 缓存首次使用时从存储加载一次，之后会话数直接从缓存统计。
/// 会话有效期在创建时确定，不随访问续期。
pub struct SessionManager {
    // 使用 DashMap 实现并发访问，无需显式加锁
    sessions: Arc<DashMap<String, SessionRecord>>,
    store: SessionStore,
    /// 保证容量检查与插入的原子性；值表示缓存是否已从存储加载
    create_lock: Mutex<bool>,
    ttl: Duration,
    /// 最大会话数，0 表示不限制
    max_sessions: usize,
    cleanup_interval: Duration,
    /// 后台清理任务是否正在运行
    cleanup_task_running: Arc<AtomicBool>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("cached_sessions", &self.sessions.len())
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl SessionManager {
    /// 创建新的会话管理器
    ///
    /// 注意：此构造函数不会自动启动后台清理任务，
    /// 需要显式调用 `start_cleanup_task()` 来启动
    pub fn new(store: SessionStore, ttl: Duration, max_sessions: usize) -> Arc<Self> {
        Arc::new(Self {
            sessions: Arc::new(DashMap::new()),
            store,
            create_lock: Mutex::new(false),
            ttl,
            max_sessions,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            cleanup_task_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn from_config(store: SessionStore, config: &SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: Arc::new(DashMap::new()),
            store,
            create_lock: Mutex::new(false),
            ttl: Duration::from_secs(config.ttl_secs),
            max_sessions: config.max_sessions,
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs.max(1)),
            cleanup_task_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 启动后台会话清理任务
    ///
    /// 如果任务已经在运行，此方法不会重复启动
    pub fn start_cleanup_task(self: &Arc<Self>) {
        if self.cleanup_task_running.swap(true, Ordering::SeqCst) {
            info!("Session cleanup task is already running");
            return;
        }

        info!("Starting session cleanup task");
        let manager_clone = Arc::clone(self);
        tokio::spawn(async move {
            manager_clone.background_reclamation_task().await;
        });
    }

    /// 停止后台会话清理任务
    ///
    /// 设置停止标志，后台任务将在下一次循环时退出
    pub fn stop_cleanup_task(&self) {
        info!("Stopping session cleanup task");
        self.cleanup_task_running.store(false, Ordering::SeqCst);
    }

    /// 检查后台清理任务是否正在运行
    pub fn is_cleanup_task_running(&self) -> bool {
        self.cleanup_task_running.load(Ordering::SeqCst)
    }

    /// Creates a new session bound to `user_id`
    pub fn create_session(&self, user_id: UserId) -> SessionResult<SessionRecord> {
        let mut loaded = self.create_lock.lock();
        self.ensure_loaded(&mut loaded)?;

        if self.max_sessions > 0 && self.live_count() >= self.max_sessions {
            warn!("Failed to create session for user {}: maximum sessions exceeded", user_id);
            return Err(SessionError::MaxSessionsExceeded);
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::days(7));
        let record = SessionRecord::new(user_id, ttl);

        self.store.save(&record)?;
        self.sessions.insert(record.id.clone(), record.clone());
        drop(loaded);

        info!("Created session for user {}", user_id);
        Ok(record)
    }

    /// Finds a live session. Expired sessions are removed and reported absent.
    pub fn find_session(&self, session_id: &str) -> SessionResult<Option<SessionRecord>> {
        let cached = self.sessions.get(session_id).map(|entry| entry.clone());
        let record = match cached {
            Some(record) => record,
            None => match self.store.load(session_id)? {
                Some(record) => {
                    self.sessions.insert(record.id.clone(), record.clone());
                    record
                }
                None => return Ok(None),
            },
        };

        if record.is_expired() {
            info!("Session for user {} has expired", record.user_id);
            self.remove_session(session_id)?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Like `find_session`, but a missing or expired session is an error
    pub fn get_session(&self, session_id: &str) -> SessionResult<SessionRecord> {
        self.find_session(session_id)?
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    /// Removes a session from cache and store
    pub fn remove_session(&self, session_id: &str) -> SessionResult<()> {
        self.sessions.remove(session_id);
        self.store.delete(session_id)?;
        Ok(())
    }

    /// 当前所有未过期的会话
    pub fn list_sessions(&self) -> SessionResult<Vec<SessionRecord>> {
        let now = Utc::now();
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|record| !record.is_expired_at(now))
            .collect())
    }

    /// 未过期的会话数，从缓存统计
    pub fn session_count(&self) -> SessionResult<usize> {
        let mut loaded = self.create_lock.lock();
        self.ensure_loaded(&mut loaded)?;
        Ok(self.live_count())
    }

    /// Whether the session cap is reached
    pub fn is_out_of_sessions(&self) -> SessionResult<bool> {
        if self.max_sessions == 0 {
            return Ok(false);
        }
        Ok(self.session_count()? >= self.max_sessions)
    }

    fn live_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .count()
    }

    /// 服务重启后缓存为空，首次使用时把存储中的会话载入缓存
    fn ensure_loaded(&self, loaded: &mut bool) -> SessionResult<()> {
        if *loaded {
            return Ok(());
        }
        let records = self.list_sessions()?;
        debug!("Loaded {} stored sessions into cache", records.len());
        for record in records {
            self.sessions.entry(record.id.clone()).or_insert(record);
        }
        *loaded = true;
        Ok(())
    }

    /// 后台任务：定期清理过期会话
    ///
    /// 可以通过 `stop_cleanup_task()` 方法停止
    async fn background_reclamation_task(self: Arc<Self>) {
        let mut interval = time::interval(self.cleanup_interval);

        loop {
            interval.tick().await;

            // 检查是否应该停止
            if !self.cleanup_task_running.load(Ordering::SeqCst) {
                info!("Session cleanup task is stopping");
                break;
            }

            if let Err(e) = self.reclaim_expired_sessions() {
                warn!("Failed to reclaim expired sessions: {}", e);
            }
        }

        info!("Session cleanup task has stopped");
    }

    /// Reclaims expired sessions, returns how many were removed
    pub fn reclaim_expired_sessions(&self) -> SessionResult<usize> {
        let now = Utc::now();
        let removed = self.store.delete_expired(now)?;

        // 缓存中可能还有已经不在存储中的过期会话
        self.sessions.retain(|_, record| !record.is_expired_at(now));
        for id in &removed {
            self.sessions.remove(id);
        }

        if !removed.is_empty() {
            info!("Reclaimed {} expired sessions", removed.len());
        }
        Ok(removed.len())
    }
}
