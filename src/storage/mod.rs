//! 存储层
//!
//! 底层是有序字节键值引擎（内存或 redb），上层按集合前缀组织 JSON 文档：
//! - `users/<id>`               用户文档
//! - `idx/username/<小写用户名>` 用户名唯一索引 -> 用户ID
//! - `idx/email/<小写邮箱>`      邮箱唯一索引 -> 用户ID
//! - `sessions/<会话ID>`         会话记录

pub mod engine;
pub mod session_store;
pub mod user_store;

use parking_lot::Mutex;
use std::sync::Arc;

pub use crate::core::StorageError;
pub use engine::{Engine, MemoryEngine, Operation};
#[cfg(feature = "redb")]
pub use engine::RedbEngine;
pub use session_store::{SessionRecord, SessionStore};
pub use user_store::UserStore;

use crate::config::StorageConfig;

/// 所有集合共享的引擎句柄
///
/// 每个存储操作在整个读-改-写过程中持有锁
pub type SharedEngine = Arc<Mutex<Box<dyn Engine>>>;

pub fn shared(engine: impl Engine + 'static) -> SharedEngine {
    Arc::new(Mutex::new(Box::new(engine)))
}

/// 根据配置打开存储引擎
pub fn open_engine(config: &StorageConfig) -> Result<SharedEngine, StorageError> {
    if config.is_memory() {
        log::info!("Opening in-memory storage");
        return Ok(shared(MemoryEngine::new()));
    }

    open_persistent(config)
}

#[cfg(feature = "redb")]
fn open_persistent(config: &StorageConfig) -> Result<SharedEngine, StorageError> {
    log::info!("Opening redb storage at {}", config.path);
    Ok(shared(RedbEngine::new(&config.path)?))
}

#[cfg(not(feature = "redb"))]
fn open_persistent(config: &StorageConfig) -> Result<SharedEngine, StorageError> {
    Err(StorageError::DbError(format!(
        "persistent storage at '{}' requires the redb feature",
        config.path
    )))
}
