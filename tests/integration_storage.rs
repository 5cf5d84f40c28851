//! 存储层集成测试
//!
//! 测试范围:
//! - storage::open_engine - 根据配置选择后端
//! - storage::UserStore / SessionStore - 重新打开 redb 文件后数据仍在
//! - api::session::SessionManager - 服务重启后会话仍可找到

use std::sync::Arc;
use std::time::Duration;

use socialgraph::api::session::SessionManager;
use socialgraph::config::StorageConfig;
use socialgraph::core::{NewUser, UserError};
use socialgraph::storage::{open_engine, SessionStore, SharedEngine, UserStore};

fn redb_config(dir: &tempfile::TempDir) -> StorageConfig {
    StorageConfig {
        path: dir.path().join("social.redb").to_string_lossy().into_owned(),
    }
}

fn open(config: &StorageConfig) -> SharedEngine {
    open_engine(config).expect("打开存储失败")
}

fn new_user(username: &str) -> NewUser {
    NewUser::new(username, format!("{}@example.com", username), username)
}

#[cfg(feature = "redb")]
#[test]
fn test_users_and_friendships_survive_reopen() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let config = redb_config(&dir);

    let alice = {
        let users = UserStore::new(open(&config));
        let alice = users.create_user(new_user("alice"), None).expect("创建用户失败");
        let bob = users.create_user(new_user("bob"), None).expect("创建用户失败");
        users.add_friend(&alice.id, &bob.id).expect("添加好友失败");
        users
            .set_profile_url(&bob.id, Some("/images/bob.png".to_string()))
            .expect("设置头像失败");
        alice
    };

    // 引擎已释放，重新打开同一个文件
    let users = UserStore::new(open(&config));
    assert_eq!(users.count().expect("计数失败"), 2);

    let alice = users.find_by_id(&alice.id).expect("查询失败").expect("用户应存在");
    let bob = users.find_by_username("bob").expect("查询失败").expect("用户应存在");
    assert_eq!(alice.friends, vec![bob.id]);
    assert_eq!(bob.friends, vec![alice.id]);
    assert_eq!(bob.profile_url.as_deref(), Some("/images/bob.png"));

    // 唯一索引也被持久化
    let duplicate = users.create_user(new_user("Alice"), None);
    assert!(matches!(duplicate, Err(UserError::Duplicate { field: "username", .. })));
}

#[cfg(feature = "redb")]
#[test]
fn test_sessions_survive_restart() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let config = redb_config(&dir);

    let session_id = tokio_test::block_on(async {
        let engine = open(&config);
        let users = UserStore::new(engine.clone());
        let alice = users.create_user(new_user("alice"), None).expect("创建用户失败");
        let manager = SessionManager::new(SessionStore::new(engine), Duration::from_secs(3600), 0);
        manager.create_session(alice.id).expect("创建会话失败").id
    });

    let manager: Arc<SessionManager> =
        SessionManager::new(SessionStore::new(open(&config)), Duration::from_secs(3600), 0);
    let session = manager
        .find_session(&session_id)
        .expect("查询会话失败")
        .expect("会话应存在");
    assert_eq!(session.id, session_id);
    assert_eq!(manager.session_count().expect("计数失败"), 1);

    manager.remove_session(&session_id).expect("删除会话失败");
    assert!(manager.find_session(&session_id).expect("查询会话失败").is_none());
}

#[test]
fn test_memory_backend_from_config() {
    let engine = open(&StorageConfig::memory());
    let users = UserStore::new(engine);
    users.create_user(new_user("alice"), None).expect("创建用户失败");
    assert_eq!(users.find_all().expect("查询失败").len(), 1);
}
