//! 测试配置模块
//!
//! 统一构造单元测试使用的配置：内存存储、最低 bcrypt 代价、独立的媒体目录
//! 此模块仅在测试时编译

use super::{Config, StorageConfig};
use std::path::Path;

/// 测试用最低 bcrypt 代价，加快哈希速度
pub const TEST_BCRYPT_COST: u32 = 4;

/// 创建测试配置
pub fn test_config(media_dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage = StorageConfig::memory();
    config.session.secret = "unit-test-secret".to_string();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;
    config.auth.failed_login_attempts = 3;
    config.media.dir = media_dir.to_string_lossy().into_owned();
    config.log.stdout = false;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(dir.path());
        assert!(config.validate().is_ok());
        assert!(config.storage.is_memory());
        assert_eq!(config.auth.bcrypt_cost, TEST_BCRYPT_COST);
    }
}
