use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[cfg(test)]
pub mod test_config;

/// 默认会话密钥，生产环境必须覆盖
pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

/// 内存存储的路径标记
pub const MEMORY_STORAGE_PATH: &str = ":memory:";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub graphql: GraphqlConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// CORS 允许的来源，为空时使用宽松策略
    pub allowed_origins: Vec<String>,
    /// 前端构建目录，设置后作为静态站点提供
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            request_timeout_secs: 30,
            allowed_origins: Vec::new(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// redb 数据库文件路径，`:memory:` 表示内存存储
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/socialgraph.redb".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            path: MEMORY_STORAGE_PATH.to_string(),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_STORAGE_PATH
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    /// 会话有效期，默认 7 天
    pub ttl_secs: u64,
    pub cleanup_interval_secs: u64,
    /// 最大会话数，0 表示不限制
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sid".to_string(),
            secret: DEFAULT_SESSION_SECRET.to_string(),
            ttl_secs: 60 * 60 * 24 * 7,
            cleanup_interval_secs: 60,
            max_sessions: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// 登录失败次数上限，0 表示不限制
    pub failed_login_attempts: u32,
    pub lockout_secs: u64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            failed_login_attempts: 5,
            lockout_secs: 300,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MediaConfig {
    pub dir: String,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: "images".to_string(),
            url_prefix: "/images".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GraphqlConfig {
    pub path: String,
    pub playground: bool,
    pub max_depth: usize,
    pub max_complexity: usize,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            path: "/graphql".to_string(),
            playground: true,
            max_depth: 16,
            max_complexity: 512,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
    pub stdout: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "socialgraph".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
            stdout: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 使用进程环境变量覆盖配置，返回被忽略的无效取值
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    /// 使用给定的查找函数覆盖配置
    ///
    /// 支持的变量：`DATABASE_PATH`、`SESSION_SECRET`、`PORT`、`HOST`、`APP_ENV`、`LOG_LEVEL`
    ///
    /// 此时日志尚未初始化，无效取值以警告列表返回，由调用方在日志就绪后输出
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        if let Some(path) = lookup("DATABASE_PATH") {
            self.storage.path = path;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warnings.push(format!("Ignoring invalid PORT value: {}", port)),
            }
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(env_name) = lookup("APP_ENV") {
            match Environment::parse(&env_name) {
                Some(environment) => self.environment = environment,
                None => warnings.push(format!("Ignoring unknown APP_ENV value: {}", env_name)),
            }
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        warnings
    }

    /// 校验配置是否可以启动服务
    pub fn validate(&self) -> Result<(), String> {
        if self.session.cookie_name.trim().is_empty() {
            return Err("session.cookie_name must not be empty".to_string());
        }
        if self.session.secret.is_empty() {
            return Err("session.secret must not be empty".to_string());
        }
        if self.environment.is_production() && self.session.secret == DEFAULT_SESSION_SECRET {
            return Err("session.secret must be set in production (SESSION_SECRET)".to_string());
        }
        if self.session.ttl_secs == 0 {
            return Err("session.ttl_secs must be positive".to_string());
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err("auth.bcrypt_cost must be between 4 and 31".to_string());
        }
        if !self.graphql.path.starts_with('/') {
            return Err("graphql.path must start with '/'".to_string());
        }
        if !self.media.url_prefix.starts_with('/') || self.media.url_prefix.trim_end_matches('/').is_empty() {
            return Err("media.url_prefix must be a path below '/'".to_string());
        }
        Ok(())
    }

    /// 生产环境下 cookie 仅通过 HTTPS 发送
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}
