//! HTTP 服务器
//!
//! 持有所有请求共享的组件：用户集合、会话管理器、认证器和 GraphQL schema

use axum_extra::extract::cookie::CookieJar;
use log::debug;
use std::sync::Arc;

use crate::api::graphql::{build_schema, SocialSchema};
use crate::api::service::PasswordAuthenticator;
use crate::api::session::{SessionCookie, SessionManager};
use crate::config::Config;
use crate::core::error::SocialResult;
use crate::core::User;
use crate::storage::{SessionRecord, SessionStore, SharedEngine, UserStore};

pub struct HttpServer {
    config: Config,
    user_store: UserStore,
    session_manager: Arc<SessionManager>,
    auth_service: PasswordAuthenticator,
    schema: SocialSchema,
    session_cookie: SessionCookie,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    ///
    /// 注意：不会启动会话清理任务，由调用方决定是否启动
    pub fn new(config: Config, engine: SharedEngine) -> Self {
        let user_store = UserStore::new(engine.clone());
        let session_manager =
            SessionManager::from_config(SessionStore::new(engine), &config.session);
        let auth_service = PasswordAuthenticator::new(user_store.clone(), config.auth.clone());
        let schema = build_schema(user_store.clone(), session_manager.clone(), &config.graphql);
        let session_cookie = SessionCookie::from_config(&config);

        Self {
            config,
            user_store,
            session_manager,
            auth_service,
            schema,
            session_cookie,
        }
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_user_store(&self) -> &UserStore {
        &self.user_store
    }

    pub fn get_session_manager(&self) -> &Arc<SessionManager> {
        &self.session_manager
    }

    pub fn get_auth_service(&self) -> &PasswordAuthenticator {
        &self.auth_service
    }

    pub fn get_schema(&self) -> &SocialSchema {
        &self.schema
    }

    pub fn session_cookie(&self) -> &SessionCookie {
        &self.session_cookie
    }

    /// 根据会话 cookie 找到当前用户
    ///
    /// cookie 缺失、签名无效、会话过期或用户已不存在时返回 `None`
    pub fn resolve_viewer(&self, jar: &CookieJar) -> SocialResult<Option<(User, SessionRecord)>> {
        let Some(session_id) = self.session_cookie.session_id(jar) else {
            return Ok(None);
        };
        let Some(session) = self.session_manager.find_session(&session_id)? else {
            return Ok(None);
        };

        match self.user_store.find_by_id(&session.user_id)? {
            Some(user) => Ok(Some((user, session))),
            None => {
                debug!("Session {} refers to a missing user, dropping it", session.id);
                self.session_manager.remove_session(&session.id)?;
                Ok(None)
            }
        }
    }
}
