use async_graphql::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::unauthenticated;
use crate::core::User;

/// 单个请求的上下文
///
/// 由 HTTP 层根据会话 cookie 构造，以 `Arc` 形式注入到 GraphQL 请求数据中。
/// 执行结束后 HTTP 层读取 `logout_requested` 决定是否清除 cookie。
#[derive(Debug, Default)]
pub struct RequestContext {
    viewer: Option<User>,
    session_id: Option<String>,
    logout_requested: AtomicBool,
}

impl RequestContext {
    pub fn new(viewer: Option<User>, session_id: Option<String>) -> Self {
        Self {
            viewer,
            session_id,
            logout_requested: AtomicBool::new(false),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn viewer(&self) -> Option<&User> {
        self.viewer.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn request_logout(&self) {
        self.logout_requested.store(true, Ordering::SeqCst);
    }

    pub fn logout_requested(&self) -> bool {
        self.logout_requested.load(Ordering::SeqCst)
    }
}

/// 取出请求上下文；没有注入时按匿名请求处理
pub fn request_context<'a>(ctx: &Context<'a>) -> Option<&'a RequestContext> {
    ctx.data_opt::<Arc<RequestContext>>().map(|c| c.as_ref())
}

pub fn viewer<'a>(ctx: &Context<'a>) -> Option<&'a User> {
    request_context(ctx).and_then(RequestContext::viewer)
}

/// 需要登录的解析器入口
pub fn require_viewer<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a User> {
    viewer(ctx).ok_or_else(unauthenticated)
}
