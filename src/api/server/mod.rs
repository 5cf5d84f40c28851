//! 网络服务层
//!
//! 提供基于 HTTP 的 GraphQL 和 REST 接口

pub mod http;

pub use http::{create_router, AppState, HttpServer};
