//! HTTP 服务模块
//!
//! GraphQL 端点、认证和上传路由，以及中间件

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::HttpError;
pub use router::create_router;
pub use server::HttpServer;
pub use state::AppState;
