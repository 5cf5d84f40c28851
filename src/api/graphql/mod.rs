//! GraphQL 接口
//!
//! 查询和变更直接映射到 `UserStore` 的读写，登录态由 HTTP 层通过
//! [`RequestContext`] 传入。

pub mod context;
pub mod error;
pub mod schema;
pub mod user_resolver;

pub use context::RequestContext;
pub use schema::{build_schema, schema_sdl, MutationRoot, QueryRoot, SocialSchema};
pub use user_resolver::UserObject;
