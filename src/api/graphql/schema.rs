use async_graphql::{EmptySubscription, MergedObject, Schema};
use std::sync::Arc;

use super::user_resolver::{UserMutation, UserQuery};
use crate::api::session::SessionManager;
use crate::config::GraphqlConfig;
use crate::storage::UserStore;

#[derive(Default, MergedObject)]
pub struct QueryRoot(pub UserQuery);

#[derive(Default, MergedObject)]
pub struct MutationRoot(pub UserMutation);

pub type SocialSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// 构建 GraphQL schema，存储和会话管理器作为全局数据注入
pub fn build_schema(
    users: UserStore,
    sessions: Arc<SessionManager>,
    config: &GraphqlConfig,
) -> SocialSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(users)
        .data(sessions)
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity)
        .finish()
}

/// Schema SDL, used by the `schema` command
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .finish()
        .sdl()
}
