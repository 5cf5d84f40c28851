use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::api::graphql::RequestContext;
use crate::api::server::http::{error::HttpError, state::AppState};

/// 执行 GraphQL 请求
///
/// 当前用户由会话 cookie 解析；`logout` 变更执行后清除 cookie
pub async fn execute(
    State(state): State<AppState>,
    jar: CookieJar,
    request: GraphQLRequest,
) -> Result<(CookieJar, GraphQLResponse), HttpError> {
    let server = &state.server;
    let context = match server.resolve_viewer(&jar)? {
        Some((user, session)) => RequestContext::new(Some(user), Some(session.id)),
        None => RequestContext::anonymous(),
    };
    let context = Arc::new(context);

    let response = server
        .get_schema()
        .execute(request.into_inner().data(Arc::clone(&context)))
        .await;

    let jar = if context.logout_requested() {
        server.session_cookie().clear(jar)
    } else {
        jar
    };
    Ok((jar, response.into()))
}

pub async fn graphiql(State(state): State<AppState>) -> Html<String> {
    let endpoint = &state.server.get_config().graphql.path;
    Html(GraphiQLSource::build().endpoint(endpoint).finish())
}
