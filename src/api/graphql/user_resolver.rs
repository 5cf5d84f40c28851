use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use log::info;
use std::sync::Arc;

use super::context::{request_context, require_viewer, viewer};
use super::error::not_found;
use crate::api::session::SessionManager;
use crate::core::{User, UserId};
use crate::storage::user_store::parse_user_id;
use crate::storage::UserStore;

/// GraphQL 中的 `User` 类型，不暴露密码哈希
pub struct UserObject(pub User);

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self(user)
    }
}

fn objects(users: Vec<User>) -> Vec<UserObject> {
    users.into_iter().map(UserObject).collect()
}

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn profile_url(&self) -> Option<&str> {
        self.0.profile_url.as_deref()
    }

    /// 好友文档按需加载
    async fn friends(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let store = ctx.data::<UserStore>()?;
        let friends = store.find_many(&self.0.friends).map_err(|e| e.extend())?;
        Ok(objects(friends))
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// All users, oldest first
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let store = ctx.data::<UserStore>()?;
        Ok(objects(store.find_all().map_err(|e| e.extend())?))
    }

    /// `null` for a malformed id, `Not Found` for an unknown one
    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<Option<UserObject>> {
        let Some(id) = UserId::parse(&id) else {
            return Ok(None);
        };
        let store = ctx.data::<UserStore>()?;
        match store.find_by_id(&id).map_err(|e| e.extend())? {
            Some(user) => Ok(Some(user.into())),
            None => Err(not_found()),
        }
    }

    /// The logged-in user, if any
    async fn me(&self, ctx: &Context<'_>) -> Option<UserObject> {
        viewer(ctx).cloned().map(UserObject)
    }

    async fn all_friends(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let me = require_viewer(ctx)?;
        let store = ctx.data::<UserStore>()?;
        Ok(objects(store.find_many(&me.friends).map_err(|e| e.extend())?))
    }

    /// Everyone who is neither the viewer nor one of their friends
    #[graphql(name = "NoFriends")]
    async fn no_friends(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let me = require_viewer(ctx)?;
        let store = ctx.data::<UserStore>()?;

        let mut excluded = me.friends.clone();
        excluded.push(me.id);
        Ok(objects(store.find_excluding(&excluded).map_err(|e| e.extend())?))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Befriends `id`; returns the friend
    async fn add_friend(&self, ctx: &Context<'_>, id: String) -> Result<UserObject> {
        let me = require_viewer(ctx)?;
        let store = ctx.data::<UserStore>()?;
        let friend_id = parse_user_id(&id).map_err(|e| e.extend())?;
        let friend = store.add_friend(&me.id, &friend_id).map_err(|e| e.extend())?;
        Ok(friend.into())
    }

    /// Unfriends `id`; returns the former friend
    async fn remove_friend(&self, ctx: &Context<'_>, id: String) -> Result<UserObject> {
        let me = require_viewer(ctx)?;
        let store = ctx.data::<UserStore>()?;
        let friend_id = parse_user_id(&id).map_err(|e| e.extend())?;
        let friend = store
            .remove_friend(&me.id, &friend_id)
            .map_err(|e| e.extend())?;
        Ok(friend.into())
    }

    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let me = require_viewer(ctx)?;
        let sessions = ctx.data::<Arc<SessionManager>>()?;

        if let Some(request) = request_context(ctx) {
            if let Some(session_id) = request.session_id() {
                sessions.remove_session(session_id).map_err(|e| e.extend())?;
            }
            request.request_logout();
        }
        info!("User {} logged out", me.username);
        Ok(true)
    }
}
