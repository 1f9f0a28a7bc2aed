use spin_sdk::http::Response;
use tracing::info;

use crate::core::db::{add_id, get_user, remove_id, save_user, DocumentStore};
use crate::core::errors::ApiError;
use crate::core::helpers::message_response;
use crate::models::models::{NotificationType, User};
use crate::notifications::notify;
use crate::AppState;

/// Adds the edge on both sides. Re-running it changes nothing.
pub fn follow_user(store: &dyn DocumentStore, follower: &mut User, target: &mut User) -> anyhow::Result<()> {
    if add_id(&mut follower.following, &target.id) {
        save_user(store, follower)?;
    }
    if add_id(&mut target.followers, &follower.id) {
        save_user(store, target)?;
    }
    Ok(())
}

pub fn unfollow_user(store: &dyn DocumentStore, follower: &mut User, target: &mut User) -> anyhow::Result<()> {
    if remove_id(&mut follower.following, &target.id) {
        save_user(store, follower)?;
    }
    if remove_id(&mut target.followers, &follower.id) {
        save_user(store, target)?;
    }
    Ok(())
}

pub fn follow_unfollow_user(state: &AppState, user: &User, target_id: &str) -> Result<Response, ApiError> {
    if target_id == user.id {
        return Err(ApiError::validation("You can't follow/unfollow yourself"));
    }

    let store = state.store.as_ref();
    let mut target = get_user(store, target_id)?.ok_or_else(|| ApiError::not_found("User not found"))?;
    let mut me = user.clone();

    if me.following.iter().any(|id| *id == target.id) {
        unfollow_user(store, &mut me, &mut target)?;
        info!(follower = %me.id, target = %target.id, "unfollowed");
        Ok(message_response(200, "User unfollowed successfully")?)
    } else {
        follow_user(store, &mut me, &mut target)?;
        notify(store, &me.id, &target.id, NotificationType::Follow)?;
        info!(follower = %me.id, target = %target.id, "followed");
        Ok(message_response(200, "User followed successfully")?)
    }
}
