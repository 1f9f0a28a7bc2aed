use rand::seq::SliceRandom;
use serde::Deserialize;
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::config::{MAX_BIO_LENGTH, MIN_PASSWORD_LENGTH, SUGGESTED_USERS_LIMIT};
use crate::core::db::{all_users, find_user_by_email, find_user_by_username, reindex_user, save_user};
use crate::core::errors::ApiError;
use crate::core::helpers::{hash_password, is_valid_email, json_response, non_blank, read_json, sanitize_text, verify_password};
use crate::images::discard_image;
use crate::models::models::User;
use crate::models::views::PublicUser;
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct UpdateUserBody {
    full_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
    bio: Option<String>,
    link: Option<String>,
    profile_img: Option<String>,
    cover_img: Option<String>,
}

pub fn get_profile(state: &AppState, username: &str) -> Result<Response, ApiError> {
    let user = find_user_by_username(state.store.as_ref(), username)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(json_response(200, &PublicUser::from(&user))?)
}

/// Up to four random users the caller does not follow yet.
pub fn get_suggested_users(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let mut candidates: Vec<User> = all_users(state.store.as_ref())?
        .into_iter()
        .filter(|u| u.id != user.id && !user.following.contains(&u.id))
        .collect();

    candidates.shuffle(&mut rand::thread_rng());
    let suggested: Vec<PublicUser> = candidates
        .iter()
        .take(SUGGESTED_USERS_LIMIT)
        .map(PublicUser::from)
        .collect();

    Ok(json_response(200, &suggested)?)
}

pub async fn update_user(state: &AppState, user: &User, req: &Request) -> Result<Response, ApiError> {
    let body: UpdateUserBody = read_json(req)?;
    let store = state.store.as_ref();
    let before = user.clone();
    let mut updated = user.clone();

    match (non_blank(body.current_password), non_blank(body.new_password)) {
        (None, None) => {}
        (Some(current), Some(new)) => {
            if !verify_password(&current, &updated.password) {
                return Err(ApiError::validation("Current password is incorrect"));
            }
            if new.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(ApiError::validation("Password must be at least 6 characters long"));
            }
            updated.password = hash_password(&new)?;
        }
        _ => {
            return Err(ApiError::validation(
                "Please provide both current password and new password",
            ))
        }
    }

    if let Some(email) = non_blank(body.email).map(|e| e.trim().to_string()) {
        if !email.eq_ignore_ascii_case(&updated.email) {
            if !is_valid_email(&email) {
                return Err(ApiError::validation("Invalid email format"));
            }
            if find_user_by_email(store, &email)?.is_some() {
                return Err(ApiError::validation("Email is already registered"));
            }
        }
        updated.email = email;
    }

    if let Some(username) = non_blank(body.username).map(|u| u.trim().to_string()) {
        if username != updated.username && find_user_by_username(store, &username)?.is_some() {
            return Err(ApiError::validation("Username is already taken"));
        }
        updated.username = username;
    }

    if let Some(full_name) = non_blank(body.full_name) {
        updated.full_name = sanitize_text(full_name.trim());
    }
    if let Some(bio) = body.bio {
        if bio.chars().count() > MAX_BIO_LENGTH {
            return Err(ApiError::validation("Bio is too long"));
        }
        updated.bio = sanitize_text(&bio);
    }
    if let Some(link) = body.link {
        updated.link = sanitize_text(link.trim());
    }

    // New images are uploaded before anything is saved; the old ones go
    // only once the user points at the replacements.
    let images = state.images.as_ref();
    let profile_img = match non_blank(body.profile_img) {
        Some(img) => Some(images.upload(&img).await.map_err(ApiError::Upstream)?),
        None => None,
    };
    let cover_img = match non_blank(body.cover_img) {
        Some(img) => match images.upload(&img).await {
            Ok(url) => Some(url),
            Err(err) => {
                if let Some(uploaded) = &profile_img {
                    discard_image(images, uploaded).await;
                }
                return Err(ApiError::Upstream(err));
            }
        },
        None => None,
    };
    if let Some(url) = &profile_img {
        updated.profile_img = url.clone();
    }
    if let Some(url) = &cover_img {
        updated.cover_img = url.clone();
    }

    updated.updated_at = chrono::Utc::now();
    save_user(store, &updated)?;
    reindex_user(store, &before, &updated)?;
    info!(user_id = %updated.id, "profile updated");

    for (old, replaced) in [
        (&before.profile_img, profile_img.is_some()),
        (&before.cover_img, cover_img.is_some()),
    ] {
        if replaced && !old.is_empty() {
            discard_image(images, old).await;
        }
    }

    Ok(json_response(200, &PublicUser::from(&updated))?)
}
