use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::{debug, info};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::core::cookies::{cleared_session_cookie, read_cookie, session_cookie, SESSION_COOKIE};
use crate::core::db::{find_user_by_email, find_user_by_username, get_user, insert_user};
use crate::core::errors::ApiError;
use crate::core::helpers::{
    hash_password, is_valid_email, json_response, json_response_with_cookie, new_id, read_json,
    sanitize_text, verify_password,
};
use crate::core::token;
use crate::models::models::User;
use crate::models::views::PublicUser;
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SignupBody {
    username: String,
    full_name: String,
    email: String,
    password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LoginBody {
    username: String,
    password: String,
}

fn with_session<T: Serialize>(
    state: &AppState,
    status: u16,
    value: &T,
    user_id: &str,
) -> Result<Response, ApiError> {
    let token = token::issue(&state.config.jwt_secret, user_id, state.config.token_ttl())?;
    let cookie = session_cookie(
        &token,
        state.config.token_ttl().num_seconds(),
        state.config.secure_cookies,
    );
    Ok(json_response_with_cookie(status, value, &cookie)?)
}

pub fn signup(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let body: SignupBody = read_json(req)?;
    let store = state.store.as_ref();

    let username = body.username.trim().to_string();
    let full_name = sanitize_text(body.full_name.trim());
    let email = body.email.trim().to_string();

    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if full_name.is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    if find_user_by_email(store, &email)?.is_some() {
        return Err(ApiError::validation("Email is already registered"));
    }
    if find_user_by_username(store, &username)?.is_some() {
        return Err(ApiError::validation("Username is already taken"));
    }
    if body.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation("Password must be at least 6 characters long"));
    }

    let user = User::new(new_id(), username, full_name, email, hash_password(&body.password)?);
    insert_user(store, &user)?;
    info!(user_id = %user.id, username = %user.username, "user signed up");

    let body = serde_json::json!({
        "message": "User created successfully",
        "user": PublicUser::from(&user),
    });
    with_session(state, 201, &body, &user.id)
}

pub fn login(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let body: LoginBody = read_json(req)?;

    // Unknown user and wrong password look the same from outside.
    let user = find_user_by_username(state.store.as_ref(), body.username.trim())?
        .filter(|u| verify_password(&body.password, &u.password))
        .ok_or_else(|| ApiError::auth("Invalid username or password"))?;

    debug!(user_id = %user.id, "login");
    with_session(state, 200, &PublicUser::from(&user), &user.id)
}

pub fn logout(state: &AppState) -> Result<Response, ApiError> {
    Ok(json_response_with_cookie(
        200,
        &serde_json::json!({ "message": "Logout successful" }),
        &cleared_session_cookie(state.config.secure_cookies),
    )?)
}

pub fn get_me(user: &User) -> Result<Response, ApiError> {
    Ok(json_response(200, &PublicUser::from(user))?)
}

/// Access-control gate: resolves the session cookie to a stored user.
pub fn protect_route(state: &AppState, req: &Request) -> Result<User, ApiError> {
    let token = read_cookie(req, SESSION_COOKIE)
        .ok_or_else(|| ApiError::auth("Unauthorized: No token provided"))?;

    let claims = token::verify(&state.config.jwt_secret, &token).map_err(|err| {
        debug!(%err, "rejected session token");
        ApiError::auth("Unauthorized: Invalid token")
    })?;

    get_user(state.store.as_ref(), &claims.user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
