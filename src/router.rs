use spin_sdk::http::{Method, Request, Response};
use tracing::{debug, error};

use crate::auth::{self, protect_route};
use crate::core::errors::ApiError;
use crate::core::helpers::path_param;
use crate::{follow, notifications, posts, users, AppState};

/// Routes one request and always produces a response; handler errors are
/// turned into `{"error": ...}` bodies here.
pub async fn handle_request(state: &AppState, req: Request) -> Response {
    let method = req.method().to_string();
    let path = req.path().to_string();

    if matches!(req.method(), Method::Options) {
        return with_cors(state, preflight());
    }

    let result = if req.body().len() > state.config.max_body_bytes {
        Err(ApiError::validation("Request body too large"))
    } else {
        dispatch(state, &req).await
    };

    let resp = match result {
        Ok(resp) => resp,
        Err(err) => {
            if err.status().is_server_error() {
                error!(%method, %path, "request failed: {err}");
            } else {
                debug!(%method, %path, status = err.status().as_u16(), "rejected: {err}");
            }
            err.into()
        }
    };
    with_cors(state, resp)
}

async fn dispatch(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let path = req.path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (req.method(), segments.as_slice()) {
        // auth
        (Method::Post, ["api", "auth", "signup"]) => auth::signup(state, req),
        (Method::Post, ["api", "auth", "login"]) => auth::login(state, req),
        (Method::Post, ["api", "auth", "logout"]) => auth::logout(state),
        (Method::Get, ["api", "auth", "me"]) => {
            let user = protect_route(state, req)?;
            auth::get_me(&user)
        }

        // posts
        (Method::Get, ["api", "posts", "all"]) => {
            protect_route(state, req)?;
            posts::get_all_posts(state)
        }
        (Method::Get, ["api", "posts", "following"]) => {
            let user = protect_route(state, req)?;
            posts::get_following_posts(state, &user)
        }
        (Method::Get, ["api", "posts", "likes", id]) => {
            protect_route(state, req)?;
            posts::get_liked_posts(state, &path_param(id))
        }
        (Method::Get, ["api", "posts", "user", username]) => {
            protect_route(state, req)?;
            posts::get_user_posts(state, &path_param(username))
        }
        (Method::Post, ["api", "posts", "create"]) => {
            let user = protect_route(state, req)?;
            posts::create_post(state, &user, req).await
        }
        (Method::Post, ["api", "posts", "comment", id]) => {
            let user = protect_route(state, req)?;
            posts::comment_on_post(state, &user, &path_param(id), req)
        }
        (Method::Post, ["api", "posts", "like", id]) => {
            let user = protect_route(state, req)?;
            posts::like_unlike_post(state, &user, &path_param(id))
        }
        (Method::Post, ["api", "posts", id]) => {
            let user = protect_route(state, req)?;
            posts::delete_post(state, &user, &path_param(id)).await
        }

        // users
        (Method::Get, ["api", "users", "profile", username]) => {
            protect_route(state, req)?;
            users::get_profile(state, &path_param(username))
        }
        (Method::Post, ["api", "users", "follow", id]) => {
            let user = protect_route(state, req)?;
            follow::follow_unfollow_user(state, &user, &path_param(id))
        }
        (Method::Get, ["api", "users", "suggested"]) => {
            let user = protect_route(state, req)?;
            users::get_suggested_users(state, &user)
        }
        (Method::Post, ["api", "users", "update"]) => {
            let user = protect_route(state, req)?;
            users::update_user(state, &user, req).await
        }

        // notifications
        (Method::Get, ["api", "notifications"]) => {
            let user = protect_route(state, req)?;
            notifications::get_notifications(state, &user)
        }
        (Method::Delete, ["api", "notifications"]) => {
            let user = protect_route(state, req)?;
            notifications::delete_notifications(state, &user)
        }

        _ => Err(ApiError::not_found("No route found")),
    }
}

fn preflight() -> Response {
    Response::builder()
        .status(204)
        .header("access-control-allow-methods", "GET, POST, DELETE, OPTIONS")
        .header("access-control-allow-headers", "content-type")
        .header("access-control-max-age", "3600")
        .body(Vec::new())
        .build()
}

/// Adds CORS headers when an allowed origin is configured.
fn with_cors(state: &AppState, resp: Response) -> Response {
    let Some(origin) = state.config.cors_origin.as_deref() else {
        return resp;
    };

    let mut builder = Response::builder();
    builder.status(*resp.status());
    for (name, value) in resp.headers() {
        if let Some(value) = value.as_str() {
            builder.header(name, value);
        }
    }
    builder
        .header("access-control-allow-origin", origin)
        .header("access-control-allow-credentials", "true")
        .body(resp.body().to_vec())
        .build()
}
