use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::config::MAX_POST_LENGTH;
use crate::core::db::{
    add_id, all_posts, find_user_by_username, get_post, get_user, insert_post, remove_id, remove_post,
    save_post, save_user, DocumentStore,
};
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response, new_id, non_blank, read_json, sanitize_text};
use crate::images::discard_image;
use crate::models::models::{Comment, NotificationType, Post, User};
use crate::models::views::{CommentView, PostView};
use crate::notifications::notify;
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreatePostBody {
    text: Option<String>,
    img: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CommentBody {
    text: Option<String>,
}

/// Resolves user ids while building views; each id hits the store once.
struct UserCache<'a> {
    store: &'a dyn DocumentStore,
    users: HashMap<String, Option<User>>,
}

impl<'a> UserCache<'a> {
    fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            users: HashMap::new(),
        }
    }

    fn get(&mut self, id: &str) -> anyhow::Result<Option<&User>> {
        if !self.users.contains_key(id) {
            let user = get_user(self.store, id)?;
            self.users.insert(id.to_string(), user);
        }
        Ok(self.users.get(id).and_then(|u| u.as_ref()))
    }
}

/// Attaches owners and comment authors. Posts whose owner is gone are
/// dropped.
pub fn populate(store: &dyn DocumentStore, posts: &[Post]) -> anyhow::Result<Vec<PostView>> {
    let mut cache = UserCache::new(store);
    let mut views = Vec::with_capacity(posts.len());

    for post in posts {
        let mut comments = Vec::with_capacity(post.comments.len());
        for comment in &post.comments {
            comments.push(CommentView::new(comment, cache.get(&comment.user)?));
        }
        if let Some(owner) = cache.get(&post.user)? {
            views.push(PostView::new(post, owner, comments));
        }
    }

    Ok(views)
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub async fn create_post(state: &AppState, user: &User, req: &Request) -> Result<Response, ApiError> {
    let body: CreatePostBody = read_json(req)?;
    let text = non_blank(body.text)
        .map(|t| sanitize_text(&t))
        .filter(|t| !t.trim().is_empty());
    let img = non_blank(body.img);

    if text.is_none() && img.is_none() {
        return Err(ApiError::validation("Post must have text or image"));
    }
    if text.as_ref().is_some_and(|t| t.chars().count() > MAX_POST_LENGTH) {
        return Err(ApiError::validation("Post text is too long"));
    }

    let img = match img {
        Some(data) => Some(state.images.upload(&data).await.map_err(ApiError::Upstream)?),
        None => None,
    };

    let now = Utc::now();
    let post = Post {
        id: new_id(),
        user: user.id.clone(),
        text,
        img,
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    insert_post(state.store.as_ref(), &post)?;
    info!(post_id = %post.id, user_id = %user.id, "post created");

    Ok(json_response(201, &post)?)
}

pub async fn delete_post(state: &AppState, user: &User, post_id: &str) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let post = get_post(store, post_id)?.ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.user != user.id {
        return Err(ApiError::auth("You are not authorized to delete this post"));
    }

    if let Some(img) = &post.img {
        discard_image(state.images.as_ref(), img).await;
    }

    remove_post(store, &post.id)?;

    for liker_id in &post.likes {
        if let Some(mut liker) = get_user(store, liker_id)? {
            if remove_id(&mut liker.liked_posts, &post.id) {
                save_user(store, &liker)?;
            }
        }
    }
    info!(post_id = %post.id, "post deleted");

    Ok(message_response(200, "Post deleted successfully")?)
}

pub fn comment_on_post(state: &AppState, user: &User, post_id: &str, req: &Request) -> Result<Response, ApiError> {
    let body: CommentBody = read_json(req)?;
    let text = non_blank(body.text)
        .map(|t| sanitize_text(t.trim()).trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Comment text is required"))?;

    let store = state.store.as_ref();
    let mut post = get_post(store, post_id)?.ok_or_else(|| ApiError::not_found("Post not found"))?;

    let now = Utc::now();
    post.comments.push(Comment {
        id: new_id(),
        user: user.id.clone(),
        text,
        created_at: now,
    });
    post.updated_at = now;
    save_post(store, &post)?;

    Ok(json_response(200, &post)?)
}

pub fn like_unlike_post(state: &AppState, user: &User, post_id: &str) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let mut post = get_post(store, post_id)?.ok_or_else(|| ApiError::not_found("Post not found"))?;
    let mut liker = user.clone();

    let liked = post.likes.iter().any(|id| *id == liker.id);
    if liked {
        remove_id(&mut post.likes, &liker.id);
        remove_id(&mut liker.liked_posts, &post.id);
    } else {
        add_id(&mut post.likes, &liker.id);
        add_id(&mut liker.liked_posts, &post.id);
    }
    post.updated_at = Utc::now();
    save_post(store, &post)?;
    save_user(store, &liker)?;

    if !liked && post.user != liker.id {
        notify(store, &liker.id, &post.user, NotificationType::Like)?;
    }

    Ok(json_response(200, &post.likes)?)
}

pub fn get_all_posts(state: &AppState) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let mut posts = all_posts(store)?;
    newest_first(&mut posts);
    Ok(json_response(200, &populate(store, &posts)?)?)
}

pub fn get_following_posts(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let mut posts: Vec<Post> = all_posts(store)?
        .into_iter()
        .filter(|p| user.following.contains(&p.user))
        .collect();
    newest_first(&mut posts);
    Ok(json_response(200, &populate(store, &posts)?)?)
}

pub fn get_user_posts(state: &AppState, username: &str) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let owner = find_user_by_username(store, username)?.ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut posts: Vec<Post> = all_posts(store)?
        .into_iter()
        .filter(|p| p.user == owner.id)
        .collect();
    newest_first(&mut posts);
    Ok(json_response(200, &populate(store, &posts)?)?)
}

/// Liked posts come back in the order they sit in the user's liked set.
pub fn get_liked_posts(state: &AppState, user_id: &str) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let user = get_user(store, user_id)?.ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut posts = Vec::with_capacity(user.liked_posts.len());
    for id in &user.liked_posts {
        if let Some(post) = get_post(store, id)? {
            posts.push(post);
        }
    }
    Ok(json_response(200, &populate(store, &posts)?)?)
}
