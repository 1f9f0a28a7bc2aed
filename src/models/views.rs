//! Response shapes. Stored records carry the password hash; nothing in here
//! does, so handlers only ever serialize these.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{Comment, Notification, NotificationType, Post, User};

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub profile_img: String,
    pub cover_img: String,
    pub bio: String,
    pub link: String,
    pub liked_posts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            followers: user.followers.clone(),
            following: user.following.clone(),
            profile_img: user.profile_img.clone(),
            cover_img: user.cover_img.clone(),
            bio: user.bio.clone(),
            link: user.link.clone(),
            liked_posts: user.liked_posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The slice of a user shown next to a comment.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub profile_img: String,
}

impl From<&User> for CommentAuthor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            profile_img: user.profile_img.clone(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    /// `None` when the author record is gone.
    pub user: Option<CommentAuthor>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: &Comment, author: Option<&User>) -> Self {
        Self {
            id: comment.id.clone(),
            user: author.map(CommentAuthor::from),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(post: &Post, owner: &User, comments: Vec<CommentView>) -> Self {
        Self {
            id: post.id.clone(),
            user: PublicUser::from(owner),
            text: post.text.clone(),
            img: post.img.clone(),
            likes: post.likes.clone(),
            comments,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSender {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub profile_img: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(rename = "_id")]
    pub id: String,
    pub from: Option<NotificationSender>,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationView {
    pub fn new(notification: &Notification, sender: Option<&User>) -> Self {
        Self {
            id: notification.id.clone(),
            from: sender.map(|u| NotificationSender {
                id: u.id.clone(),
                username: u.username.clone(),
                profile_img: u.profile_img.clone(),
            }),
            to: notification.to.clone(),
            kind: notification.kind,
            read: notification.read,
            created_at: notification.created_at,
            updated_at: notification.updated_at,
        }
    }
}
