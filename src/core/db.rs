//! Document storage: a flat key → JSON document map plus the record helpers
//! every handler goes through.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use spin_sdk::key_value::Store;

use crate::models::models::{Notification, Post, User};

pub const USERS_LIST_KEY: &str = "users_list";
pub const FEED_KEY: &str = "feed";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn username_key(username: &str) -> String {
    format!("username:{}", username)
}

pub fn email_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn notification_key(id: &str) -> String {
    format!("notification:{}", id)
}

pub fn inbox_key(user_id: &str) -> String {
    format!("notifications:{}", user_id)
}

pub trait DocumentStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

pub trait DocumentStoreExt: DocumentStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        self.set(key, &serde_json::to_vec(value)?)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

impl DocumentStore for Store {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Store::get(self, key).map_err(|e| anyhow!("key-value get {key}: {e:?}"))
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        Store::set(self, key, value).map_err(|e| anyhow!("key-value set {key}: {e:?}"))
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        Store::delete(self, key).map_err(|e| anyhow!("key-value delete {key}: {e:?}"))
    }
}

/// Process-local store for the native server and tests. Clones share data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let docs = self.docs.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(docs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        docs.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        docs.remove(key);
        Ok(())
    }
}

// === Id lists ===

pub fn get_list(store: &dyn DocumentStore, key: &str) -> anyhow::Result<Vec<String>> {
    Ok(store.get_json(key)?.unwrap_or_default())
}

/// Adds `id` to the list at `key` unless present. `front` puts it first.
pub fn list_add(store: &dyn DocumentStore, key: &str, id: &str, front: bool) -> anyhow::Result<()> {
    let mut ids = get_list(store, key)?;
    if ids.iter().any(|existing| existing == id) {
        return Ok(());
    }
    if front {
        ids.insert(0, id.to_string());
    } else {
        ids.push(id.to_string());
    }
    store.set_json(key, &ids)
}

pub fn list_remove(store: &dyn DocumentStore, key: &str, id: &str) -> anyhow::Result<()> {
    let mut ids = get_list(store, key)?;
    let before = ids.len();
    ids.retain(|existing| existing != id);
    if ids.len() != before {
        store.set_json(key, &ids)?;
    }
    Ok(())
}

/// Set-style insert on an in-memory id vector. Returns whether it changed.
pub fn add_id(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|existing| existing == id) {
        false
    } else {
        ids.push(id.to_string());
        true
    }
}

pub fn remove_id(ids: &mut Vec<String>, id: &str) -> bool {
    let before = ids.len();
    ids.retain(|existing| existing != id);
    ids.len() != before
}

// === Users ===

pub fn get_user(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<User>> {
    store.get_json(&user_key(id))
}

pub fn save_user(store: &dyn DocumentStore, user: &User) -> anyhow::Result<()> {
    store.set_json(&user_key(&user.id), user)
}

pub fn find_user_by_username(store: &dyn DocumentStore, username: &str) -> anyhow::Result<Option<User>> {
    match store.get_json::<String>(&username_key(username))? {
        Some(id) => get_user(store, &id),
        None => Ok(None),
    }
}

pub fn find_user_by_email(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
    match store.get_json::<String>(&email_key(email))? {
        Some(id) => get_user(store, &id),
        None => Ok(None),
    }
}

/// Persists a new user with its unique indexes. Uniqueness is checked by
/// the caller.
pub fn insert_user(store: &dyn DocumentStore, user: &User) -> anyhow::Result<()> {
    save_user(store, user)?;
    store.set_json(&username_key(&user.username), &user.id)?;
    store.set_json(&email_key(&user.email), &user.id)?;
    list_add(store, USERS_LIST_KEY, &user.id, false)
}

/// Moves the unique index entries when username or email change.
pub fn reindex_user(store: &dyn DocumentStore, before: &User, after: &User) -> anyhow::Result<()> {
    if before.username != after.username {
        store.delete(&username_key(&before.username))?;
        store.set_json(&username_key(&after.username), &after.id)?;
    }
    if email_key(&before.email) != email_key(&after.email) {
        store.delete(&email_key(&before.email))?;
        store.set_json(&email_key(&after.email), &after.id)?;
    }
    Ok(())
}

pub fn all_users(store: &dyn DocumentStore) -> anyhow::Result<Vec<User>> {
    let mut users = Vec::new();
    for id in get_list(store, USERS_LIST_KEY)? {
        if let Some(user) = get_user(store, &id)? {
            users.push(user);
        }
    }
    Ok(users)
}

// === Posts ===

pub fn get_post(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<Post>> {
    store.get_json(&post_key(id))
}

pub fn save_post(store: &dyn DocumentStore, post: &Post) -> anyhow::Result<()> {
    store.set_json(&post_key(&post.id), post)
}

pub fn insert_post(store: &dyn DocumentStore, post: &Post) -> anyhow::Result<()> {
    save_post(store, post)?;
    list_add(store, FEED_KEY, &post.id, true)
}

pub fn remove_post(store: &dyn DocumentStore, id: &str) -> anyhow::Result<()> {
    store.delete(&post_key(id))?;
    list_remove(store, FEED_KEY, id)
}

pub fn all_posts(store: &dyn DocumentStore) -> anyhow::Result<Vec<Post>> {
    let mut posts = Vec::new();
    for id in get_list(store, FEED_KEY)? {
        if let Some(post) = get_post(store, &id)? {
            posts.push(post);
        }
    }
    Ok(posts)
}

// === Notifications ===

pub fn insert_notification(store: &dyn DocumentStore, notification: &Notification) -> anyhow::Result<()> {
    store.set_json(&notification_key(&notification.id), notification)?;
    list_add(store, &inbox_key(&notification.to), &notification.id, true)
}

pub fn save_notification(store: &dyn DocumentStore, notification: &Notification) -> anyhow::Result<()> {
    store.set_json(&notification_key(&notification.id), notification)
}

pub fn notifications_for(store: &dyn DocumentStore, user_id: &str) -> anyhow::Result<Vec<Notification>> {
    let mut notifications = Vec::new();
    for id in get_list(store, &inbox_key(user_id))? {
        if let Some(n) = store.get_json::<Notification>(&notification_key(&id))? {
            notifications.push(n);
        }
    }
    Ok(notifications)
}

pub fn clear_notifications(store: &dyn DocumentStore, user_id: &str) -> anyhow::Result<usize> {
    let inbox = inbox_key(user_id);
    let ids = get_list(store, &inbox)?;
    for id in &ids {
        store.delete(&notification_key(id))?;
    }
    store.delete(&inbox)?;
    Ok(ids.len())
}
