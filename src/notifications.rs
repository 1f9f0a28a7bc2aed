use std::collections::HashMap;

use chrono::Utc;
use spin_sdk::http::Response;
use tracing::debug;

use crate::core::db::{clear_notifications, get_user, insert_notification, notifications_for, save_notification, DocumentStore};
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response, new_id};
use crate::models::models::{Notification, NotificationType, User};
use crate::models::views::NotificationView;
use crate::AppState;

pub fn notify(store: &dyn DocumentStore, from: &str, to: &str, kind: NotificationType) -> anyhow::Result<Notification> {
    let now = Utc::now();
    let notification = Notification {
        id: new_id(),
        from: from.to_string(),
        to: to.to_string(),
        kind,
        read: false,
        created_at: now,
        updated_at: now,
    };
    insert_notification(store, &notification)?;
    debug!(from, to, ?kind, "notification stored");
    Ok(notification)
}

/// Lists the caller's notifications, newest first, then marks them read.
/// The response reflects the state before marking.
pub fn get_notifications(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let mut notifications = notifications_for(store, &user.id)?;
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut senders: HashMap<String, Option<User>> = HashMap::new();
    let mut views = Vec::with_capacity(notifications.len());
    for n in &notifications {
        if !senders.contains_key(&n.from) {
            senders.insert(n.from.clone(), get_user(store, &n.from)?);
        }
        let sender = senders.get(&n.from).and_then(|u| u.as_ref());
        views.push(NotificationView::new(n, sender));
    }

    let now = Utc::now();
    for n in notifications.iter_mut().filter(|n| !n.read) {
        n.read = true;
        n.updated_at = now;
        save_notification(store, n)?;
    }

    Ok(json_response(200, &views)?)
}

pub fn delete_notifications(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let removed = clear_notifications(state.store.as_ref(), &user.id)?;
    debug!(user_id = %user.id, removed, "notifications cleared");
    Ok(message_response(200, "Notifications deleted successfully")?)
}
