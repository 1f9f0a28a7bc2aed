use chrono::{Duration, Utc};
use tracing::info;

use crate::core::db::{find_user_by_username, insert_post, insert_user, DocumentStore};
use crate::core::helpers::{hash_password, new_id};
use crate::follow::follow_user;
use crate::models::models::{Post, User};

const DEMO_USERS: [(&str, &str, &str); 3] = [
    ("test", "Test User", "Test user bio"),
    ("alice", "Alice", "Hello, I'm Alice!"),
    ("bob", "Bob", "Bob's corner of the internet"),
];

const DEMO_POSTS: [(&str, &str); 4] = [
    ("test", "This is my first post!"),
    ("alice", "Welcome to my feed! Excited to share thoughts here."),
    ("alice", "Just finished an amazing project. Feeling productive today!"),
    ("bob", "Hey everyone! Just joined, looking forward to connecting with you all."),
];

/// Seeds demo accounts (password: username + "123"), a few posts, and
/// `test` following `bob`. Accounts that already exist are left alone.
pub fn init_demo_data(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let mut created = Vec::new();
    for (username, full_name, bio) in DEMO_USERS {
        if find_user_by_username(store, username)?.is_some() {
            continue;
        }
        let mut user = User::new(
            new_id(),
            username.to_string(),
            full_name.to_string(),
            format!("{username}@example.com"),
            hash_password(&format!("{username}123"))?,
        );
        user.bio = bio.to_string();
        insert_user(store, &user)?;
        created.push(username);
    }

    let base = Utc::now() - Duration::minutes(DEMO_POSTS.len() as i64);
    for (offset, (username, text)) in DEMO_POSTS.iter().enumerate() {
        if !created.contains(username) {
            continue;
        }
        let Some(owner) = find_user_by_username(store, username)? else {
            continue;
        };
        let at = base + Duration::minutes(offset as i64);
        insert_post(
            store,
            &Post {
                id: new_id(),
                user: owner.id,
                text: Some(text.to_string()),
                img: None,
                likes: Vec::new(),
                comments: Vec::new(),
                created_at: at,
                updated_at: at,
            },
        )?;
    }

    if let (Some(mut test), Some(mut bob)) = (
        find_user_by_username(store, "test")?,
        find_user_by_username(store, "bob")?,
    ) {
        follow_user(store, &mut test, &mut bob)?;
    }

    info!(created = created.len(), "demo data ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::{all_posts, MemoryStore};

    #[test]
    fn seeding_is_idempotent_and_consistent() {
        let store = MemoryStore::new();
        init_demo_data(&store).unwrap();
        init_demo_data(&store).unwrap();

        assert_eq!(all_posts(&store).unwrap().len(), DEMO_POSTS.len());

        let test = find_user_by_username(&store, "test").unwrap().unwrap();
        let bob = find_user_by_username(&store, "bob").unwrap().unwrap();
        assert_eq!(test.following, vec![bob.id.clone()]);
        assert_eq!(bob.followers, vec![test.id.clone()]);
    }
}
