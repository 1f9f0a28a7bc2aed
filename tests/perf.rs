use std::time::Instant;

use chirp::config::Config;
use chirp::core::db::MemoryStore;
use chirp::images::DisabledImageHost;
use chirp::{router, AppState};
use serde_json::{json, Value};
use spin_sdk::http::{Method, Request, Response};

const NUM_USERS: usize = 100;
const POSTS_PER_USER: usize = 2;
const LOADED_USER_POSTS: usize = 200;

fn app() -> AppState {
    AppState::new(
        Config::new("perf-secret"),
        Box::new(MemoryStore::new()),
        Box::new(DisabledImageHost),
    )
}

async fn send(state: &AppState, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder();
    builder.method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder.header("cookie", cookie);
    }
    if let Some(body) = body {
        builder.body(serde_json::to_vec(&body).unwrap());
    }
    router::handle_request(state, builder.build()).await
}

async fn signup(state: &AppState, username: &str) -> Option<(String, String)> {
    let resp = send(
        state,
        Method::Post,
        "/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "fullName": username,
            "email": format!("{username}@perf.test"),
            "password": "password123",
        })),
    )
    .await;
    if *resp.status() != 201 {
        return None;
    }
    let body: Value = serde_json::from_slice(resp.body()).ok()?;
    let cookie = resp.header("set-cookie")?.as_str()?.split(';').next()?.to_string();
    Some((body["user"]["_id"].as_str()?.to_string(), cookie))
}

#[ignore]
#[tokio::test]
async fn perf_test_users_with_posts() {
    let state = app();
    let start = Instant::now();

    println!("\n=== Performance Test ===");
    println!("Creating {} users with {} posts each...", NUM_USERS, POSTS_PER_USER);

    let user_creation_start = Instant::now();
    let mut sessions = Vec::new();
    for i in 0..NUM_USERS {
        if let Some(session) = signup(&state, &format!("perf_user_{i}")).await {
            sessions.push(session);
        }
    }
    let user_creation_time = user_creation_start.elapsed();
    println!(
        "User creation done: {} users in {:.2}s ({:.2} users/sec)",
        sessions.len(),
        user_creation_time.as_secs_f64(),
        sessions.len() as f64 / user_creation_time.as_secs_f64()
    );

    let post_creation_start = Instant::now();
    let mut posts_created = 0;
    for (idx, (_, cookie)) in sessions.iter().enumerate() {
        for post_num in 0..POSTS_PER_USER {
            let text = format!("Post {} from user {}", post_num + 1, idx);
            let resp = send(&state, Method::Post, "/api/posts/create", Some(cookie), Some(json!({ "text": text }))).await;
            if *resp.status() == 201 {
                posts_created += 1;
            }
        }
    }
    let post_creation_time = post_creation_start.elapsed();

    let (_, cookie) = &sessions[0];
    let fetch_start = Instant::now();
    let all = send(&state, Method::Get, "/api/posts/all", Some(cookie), None).await;
    let fetch_time = fetch_start.elapsed();

    println!("\n=== Results ===");
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Post creation: {:.2}s", post_creation_time.as_secs_f64());
    println!("Posts created: {}", posts_created);
    println!("All posts fetch: {:.2}ms (status {})", fetch_time.as_secs_f64() * 1000.0, all.status());
    assert_eq!(posts_created, sessions.len() * POSTS_PER_USER);
}

#[ignore]
#[tokio::test]
async fn perf_test_following_feed_of_busy_user() {
    let state = app();

    println!("\n=== Following Feed Performance Test ===");
    let (bob_id, bob) = signup(&state, "bob").await.unwrap();
    let (_, reader) = signup(&state, "reader").await.unwrap();

    let post_creation_start = Instant::now();
    for post_num in 0..LOADED_USER_POSTS {
        let text = format!("Post {} - load test", post_num + 1);
        send(&state, Method::Post, "/api/posts/create", Some(&bob), Some(json!({ "text": text }))).await;
        if (post_num + 1) % 50 == 0 {
            println!("  Created {}/{} posts", post_num + 1, LOADED_USER_POSTS);
        }
    }
    println!("Post creation: {:.2}s", post_creation_start.elapsed().as_secs_f64());

    send(&state, Method::Post, &format!("/api/users/follow/{bob_id}"), Some(&reader), None).await;

    let fetch_start = Instant::now();
    let feed = send(&state, Method::Get, "/api/posts/following", Some(&reader), None).await;
    let fetch_time = fetch_start.elapsed();

    let posts: Value = serde_json::from_slice(feed.body()).unwrap();
    println!("Feed fetch time: {:.2}ms", fetch_time.as_secs_f64() * 1000.0);
    assert_eq!(posts.as_array().unwrap().len(), LOADED_USER_POSTS);
}
