//! Social feed backend: signup/login with cookie sessions, posts with likes
//! and comments, follow relationships, notifications and profiles, served as
//! a JSON API.
//!
//! The crate builds as a Spin HTTP component (key-value store as the
//! document store) and as a native actix-web server (`src/bin/main.rs`, in
//! memory store). Both hand requests to [`router::handle_request`].

pub mod auth;
pub mod config;
pub mod core;
pub mod follow;
pub mod images;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod router;
pub mod users;

use crate::config::Config;
use crate::core::db::DocumentStore;
use crate::images::{CloudinaryHost, DisabledImageHost, ImageHost};

/// Everything a handler needs, built once at startup and passed down.
pub struct AppState {
    pub config: Config,
    pub store: Box<dyn DocumentStore>,
    pub images: Box<dyn ImageHost>,
}

impl AppState {
    pub fn new(config: Config, store: Box<dyn DocumentStore>, images: Box<dyn ImageHost>) -> Self {
        Self { config, store, images }
    }

    /// Picks the image host from the Cloudinary credentials in `config`.
    pub fn with_configured_images(config: Config, store: Box<dyn DocumentStore>) -> Self {
        let images: Box<dyn ImageHost> = match config.cloudinary.clone() {
            Some(cloudinary) => Box::new(CloudinaryHost::new(cloudinary)),
            None => Box::new(DisabledImageHost),
        };
        Self::new(config, store, images)
    }
}

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
}

#[cfg(target_arch = "wasm32")]
mod component {
    use spin_sdk::http::{IntoResponse, Request};
    use spin_sdk::http_component;
    use spin_sdk::key_value::Store;

    use crate::config::Config;
    use crate::{init_tracing, router, AppState};

    #[http_component]
    async fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
        init_tracing();
        let config = Config::from_env()?;
        let store = Store::open_default()?;
        let state = AppState::with_configured_images(config, Box::new(store));
        Ok(router::handle_request(&state, req).await)
    }
}
