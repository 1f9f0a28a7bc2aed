use anyhow::Context;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_BIO_LENGTH: usize = 500;
pub const SUGGESTED_USERS_LIMIT: usize = 4;

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Adds `Secure` to the session cookie.
    pub secure_cookies: bool,
    pub cors_origin: Option<String>,
    pub max_body_bytes: usize,
    pub cloudinary: Option<CloudinaryConfig>,
    pub port: u16,
    pub seed_demo: bool,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_days: 15,
            secure_cookies: false,
            cors_origin: None,
            max_body_bytes: 5 * 1024 * 1024,
            cloudinary: None,
            port: 3000,
            seed_demo: false,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("CHIRP_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .context("CHIRP_JWT_SECRET must be set")?;

        let defaults = Self::new(jwt_secret);
        let cloudinary = match (
            env_string("CLOUDINARY_CLOUD_NAME"),
            env_string("CLOUDINARY_API_KEY"),
            env_string("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            token_ttl_days: env_parse("CHIRP_TOKEN_TTL_DAYS").unwrap_or(defaults.token_ttl_days),
            secure_cookies: env_flag("CHIRP_SECURE_COOKIES"),
            cors_origin: env_string("CHIRP_CORS_ORIGIN"),
            max_body_bytes: env_parse("CHIRP_MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            cloudinary,
            port: env_parse("CHIRP_PORT").unwrap_or(defaults.port),
            seed_demo: env_flag("CHIRP_SEED_DEMO"),
            ..defaults
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

fn env_flag(key: &str) -> bool {
    env_string(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new("s");
        assert_eq!(config.token_ttl_days, 15);
        assert_eq!(config.token_ttl(), chrono::Duration::days(15));
        assert_eq!(config.max_body_bytes, 5 * 1024 * 1024);
        assert!(config.cloudinary.is_none());
        assert!(!config.secure_cookies);
    }
}
