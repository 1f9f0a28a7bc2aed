use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use spin_sdk::http::{Request, Response};
use uuid::Uuid;

use crate::core::errors::ApiError;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("Regex should compile"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Strips every HTML tag, leaving plain text. Entities produced by the
/// cleaner are decoded again so `&`, `<` and `>` come back as typed.
pub fn sanitize_text(text: &str) -> String {
    let cleaned = Builder::default()
        .tags(HashSet::new())
        .clean(text)
        .to_string();
    html_escape::decode_html_entities(&cleaned).into_owned()
}

/// Treats `None`, `""` and whitespace-only input the same way.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn read_json<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    let body = req.body();
    let body = if body.is_empty() { b"{}".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|_| ApiError::validation("Invalid JSON body"))
}

pub fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_vec(value)?)
        .build())
}

pub fn json_response_with_cookie<T: Serialize + ?Sized>(
    status: u16,
    value: &T,
    cookie: &str,
) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("set-cookie", cookie)
        .body(serde_json::to_vec(value)?)
        .build())
}

pub fn message_response(status: u16, message: &str) -> anyhow::Result<Response> {
    json_response(status, &serde_json::json!({ "message": message }))
}

/// Decodes a percent-encoded path segment, falling back to the raw text.
pub fn path_param(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn sanitize_strips_markup() {
        assert_eq!(sanitize_text("hello <b>world</b>"), "hello world");
        assert_eq!(sanitize_text("<script>alert(1)</script>plain"), "plain");
        assert_eq!(sanitize_text("just words"), "just words");
    }

    #[test]
    fn sanitize_keeps_plain_punctuation() {
        assert_eq!(sanitize_text("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(sanitize_text("5 > 3 && 2 < 4"), "5 > 3 && 2 < 4");
        assert_eq!(sanitize_text("https://x.io/?a=1&b=2"), "https://x.io/?a=1&b=2");
        assert_eq!(sanitize_text("say \"hi\" <i>now</i>"), "say \"hi\" now");
        assert_eq!(sanitize_text("<b></b>"), "");
    }

    #[test]
    fn blank_values_collapse_to_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("hi".into())), Some("hi".into()));
    }

    #[test]
    fn path_params_are_decoded() {
        assert_eq!(path_param("ada%20lovelace"), "ada lovelace");
        assert_eq!(path_param("plain"), "plain");
    }
}
