//! HS256 session tokens in compact JWT form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::models::models::TokenClaims;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("signing key rejected")]
    InvalidKey,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

fn mac(secret: &str) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)
}

pub fn issue(secret: &str, user_id: &str, ttl: Duration) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        user_id: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    sign(secret, &claims)
}

pub fn sign(secret: &str, claims: &TokenClaims) -> anyhow::Result<String> {
    let header = URL_SAFE_NO_PAD.encode(HEADER);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac = mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

pub fn verify(secret: &str, token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header).map_err(|_| TokenError::Malformed)?;
    let parsed: Header = serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
    if parsed.alg != "HS256" {
        return Err(TokenError::Malformed);
    }

    let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| TokenError::Malformed)?;
    let mut mac = mac(secret)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_verifies() {
        let token = issue(SECRET, "user-1", Duration::days(15)).unwrap();
        let claims = verify(SECRET, &token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(SECRET, "user-1", Duration::days(1)).unwrap();
        assert_eq!(verify("other-secret", &token), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = issue(SECRET, "user-1", Duration::days(1)).unwrap();
        let forged_claims = TokenClaims {
            user_id: "user-2".into(),
            iat: 0,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(verify(SECRET, &forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = TokenClaims {
            user_id: "user-1".into(),
            iat: Utc::now().timestamp() - 100,
            exp: Utc::now().timestamp() - 10,
        };
        let token = sign(SECRET, &claims).unwrap();
        assert_eq!(verify(SECRET, &token), Err(TokenError::Expired));
    }

    #[test]
    fn any_secret_length_signs() {
        for secret in ["", "k", &"long-secret".repeat(40)] {
            let token = issue(secret, "user-1", Duration::days(1)).unwrap();
            assert_eq!(verify(secret, &token).unwrap().user_id, "user-1");
        }
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(verify(SECRET, "abc"), Err(TokenError::Malformed));
        assert_eq!(verify(SECRET, "a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(verify(SECRET, ""), Err(TokenError::Malformed));
    }
}
