//! Hosted image storage. Posts and profiles keep only the URL the host
//! hands back.

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::warn;

use crate::config::CloudinaryConfig;

#[async_trait(?Send)]
pub trait ImageHost {
    /// Uploads `image` (a data URI or remote URL) and returns its public URL.
    async fn upload(&self, image: &str) -> anyhow::Result<String>;

    /// Removes a previously uploaded image, addressed by its URL.
    async fn destroy(&self, url: &str) -> anyhow::Result<()>;
}

/// Best-effort removal; a failure is logged and otherwise ignored.
pub async fn discard_image(images: &dyn ImageHost, url: &str) {
    if let Err(err) = images.destroy(url).await {
        warn!(%url, "could not remove hosted image: {err:#}");
    }
}

/// Used when no image credentials are configured.
pub struct DisabledImageHost;

#[async_trait(?Send)]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _image: &str) -> anyhow::Result<String> {
        bail!("image hosting is not configured")
    }

    async fn destroy(&self, url: &str) -> anyhow::Result<()> {
        bail!("image hosting is not configured, cannot remove {url}")
    }
}

#[derive(Clone)]
pub struct CloudinaryHost {
    config: CloudinaryConfig,
    #[cfg(not(target_arch = "wasm32"))]
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            #[cfg(not(target_arch = "wasm32"))]
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }

    /// Builds the urlencoded body for a signed API call. `params` are the
    /// signed parameters; `file` is sent but not signed.
    fn signed_form(&self, mut params: Vec<(&str, String)>, file: Option<&str>) -> String {
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        let signature = sign_params(&params, &self.config.api_secret);

        let mut fields: Vec<(&str, String)> = params;
        fields.push(("api_key", self.config.api_key.clone()));
        fields.push(("signature", signature));
        if let Some(file) = file {
            fields.push(("file", file.to_string()));
        }

        fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn post_form(&self, url: &str, body: String) -> anyhow::Result<(u16, Vec<u8>)> {
        let resp = self
            .client
            .post(url)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.bytes().await?.to_vec()))
    }

    #[cfg(target_arch = "wasm32")]
    async fn post_form(&self, url: &str, body: String) -> anyhow::Result<(u16, Vec<u8>)> {
        use spin_sdk::http::{Method, Request, Response};

        let req = Request::builder()
            .method(Method::Post)
            .uri(url)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.into_bytes())
            .build();
        let resp: Response = spin_sdk::http::send(req)
            .await
            .map_err(|e| anyhow!("outbound request to {url} failed: {e:?}"))?;
        Ok((*resp.status(), resp.body().to_vec()))
    }
}

#[async_trait(?Send)]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: &str) -> anyhow::Result<String> {
        let body = self.signed_form(Vec::new(), Some(image));
        let (status, bytes) = self.post_form(&self.endpoint("upload"), body).await?;
        if !(200..300).contains(&status) {
            bail!("image upload rejected with status {status}");
        }
        let parsed: UploadResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.secure_url)
    }

    async fn destroy(&self, url: &str) -> anyhow::Result<()> {
        let public_id = public_id_from_url(url).ok_or_else(|| anyhow!("no public id in {url}"))?;
        let body = self.signed_form(vec![("public_id", public_id)], None);
        let (status, bytes) = self.post_form(&self.endpoint("destroy"), body).await?;
        if !(200..300).contains(&status) {
            bail!("image destroy rejected with status {status}");
        }
        let parsed: DestroyResponse = serde_json::from_slice(&bytes)?;
        if parsed.result != "ok" {
            bail!("image destroy returned {}", parsed.result);
        }
        Ok(())
    }
}

/// SHA-1 over `k=v` pairs sorted by key and joined with `&`, followed by
/// the API secret.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// The hosted id is the last path segment with its extension dropped.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let id = last.split('.').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_is_last_segment_without_extension() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1712/abc123.jpg").as_deref(),
            Some("abc123")
        );
        assert_eq!(public_id_from_url("https://host/x/plain").as_deref(), Some("plain"));
        assert_eq!(public_id_from_url("https://host/x/y.png?v=2").as_deref(), Some("y"));
        assert_eq!(public_id_from_url("https://host/x/"), None);
    }

    #[test]
    fn signature_ignores_param_order() {
        let a = sign_params(
            &[("timestamp", "1315060510".into()), ("public_id", "sample".into())],
            "abcd",
        );
        let b = sign_params(
            &[("public_id", "sample".into()), ("timestamp", "1315060510".into())],
            "abcd",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        let other_secret = sign_params(&[("public_id", "sample".into())], "efgh");
        assert_ne!(a, other_secret);
    }

    #[test]
    fn signed_form_carries_credentials() {
        let host = CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key123".into(),
            api_secret: "secret".into(),
        });
        let form = host.signed_form(vec![("public_id", "abc".into())], Some("data:image/png;base64,AA+/"));
        assert!(form.contains("public_id=abc"));
        assert!(form.contains("api_key=key123"));
        assert!(form.contains("signature="));
        assert!(form.contains("file=data%3Aimage%2Fpng%3Bbase64%2CAA%2B%2F"));
        assert!(!form.contains("secret"));
        assert_eq!(host.endpoint("upload"), "https://api.cloudinary.com/v1_1/demo/image/upload");
    }
}
