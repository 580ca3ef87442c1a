//! Media reference validation for prompt attachment.
//!
//! The text backend only accepts image inputs, and a dead or non-image
//! URL must never block reply generation. Validation is a quick HEAD
//! probe; anything that fails it is dropped silently.

use reqwest::Client;

/// Extensions that identify a non-image asset without a network call.
const NON_IMAGE_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "webm", "mkv", "m4v", "mp3", "wav", "ogg", "m4a", "aac", "flac",
];

fn has_non_image_extension(url: &url::Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NON_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

/// Confirm that `raw_url` points at a reachable image. Returns the URL
/// back when it may be attached to the prompt, `None` otherwise.
pub async fn validate_image_url(client: &Client, raw_url: &str) -> Option<String> {
    let parsed = match url::Url::parse(raw_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
        _ => {
            tracing::debug!(url = raw_url, "media reference dropped: not a valid http url");
            return None;
        }
    };

    if has_non_image_extension(&parsed) {
        tracing::debug!(url = raw_url, "media reference dropped: non-image extension");
        return None;
    }

    let response = match client.head(parsed.clone()).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!(
                url = raw_url,
                status = %response.status(),
                "media reference dropped: unreachable"
            );
            return None;
        }
        Err(e) => {
            tracing::debug!(url = raw_url, "media reference dropped: {e}");
            return None;
        }
    };

    let is_image = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.trim_start().starts_with("image/"));

    if is_image {
        Some(raw_url.to_string())
    } else {
        tracing::debug!(url = raw_url, "media reference dropped: not an image content type");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        Client::new()
    }

    #[tokio::test]
    async fn accepts_reachable_image() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/p1.jpg"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .mount(&server)
            .await;

        let url = format!("{}/p1.jpg", server.uri());
        assert_eq!(validate_image_url(&client(), &url).await, Some(url.clone()));
    }

    #[tokio::test]
    async fn rejects_video_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .mount(&server)
            .await;

        let url = format!("{}/clip", server.uri());
        assert!(validate_image_url(&client(), &url).await.is_none());
    }

    #[tokio::test]
    async fn rejects_video_extension_without_network_call() {
        // No mock mounted: a HEAD request would fail loudly, but the
        // extension check short-circuits first.
        let out = validate_image_url(&client(), "https://cdn.example.com/reel.mp4").await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn rejects_unreachable_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone.jpg", server.uri());
        assert!(validate_image_url(&client(), &url).await.is_none());
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        assert!(validate_image_url(&client(), "not a url").await.is_none());
        assert!(validate_image_url(&client(), "ftp://example.com/a.jpg").await.is_none());
    }
}
