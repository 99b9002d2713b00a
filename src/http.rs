//! Shared HTTP client for YouTube pages and caption endpoints.

use crate::config::YoutubeSettings;
use crate::error::{Result, TalkbookError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use std::time::Duration;
use tracing::{debug, warn};

/// Pause between retry attempts.
const RETRY_DELAY_MS: u64 = 500;

/// Thin wrapper around `reqwest::Client` with retry and a configurable base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl HttpClient {
    /// Build a client from the `[youtube]` settings.
    pub fn new(settings: &YoutubeSettings) -> Result<Self> {
        Self::with_timeout(
            settings,
            Duration::from_secs(settings.request_timeout_seconds),
        )
    }

    /// Build a client with a custom timeout.
    pub fn with_timeout(settings: &YoutubeSettings, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retries: settings.retries.max(1),
        })
    }

    /// The underlying `reqwest` client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Site root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a site-relative path such as `/watch?v=...`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// GET a page as text, retrying transport errors and 5xx responses.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with_cookies(url, None).await
    }

    /// GET with an optional raw `Cookie` header value.
    pub async fn get_text_with_cookies(&self, url: &str, cookies: Option<&str>) -> Result<String> {
        let mut last_err: Option<TalkbookError> = None;

        for attempt in 1..=self.retries {
            let mut request = self.client.get(url);
            if let Some(cookie) = cookies.filter(|c| !c.is_empty()) {
                request = request.header(COOKIE, cookie);
            }

            match request.send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    warn!(url, status = %resp.status(), attempt, "server error");
                    last_err = Some(TalkbookError::Discovery(format!(
                        "{} returned {}",
                        url,
                        resp.status()
                    )));
                }
                Ok(resp) => {
                    let resp = resp.error_for_status()?;
                    let body = resp.text().await?;
                    debug!(url, bytes = body.len(), "fetched");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(url, error = %e, attempt, "request failed");
                    last_err = Some(e.into());
                }
            }

            if attempt < self.retries {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| TalkbookError::Discovery(format!("no response from {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str) -> YoutubeSettings {
        YoutubeSettings {
            base_url: base.to_string(),
            retries: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_url_joins_relative_paths() {
        let client = HttpClient::new(&settings("https://example.test/")).unwrap();
        assert_eq!(client.url("/watch?v=x"), "https://example.test/watch?v=x");
        assert_eq!(client.url("https://other.test/a"), "https://other.test/a");
    }

    #[tokio::test]
    async fn test_get_text_sends_cookie_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("cookie", "SID=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&settings(&server.uri())).unwrap();
        let body = client
            .get_text_with_cookies(&client.url("/page"), Some("SID=abc"))
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_get_text_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpClient::new(&settings(&server.uri())).unwrap();
        assert!(client.get_text(&client.url("/down")).await.is_err());
    }
}
