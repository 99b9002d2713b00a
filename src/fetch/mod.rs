//! Transcript acquisition with ordered fallback.
//!
//! A [`Fetcher`] holds an ordered list of [`TranscriptStrategy`] values and
//! asks each in turn until one reports an available transcript. Strategies
//! never fail hard for a single video: anything that goes wrong is reported
//! as [`FetchOutcome::Unavailable`] with a reason, and the next strategy runs.

mod api;
mod browser;
mod cookies;
mod downloader;
mod watch_page;

pub use api::ApiStrategy;
pub use browser::{scrape_transcript_panel, BrowserStrategy};
pub use cookies::{cookie_header, load_cookie_header, parse_netscape_cookies, Cookie};
pub use downloader::{find_caption_file, DownloaderStrategy};
pub use watch_page::WatchPageCaptions;

use crate::config::Settings;
use crate::error::Result;
use crate::http::HttpClient;
use crate::series::SeriesPaths;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// The video a strategy is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub video_id: String,
    pub url: String,
}

impl VideoRef {
    pub fn new(video_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            url: url.into(),
        }
    }
}

/// What kind of source a strategy talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Public caption endpoints over HTTP.
    TranscriptApi,
    /// The external downloader, optionally with session cookies.
    AuthenticatedDownloader,
    /// A headless browser rendering the watch page.
    BrowserAutomation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::TranscriptApi => "transcript-api",
            Capability::AuthenticatedDownloader => "authenticated-downloader",
            Capability::BrowserAutomation => "browser-automation",
        };
        f.write_str(s)
    }
}

/// Result of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Normalized, non-empty transcript text.
    Available(String),
    /// Nothing usable from this source, with a human-readable reason.
    Unavailable(String),
}

impl FetchOutcome {
    /// Build an outcome from normalized text; empty text is unavailable.
    pub fn from_text(text: String, empty_reason: &str) -> Self {
        if text.trim().is_empty() {
            FetchOutcome::Unavailable(empty_reason.to_string())
        } else {
            FetchOutcome::Available(text)
        }
    }
}

/// Final result for one video. An empty transcript with no source means every
/// strategy came up empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub transcript: String,
    pub source: Option<String>,
}

impl FetchResult {
    pub fn empty() -> Self {
        Self {
            transcript: String::new(),
            source: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.trim().is_empty()
    }
}

/// One way of getting a transcript.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    fn capability(&self) -> Capability;

    /// Try to produce a normalized transcript for `video`.
    async fn fetch(&self, video: &VideoRef) -> FetchOutcome;
}

/// Ordered strategy list evaluated with early exit.
pub struct Fetcher {
    strategies: Vec<Box<dyn TranscriptStrategy>>,
}

impl Fetcher {
    pub fn new(strategies: Vec<Box<dyn TranscriptStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain (API, downloader, browser), minus disabled paths.
    pub fn from_settings(settings: &Settings, paths: &SeriesPaths, http: HttpClient) -> Result<Self> {
        let mut strategies: Vec<Box<dyn TranscriptStrategy>> = Vec::new();
        if settings.fetch.use_api {
            strategies.push(Box::new(ApiStrategy::new(&http, settings)?));
        }
        if settings.fetch.use_downloader {
            strategies.push(Box::new(DownloaderStrategy::new(
                http.clone(),
                settings,
                paths.subs_dir(),
            )?));
        }
        if settings.fetch.use_browser {
            strategies.push(Box::new(BrowserStrategy::new(http, settings)));
        }
        Ok(Self::new(strategies))
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Ask each strategy in order and return the first available transcript.
    #[instrument(skip(self, video), fields(video_id = %video.video_id))]
    pub async fn fetch(&self, video: &VideoRef) -> FetchResult {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), capability = %strategy.capability(), "trying");
            match strategy.fetch(video).await {
                FetchOutcome::Available(text) => {
                    info!(strategy = strategy.name(), chars = text.len(), "transcript found");
                    return FetchResult {
                        transcript: text,
                        source: Some(strategy.name().to_string()),
                    };
                }
                FetchOutcome::Unavailable(reason) => {
                    debug!(strategy = strategy.name(), %reason, "unavailable");
                }
            }
        }
        warn!(video_id = %video.video_id, "no transcript from any source");
        FetchResult::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeSettings;
    use crate::transcript::normalize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        capability: Capability,
        outcome: FetchOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(
            name: &'static str,
            capability: Capability,
            outcome: FetchOutcome,
        ) -> (Box<dyn TranscriptStrategy>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = Scripted {
                name,
                capability,
                outcome,
                calls: calls.clone(),
            };
            (Box::new(strategy), calls)
        }
    }

    #[async_trait]
    impl TranscriptStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn capability(&self) -> Capability {
            self.capability
        }

        async fn fetch(&self, _video: &VideoRef) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn video() -> VideoRef {
        VideoRef::new("abcdefghijk", "https://www.youtube.com/watch?v=abcdefghijk")
    }

    #[tokio::test]
    async fn test_falls_through_to_downloader_and_stops() {
        let payload = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nhello from the downloader.\n";
        let expected = normalize(payload, &NormalizeSettings::default());

        let (a, a_calls) = Scripted::boxed(
            "api",
            Capability::TranscriptApi,
            FetchOutcome::Unavailable("no tracks".into()),
        );
        let (b, b_calls) = Scripted::boxed(
            "downloader",
            Capability::AuthenticatedDownloader,
            FetchOutcome::from_text(expected.clone(), "empty"),
        );
        let (c, c_calls) = Scripted::boxed(
            "browser",
            Capability::BrowserAutomation,
            FetchOutcome::Available("should not be used".into()),
        );

        let fetcher = Fetcher::new(vec![a, b, c]);
        let result = fetcher.fetch(&video()).await;

        assert_eq!(result.transcript, expected);
        assert_eq!(result.transcript, "hello from the downloader.\n");
        assert_eq!(result.source.as_deref(), Some("downloader"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_unavailable_gives_empty_marker() {
        let (a, _) = Scripted::boxed(
            "api",
            Capability::TranscriptApi,
            FetchOutcome::Unavailable("x".into()),
        );
        let (c, c_calls) = Scripted::boxed(
            "browser",
            Capability::BrowserAutomation,
            FetchOutcome::from_text(String::new(), "blank page"),
        );
        let result = Fetcher::new(vec![a, c]).fetch(&video()).await;
        assert_eq!(result, FetchResult::empty());
        assert!(result.is_empty());
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_settings_honours_toggles() {
        let mut settings = Settings::default();
        settings.fetch.use_downloader = false;
        let tmp = tempfile::tempdir().unwrap();
        let paths = SeriesPaths::new(tmp.path().to_path_buf(), "demo", None);
        let http = HttpClient::new(&settings.youtube).unwrap();
        let fetcher = Fetcher::from_settings(&settings, &paths, http).unwrap();
        assert_eq!(fetcher.strategy_names(), vec!["api", "browser"]);
    }
}
