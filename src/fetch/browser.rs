//! Path C: a headless browser renders the watch page.
//!
//! The driver is any command that prints the rendered HTML of the URL given as
//! its last argument (by default Chromium with `--dump-dom`). Caption-track
//! metadata in the rendered page is preferred; otherwise transcript-panel
//! segments present in the DOM are scraped.

use super::{Capability, FetchOutcome, TranscriptStrategy, VideoRef};
use crate::config::{NormalizeSettings, Settings};
use crate::error::Result;
use crate::http::HttpClient;
use crate::tools;
use crate::transcript::{normalize, normalize_cues, parse_timestamp, Cue};
use crate::youtube::{caption_tracks, player_response, select_track};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

static SEGMENT_SELECTORS: LazyLock<Vec<(Selector, Selector, Selector)>> = LazyLock::new(|| {
    [
        (
            "ytd-transcript-segment-renderer",
            ".segment-text",
            ".segment-timestamp",
        ),
        (
            "transcript-segment-view-model",
            ".yt-core-attributed-string",
            ".ytwTranscriptSegmentViewModelTimestamp",
        ),
    ]
    .into_iter()
    .map(|(seg, text, ts)| {
        (
            Selector::parse(seg).expect("valid selector"),
            Selector::parse(text).expect("valid selector"),
            Selector::parse(ts).expect("valid selector"),
        )
    })
    .collect()
});

/// Runs the browser driver under a hard per-video timeout.
pub struct BrowserStrategy {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    http: HttpClient,
    languages: Vec<String>,
    normalize: NormalizeSettings,
}

impl BrowserStrategy {
    pub fn new(http: HttpClient, settings: &Settings) -> Self {
        Self {
            program: Settings::expand_path(&settings.tools.browser)
                .to_string_lossy()
                .into_owned(),
            args: settings.tools.browser_args.clone(),
            timeout: Duration::from_secs(settings.fetch.browser_timeout_seconds.max(1)),
            http,
            languages: settings.youtube.languages.clone(),
            normalize: settings.normalize.clone(),
        }
    }

    async fn render(&self, url: &str) -> Result<String> {
        let mut args = self.args.clone();
        args.push(url.to_string());
        let cmd = tools::command(&self.program, &args);
        let output = tools::run_with_timeout(&self.program, cmd, self.timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn from_rendered(&self, html: &str) -> Result<FetchOutcome> {
        if let Some(pr) = player_response(html) {
            let tracks = caption_tracks(&pr);
            if let Some(choice) = select_track(&tracks, &self.languages) {
                debug!(language = %choice.track.language_code, "track from rendered page");
                match self.http.get_text(&self.http.url(&choice.url)).await {
                    Ok(payload) => {
                        let text = normalize(&payload, &self.normalize);
                        if !text.is_empty() {
                            return Ok(FetchOutcome::Available(text));
                        }
                    }
                    Err(e) => warn!(error = %e, "caption download from rendered page failed"),
                }
            }
        }

        let text = scrape_transcript_panel(html, &self.normalize);
        Ok(FetchOutcome::from_text(
            text,
            "rendered page has no captions or transcript panel",
        ))
    }
}

#[async_trait]
impl TranscriptStrategy for BrowserStrategy {
    fn name(&self) -> &str {
        "browser"
    }

    fn capability(&self) -> Capability {
        Capability::BrowserAutomation
    }

    #[instrument(skip_all, fields(video_id = %video.video_id))]
    async fn fetch(&self, video: &VideoRef) -> FetchOutcome {
        let html = match self.render(&video.url).await {
            Ok(html) => html,
            Err(e) => return FetchOutcome::Unavailable(format!("browser: {e}")),
        };
        match self.from_rendered(&html).await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::Unavailable(format!("browser: {e}")),
        }
    }
}

/// Scrape transcript-panel segments from rendered HTML into normalized text.
pub fn scrape_transcript_panel(html: &str, settings: &NormalizeSettings) -> String {
    let document = Html::parse_document(html);

    for (segment, text_sel, ts_sel) in SEGMENT_SELECTORS.iter() {
        let cues: Vec<Cue> = document
            .select(segment)
            .filter_map(|seg| {
                let text: String = seg
                    .select(text_sel)
                    .next()
                    .map(|t| t.text().collect())
                    .unwrap_or_else(|| seg.text().collect());
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    return None;
                }
                let start = seg
                    .select(ts_sel)
                    .next()
                    .and_then(|t| parse_timestamp(t.text().collect::<String>().trim()))
                    .unwrap_or(0.0);
                Some(Cue::new(start, start, text))
            })
            .collect();

        if !cues.is_empty() {
            debug!(segments = cues.len(), "scraped transcript panel");
            return normalize_cues(&cues, settings);
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = r#"<html><body><ytd-transcript-segment-list-renderer>
        <ytd-transcript-segment-renderer>
          <div class="segment-timestamp"> 0:01 </div>
          <yt-formatted-string class="segment-text">Thanks for having me.</yt-formatted-string>
        </ytd-transcript-segment-renderer>
        <ytd-transcript-segment-renderer>
          <div class="segment-timestamp">0:04</div>
          <yt-formatted-string class="segment-text">[Music]</yt-formatted-string>
        </ytd-transcript-segment-renderer>
        <ytd-transcript-segment-renderer>
          <div class="segment-timestamp">0:05</div>
          <yt-formatted-string class="segment-text">Today I want to talk
            about &amp; around agents.</yt-formatted-string>
        </ytd-transcript-segment-renderer>
    </ytd-transcript-segment-list-renderer></body></html>"#;

    #[test]
    fn test_scrape_transcript_panel() {
        let text = scrape_transcript_panel(PANEL, &NormalizeSettings::default());
        assert_eq!(text, "Thanks for having me. Today I want to talk about & around agents.\n");
    }

    #[test]
    fn test_page_without_panel_is_empty() {
        let html = "<html><body>nothing</body></html>";
        let text = scrape_transcript_panel(html, &NormalizeSettings::default());
        assert!(text.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_driver_output_is_scraped() {
        let tmp = tempfile::tempdir().unwrap();
        let page = tmp.path().join("page.html");
        std::fs::write(&page, PANEL).unwrap();

        let mut settings = Settings::default();
        settings.tools.browser = "cat".to_string();
        settings.tools.browser_args = vec![page.to_string_lossy().into_owned()];
        settings.youtube.retries = 1;
        let http = HttpClient::new(&settings.youtube).unwrap();
        let strategy = BrowserStrategy::new(http, &settings);

        // `cat <page> <url>` fails on the URL argument, so point it at /dev/null.
        let video = VideoRef::new("abcdefghijk", "/dev/null");
        match strategy.fetch(&video).await {
            FetchOutcome::Available(text) => assert!(text.starts_with("Thanks for having me.")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_driver_is_unavailable() {
        let mut settings = Settings::default();
        settings.tools.browser = "talkbook-no-browser".to_string();
        let http = HttpClient::new(&settings.youtube).unwrap();
        let strategy = BrowserStrategy::new(http, &settings);
        let video = VideoRef::new("abcdefghijk", "https://www.youtube.com/watch?v=abcdefghijk");
        assert!(matches!(strategy.fetch(&video).await, FetchOutcome::Unavailable(_)));
    }
}
