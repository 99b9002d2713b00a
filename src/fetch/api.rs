//! Path A: the public transcript API, through `yt-transcript-rs`.
//!
//! Preferred languages are tried first (manual tracks before generated ones).
//! Failing that, the original-language track is used, and as a last resort
//! that track auto-translated to English.

use super::{Capability, FetchOutcome, TranscriptStrategy, VideoRef};
use crate::config::{NormalizeSettings, Settings};
use crate::error::{Result, TalkbookError};
use crate::http::HttpClient;
use crate::transcript::{normalize_cues, Cue};
use async_trait::async_trait;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;
use yt_transcript_rs::FetchedTranscript;

/// Transcript API client with the configured language preference.
pub struct ApiStrategy {
    api: YouTubeTranscriptApi,
    client: reqwest::Client,
    languages: Vec<String>,
    normalize: NormalizeSettings,
}

impl ApiStrategy {
    pub fn new(http: &HttpClient, settings: &Settings) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| TalkbookError::Config(format!("transcript api: {e}")))?;

        Ok(Self {
            api,
            client: http.client().clone(),
            languages: settings.youtube.languages.clone(),
            normalize: settings.normalize.clone(),
        })
    }

    fn text(&self, fetched: &FetchedTranscript) -> String {
        debug!(
            language = %fetched.language_code,
            generated = fetched.is_generated,
            snippets = fetched.snippets.len(),
            "transcript fetched"
        );
        let cues = cues_from_snippets(
            fetched
                .snippets
                .iter()
                .map(|s| (s.text.as_str(), s.start, s.duration)),
        );
        normalize_cues(&cues, &self.normalize)
    }

    /// Original-language track, then its English translation.
    async fn fallback(&self, video_id: &str) -> std::result::Result<String, String> {
        let list = self
            .api
            .list_transcripts(video_id)
            .await
            .map_err(|e| e.to_string())?;

        // The generated track is the one in the spoken language.
        let original = list
            .transcripts()
            .find(|t| t.is_generated)
            .or_else(|| list.transcripts().next())
            .ok_or_else(|| "no transcripts listed".to_string())?;

        match original.fetch(&self.client, false).await {
            Ok(fetched) => {
                let text = self.text(&fetched);
                if !text.is_empty() {
                    return Ok(text);
                }
            }
            Err(e) => debug!(error = %e, "original-language track failed"),
        }

        if !original.is_translatable() {
            return Err("original track is not translatable".to_string());
        }
        let english = original.translate("en").map_err(|e| e.to_string())?;
        let fetched = english
            .fetch(&self.client, false)
            .await
            .map_err(|e| e.to_string())?;
        Ok(self.text(&fetched))
    }
}

/// Turn `(text, start, duration)` snippets into caption cues.
pub(crate) fn cues_from_snippets<'a>(
    snippets: impl IntoIterator<Item = (&'a str, f64, f64)>,
) -> Vec<Cue> {
    snippets
        .into_iter()
        .filter(|(text, _, _)| !text.trim().is_empty())
        .map(|(text, start, duration)| Cue::new(start, start + duration, text.to_string()))
        .collect()
}

#[async_trait]
impl TranscriptStrategy for ApiStrategy {
    fn name(&self) -> &str {
        "api"
    }

    fn capability(&self) -> Capability {
        Capability::TranscriptApi
    }

    #[instrument(skip_all, fields(video_id = %video.video_id))]
    async fn fetch(&self, video: &VideoRef) -> FetchOutcome {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        match self
            .api
            .fetch_transcript(&video.video_id, &languages, false)
            .await
        {
            Ok(fetched) => {
                let text = self.text(&fetched);
                if !text.is_empty() {
                    return FetchOutcome::Available(text);
                }
            }
            Err(e) => debug!(error = %e, "no transcript in preferred languages"),
        }

        match self.fallback(&video.video_id).await {
            Ok(text) if !text.is_empty() => FetchOutcome::Available(text),
            Ok(_) => FetchOutcome::Unavailable("transcript api: empty transcript".to_string()),
            Err(reason) => FetchOutcome::Unavailable(format!("transcript api: {reason}")),
        }
    }
}
