//! Caption tracks read straight from a watch page, for sessions that need cookies.

use super::{FetchOutcome, VideoRef};
use crate::config::{NormalizeSettings, Settings};
use crate::error::Result;
use crate::http::HttpClient;
use crate::transcript::normalize;
use crate::youtube::{caption_tracks, player_response, select_track};
use tracing::{debug, instrument};

/// Reads caption tracks from the watch page and downloads the best one.
pub struct WatchPageCaptions {
    http: HttpClient,
    languages: Vec<String>,
    normalize: NormalizeSettings,
}

impl WatchPageCaptions {
    pub fn new(http: HttpClient, settings: &Settings) -> Self {
        Self {
            http,
            languages: settings.youtube.languages.clone(),
            normalize: settings.normalize.clone(),
        }
    }

    /// Fetch through the watch page, sending `cookie` as the `Cookie` header when set.
    #[instrument(skip(self, cookie), fields(video_id = %video.video_id))]
    pub async fn fetch(&self, video: &VideoRef, cookie: Option<&str>) -> Result<FetchOutcome> {
        let watch = self
            .http
            .url(&format!("/watch?v={}&hl=en", video.video_id));
        let html = self.http.get_text_with_cookies(&watch, cookie).await?;

        if let Some(pr) = player_response(&html) {
            let tracks = caption_tracks(&pr);
            debug!(tracks = tracks.len(), "caption tracks on watch page");
            if let Some(choice) = select_track(&tracks, &self.languages) {
                debug!(
                    language = %choice.track.language_code,
                    auto = choice.track.auto_generated,
                    translated = choice.translated,
                    "selected track"
                );
                let payload = self
                    .http
                    .get_text_with_cookies(&self.http.url(&choice.url), cookie)
                    .await?;
                let text = normalize(&payload, &self.normalize);
                if !text.is_empty() {
                    return Ok(FetchOutcome::Available(text));
                }
            }
        }

        Ok(FetchOutcome::Unavailable("no caption track".to_string()))
    }
}
