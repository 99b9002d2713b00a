//! Playlist resolution and listing.

use super::page::{find_key, initial_data, text_from_runs};
use super::{extract_playlist_id, extract_video_id};
use crate::config::{SeriesConfig, ToolSettings};
use crate::error::{Result, TalkbookError};
use crate::http::HttpClient;
use crate::series::VideoEntry;
use crate::tools;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Turns a series configuration into an ordered list of videos.
pub struct Discovery {
    http: HttpClient,
    yt_dlp: String,
}

impl Discovery {
    pub fn new(http: HttpClient, tools: &ToolSettings) -> Self {
        Self {
            http,
            yt_dlp: tools::yt_dlp_program(tools),
        }
    }

    /// Resolve the playlist id: explicit id or URL, else a search by query.
    #[instrument(skip_all, fields(series = %series.slug))]
    pub async fn resolve_playlist(&self, series: &SeriesConfig) -> Result<String> {
        if let Some(raw) = series.playlist_id.as_deref().filter(|s| !s.trim().is_empty()) {
            return extract_playlist_id(raw).ok_or_else(|| {
                TalkbookError::InvalidInput(format!("not a playlist id or URL: {raw}"))
            });
        }

        let query = series
            .playlist_query
            .clone()
            .unwrap_or_else(|| series.title.clone());
        if query.trim().is_empty() {
            return Err(TalkbookError::Discovery(
                "no playlist id or search query configured".to_string(),
            ));
        }

        let url = self.http.url(&format!(
            "/results?search_query={}",
            url::form_urlencoded::byte_serialize(format!("{query} playlist").as_bytes())
                .collect::<String>()
        ));
        let html = self.http.get_text(&url).await?;
        let data = initial_data(&html).ok_or_else(|| {
            TalkbookError::Discovery("search page carried no ytInitialData".to_string())
        })?;

        best_playlist(&data, &query).ok_or_else(|| {
            TalkbookError::Discovery(format!("no playlist found for query \"{query}\""))
        })
    }

    /// List the videos of a playlist, page scrape first, then `yt-dlp --flat-playlist`.
    #[instrument(skip(self))]
    pub async fn playlist_videos(&self, playlist_id: &str) -> Result<Vec<VideoEntry>> {
        let url = self.http.url(&format!("/playlist?list={playlist_id}"));
        match self.http.get_text(&url).await {
            Ok(html) => {
                let videos = initial_data(&html)
                    .map(|data| playlist_entries(&data, self.http.base_url()))
                    .unwrap_or_default();
                if !videos.is_empty() {
                    info!(count = videos.len(), "listed playlist from page");
                    return Ok(videos);
                }
                warn!("playlist page had no entries, trying yt-dlp");
            }
            Err(e) => warn!(error = %e, "playlist page fetch failed, trying yt-dlp"),
        }

        let videos = self.flat_playlist(&url).await?;
        if videos.is_empty() {
            return Err(TalkbookError::Discovery(format!(
                "playlist {playlist_id} has no videos"
            )));
        }
        info!(count = videos.len(), "listed playlist with yt-dlp");
        Ok(videos)
    }

    async fn flat_playlist(&self, playlist_url: &str) -> Result<Vec<VideoEntry>> {
        let cmd = tools::command(
            &self.yt_dlp,
            [
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--flat-playlist",
                playlist_url,
            ],
        );
        let output = tools::run(&self.yt_dlp, cmd).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_flat_playlist(&stdout, self.http.base_url()))
    }
}

/// Score a playlist title by how many query words it contains.
fn score_title(title: &str, query: &str) -> usize {
    let title = title.to_lowercase();
    let words: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| w != "playlist")
        .collect();
    let mut score: usize = words.iter().filter(|w| title.contains(w.as_str())).count();
    if title.contains(&query.to_lowercase()) {
        score += words.len();
    }
    score
}

/// Pick the best-scoring playlist from search or channel page data.
pub fn best_playlist(data: &Value, query: &str) -> Option<String> {
    let mut candidates: Vec<(String, usize)> = Vec::new();
    for key in ["playlistRenderer", "gridPlaylistRenderer"] {
        for renderer in find_key(data, key) {
            let Some(id) = renderer["playlistId"].as_str() else {
                continue;
            };
            let title = text_from_runs(&renderer["title"]);
            if title.is_empty() {
                continue;
            }
            candidates.push((id.to_string(), score_title(&title, query)));
        }
    }
    // Stable sort keeps page order among ties.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates.into_iter().next().map(|(id, _)| id)
}

/// Videos from playlist page data, deduplicated, in page order.
pub fn playlist_entries(data: &Value, base_url: &str) -> Vec<VideoEntry> {
    let mut seen = HashSet::new();
    find_key(data, "playlistVideoRenderer")
        .into_iter()
        .filter_map(|r| {
            let video_id = r["videoId"].as_str()?.to_string();
            let title = text_from_runs(&r["title"]);
            if title.is_empty() {
                return None;
            }
            Some(VideoEntry {
                url: format!("{}/watch?v={}", base_url.trim_end_matches('/'), video_id),
                video_id,
                title,
            })
        })
        .filter(|v| seen.insert(v.video_id.clone()))
        .collect()
}

/// One JSON object per line, as printed by `yt-dlp --flat-playlist --dump-json`.
pub fn parse_flat_playlist(stdout: &str, base_url: &str) -> Vec<VideoEntry> {
    let mut seen = HashSet::new();
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|json| {
            let video_id = json["id"]
                .as_str()
                .and_then(extract_video_id)
                .or_else(|| json["url"].as_str().and_then(extract_video_id))?;
            let title = json["title"].as_str().unwrap_or("Untitled").to_string();
            Some(VideoEntry {
                url: format!("{}/watch?v={}", base_url.trim_end_matches('/'), video_id),
                video_id,
                title,
            })
        })
        .filter(|v| seen.insert(v.video_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YoutubeSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PLAYLIST_PAGE: &str = r#"<html><script>var ytInitialData = {"contents":{"list":[
        {"playlistVideoRenderer":{"videoId":"aaaaaaaaaaa","title":{"runs":[{"text":"First Talk by Jane Doe"}]}}},
        {"playlistVideoRenderer":{"videoId":"bbbbbbbbbbb","title":{"simpleText":"Second Talk"}}},
        {"playlistVideoRenderer":{"videoId":"aaaaaaaaaaa","title":{"simpleText":"First Talk by Jane Doe"}}}
    ]}};</script></html>"#;

    fn discovery(base: &str) -> Discovery {
        let http = HttpClient::new(&YoutubeSettings {
            base_url: base.to_string(),
            retries: 1,
            ..Default::default()
        })
        .unwrap();
        Discovery::new(http, &ToolSettings::default())
    }

    #[test]
    fn test_best_playlist_prefers_matching_title() {
        let data: Value = serde_json::from_str(
            r#"{"a":[{"playlistRenderer":{"playlistId":"PLother","title":{"simpleText":"Cooking"}}},
                     {"playlistRenderer":{"playlistId":"PLmatch","title":{"simpleText":"AI Startup School 2025"}}}]}"#,
        )
        .unwrap();
        assert_eq!(best_playlist(&data, "AI Startup School").as_deref(), Some("PLmatch"));
    }

    #[test]
    fn test_parse_flat_playlist() {
        let out = "{\"id\":\"ccccccccccc\",\"title\":\"Talk C\"}\nnot json\n{\"url\":\"https://www.youtube.com/watch?v=ddddddddddd\"}\n";
        let videos = parse_flat_playlist(out, "https://www.youtube.com");
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "Talk C");
        assert_eq!(videos[1].video_id, "ddddddddddd");
        assert_eq!(videos[1].title, "Untitled");
    }

    #[tokio::test]
    async fn test_playlist_videos_from_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlist"))
            .and(query_param("list", "PLtest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PLAYLIST_PAGE))
            .mount(&server)
            .await;

        let videos = discovery(&server.uri()).playlist_videos("PLtest").await.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].video_id, "aaaaaaaaaaa");
        assert_eq!(videos[1].title, "Second Talk");
        assert!(videos[0].url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn test_resolve_playlist_prefers_configured_id() {
        let mut series = SeriesConfig::new("demo");
        series.playlist_id = Some("https://www.youtube.com/playlist?list=PLfixed".to_string());
        let id = discovery("http://127.0.0.1:9").resolve_playlist(&series).await.unwrap();
        assert_eq!(id, "PLfixed");
    }
}
