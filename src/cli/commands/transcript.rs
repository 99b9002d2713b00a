//! Transcript command - one video, or a local caption file, to plain text.

use crate::cli::output::preview;
use crate::cli::Output;
use crate::config::Settings;
use crate::fetch::{Fetcher, VideoRef};
use crate::http::HttpClient;
use crate::series::SeriesPaths;
use crate::transcript::normalize;
use crate::youtube::{extract_video_id, watch_url};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the transcript command.
pub async fn run_transcript(input: &str, output: Option<PathBuf>, settings: Settings) -> Result<()> {
    let text = if Path::new(input).is_file() {
        let payload = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {input}"))?;
        normalize(&payload, &settings.normalize)
    } else {
        fetch_one(input, &settings).await?
    };

    if text.is_empty() {
        anyhow::bail!("no transcript available for {input}");
    }

    match output {
        Some(path) => {
            crate::series::write_atomic(&path, text.as_bytes())?;
            Output::success(&format!("Saved transcript to {}", path.display()));
            Output::kv("Preview", &preview(&text, 120));
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn fetch_one(input: &str, settings: &Settings) -> Result<String> {
    let video_id = extract_video_id(input)
        .ok_or_else(|| anyhow::anyhow!("not a video id, URL or caption file: {input}"))?;

    // Caption files from the downloader path land in a scratch directory.
    let scratch = tempfile::tempdir()?;
    let paths = SeriesPaths::new(scratch.path().to_path_buf(), "transcript", None);
    let http = HttpClient::new(&settings.youtube)?;
    let url = watch_url(http.base_url(), &video_id);
    let fetcher = Fetcher::from_settings(settings, &paths, http)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {video_id}..."));
    let result = fetcher.fetch(&VideoRef::new(video_id.as_str(), url)).await;
    spinner.finish_and_clear();

    if let Some(source) = &result.source {
        Output::info(&format!("Transcript from the {source} path"));
    }
    Ok(result.transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_caption_file_is_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        let vtt = tmp.path().join("talk.en.vtt");
        std::fs::write(
            &vtt,
            "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nHello and welcome.\n",
        )
        .unwrap();
        let out = tmp.path().join("talk.txt");

        run_transcript(
            &vtt.to_string_lossy(),
            Some(out.clone()),
            Settings::default(),
        )
        .await
        .unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Hello and welcome.\n");
    }

    #[test]
    fn test_bad_input_is_rejected() {
        let result = tokio_test::block_on(fetch_one("not a video", &Settings::default()));
        assert!(result.is_err());
    }
}
