//! CLI module for Talkbook.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::orchestrator::Stage;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Talkbook - turn a YouTube playlist of talks into a Markdown book
///
/// Discovers the videos of a playlist, fetches their transcripts through
/// several fallback paths, and writes one polished chapter per talk.
#[derive(Parser, Debug)]
#[command(name = "talkbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TALKBOOK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// The series a command works on.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// Series slug as configured in `[[series]]`
    pub series: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the configuration file and optionally register a series
    Init {
        /// Slug of a series to add
        #[arg(long)]
        series: Option<String>,

        /// Playlist id or URL for the new series
        #[arg(long, requires = "series")]
        playlist: Option<String>,

        /// Book title for the new series
        #[arg(long, requires = "series")]
        title: Option<String>,

        /// Answer yes to every prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check external tools and configuration
    Doctor,

    /// List configured series and their progress
    List,

    /// Resolve the playlist and save its video list
    Discover(SeriesArgs),

    /// Fetch transcripts for the series' videos
    Fetch {
        #[command(flatten)]
        series: SeriesArgs,

        /// Only fetch these video ids (repeatable)
        #[arg(long = "video")]
        videos: Vec<String>,

        /// Fetch at most this many videos
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fill in missing dates and URLs and clean transcripts
    Enrich(SeriesArgs),

    /// Write one chapter file per talk
    Ingest {
        #[command(flatten)]
        series: SeriesArgs,

        /// Regenerate chapters that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Copy-edit chapter prose
    Polish {
        #[command(flatten)]
        series: SeriesArgs,

        /// Polish a single chapter file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Assemble chapters into book.md
    Build(SeriesArgs),

    /// Convert book.md with pandoc
    Export {
        #[command(flatten)]
        series: SeriesArgs,

        /// Output format (epub, pdf, docx, html); repeatable
        #[arg(short, long = "format")]
        formats: Vec<String>,
    },

    /// Run the whole pipeline for a series
    Update {
        #[command(flatten)]
        series: SeriesArgs,

        /// Skip a stage (repeatable)
        #[arg(long = "skip", value_enum)]
        skip: Vec<Stage>,

        /// Run a single stage
        #[arg(long, value_enum, conflicts_with = "skip")]
        only: Option<Stage>,

        /// Only fetch these video ids (repeatable)
        #[arg(long = "video")]
        videos: Vec<String>,

        /// Fetch at most this many videos
        #[arg(long)]
        limit: Option<usize>,

        /// Regenerate chapters that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Fetch and print the transcript of a single video
    Transcript {
        /// YouTube URL or video id
        input: String,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_flags() {
        let cli = Cli::try_parse_from([
            "talkbook", "update", "demo", "--skip", "discover", "--skip", "export", "--video",
            "abcdefghijk",
        ])
        .unwrap();
        match cli.command {
            Commands::Update {
                series,
                skip,
                videos,
                ..
            } => {
                assert_eq!(series.series, "demo");
                assert_eq!(skip, vec![Stage::Discover, Stage::Export]);
                assert_eq!(videos, vec!["abcdefghijk"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_only_conflicts_with_skip() {
        let result =
            Cli::try_parse_from(["talkbook", "update", "demo", "--skip", "fetch", "--only", "build"]);
        assert!(result.is_err());
    }
}
