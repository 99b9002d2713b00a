//! List command - configured series and how far along they are.

use crate::book::list_chapters;
use crate::cli::Output;
use crate::config::Settings;
use crate::series::SeriesRecord;

/// Run the list command.
pub fn run_list(settings: &Settings) -> anyhow::Result<()> {
    if settings.series.is_empty() {
        Output::info("No series configured. Add one with: talkbook init --series <slug> --playlist <id>");
        return Ok(());
    }

    Output::header(&format!("Series ({})", settings.series.len()));
    println!();

    for series in &settings.series {
        let paths = settings.series_paths(series);
        let record = SeriesRecord::load(&paths.talks_path()).ok();
        let (talks, transcripts) = record
            .as_ref()
            .map(|r| {
                (
                    r.talks.len(),
                    r.talks.iter().filter(|t| !t.needs_placeholder()).count(),
                )
            })
            .unwrap_or((0, 0));
        let chapters = list_chapters(&paths.content_dir())
            .map(|c| c.len())
            .unwrap_or(0);

        Output::series_info(&series.slug, &series.title, talks, transcripts, chapters);
        if paths.book_path().exists() {
            Output::kv("book", &paths.book_path().display().to_string());
        }
    }
    Ok(())
}
