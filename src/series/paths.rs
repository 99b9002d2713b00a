//! Filesystem layout of a series.

use std::path::{Path, PathBuf};

/// Resolved locations for one series under the project root.
#[derive(Debug, Clone)]
pub struct SeriesPaths {
    root: PathBuf,
    slug: String,
    metadata: Option<PathBuf>,
}

impl SeriesPaths {
    pub fn new(root: PathBuf, slug: &str, metadata: Option<PathBuf>) -> Self {
        Self {
            root,
            slug: slug.to_string(),
            metadata,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// `data/<slug>`
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data").join(&self.slug)
    }

    /// Caption cache used by the downloader path.
    pub fn subs_dir(&self) -> PathBuf {
        self.data_dir().join("subs")
    }

    pub fn videos_path(&self) -> PathBuf {
        self.data_dir().join("videos.json")
    }

    pub fn talks_path(&self) -> PathBuf {
        self.data_dir().join("talks.json")
    }

    /// `content/<slug>`, one Markdown file per chapter.
    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content").join(&self.slug)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build").join(&self.slug)
    }

    pub fn book_path(&self) -> PathBuf {
        self.build_dir().join("book.md")
    }

    pub fn metadata_path(&self) -> Option<&Path> {
        self.metadata.as_deref()
    }

    /// Create the directory tree if missing.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            self.data_dir(),
            self.subs_dir(),
            self.content_dir(),
            self.build_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SeriesPaths::new(tmp.path().to_path_buf(), "demo", None);
        paths.ensure().unwrap();
        assert!(paths.subs_dir().is_dir());
        assert!(paths.content_dir().is_dir());
        assert!(paths.build_dir().is_dir());
        assert!(paths.metadata_path().is_none());
    }
}
