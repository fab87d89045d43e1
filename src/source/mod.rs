mod manifest;
pub use manifest::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Everything we need to know about the Markdown sources to render them as a book
#[derive(Debug, Default)]
pub struct Source {
    /// Directory that chapter paths in the summary are relative to
    pub root: PathBuf,

    /// The chapters listed in the summary, in reading order
    pub chapters: Vec<ChapterEntry>,
}

impl Source {
    /// Read and parse the summary file.
    ///
    /// This is the only fatal step of loading: a missing chapter is dealt with
    /// later, when the chapter is rendered.
    pub fn load<P: AsRef<Path>>(summary: P) -> Result<Source> {
        let summary = summary.as_ref();
        let contents = std::fs::read_to_string(summary)
            .with_context(|| format!("Failed to read summary file {}", summary.display()))?;

        let root = summary
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Source {
            root,
            chapters: parse_manifest(&contents),
        })
    }

    /// Location of a chapter's Markdown file on disk.
    pub fn chapter_path(&self, chapter: &ChapterEntry) -> PathBuf {
        self.root.join(chapter.source())
    }
}
