//! Summary (manifest) parsing.
//!
//! A summary is any Markdown document; every inline link whose target ends in
//! `.md` becomes a chapter, in the order the links appear. Nothing else in the
//! document (headings, nesting, prose) affects the result.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static CHAPTER_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+\.md)\)").expect("chapter link regex is valid"));

/// One chapter listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    /// Display title, taken verbatim from the link text
    pub title: String,
    /// Path of the Markdown file, relative to the summary's directory
    pub source: PathBuf,
}

impl ChapterEntry {
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }
}

/// Extract all chapter links from the summary text.
///
/// Duplicates are kept; the referenced files are not checked for existence.
pub fn parse_manifest(text: &str) -> Vec<ChapterEntry> {
    CHAPTER_LINK
        .captures_iter(text)
        .map(|caps| ChapterEntry {
            title: caps[1].to_string(),
            source: PathBuf::from(&caps[2]),
        })
        .collect()
}
