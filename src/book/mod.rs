//! In-memory model of the book being built.
//!
//! A `Book` is assembled once per run from the summary's chapters and is then
//! handed to a sink for serialization. It knows nothing about any container
//! format.

pub mod assets;
pub mod markdown;

pub use assets::{AssetRegistry, AssetWarning};

use serde::{Deserialize, Serialize};

/// Book-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Metadata {
    /// Unique identifier of the publication
    pub identifier: String,
    pub title: String,
    pub author: String,
    /// Language code (BCP 47 format, e.g. "zh", "en-GB")
    pub language: String,
    /// Description for the package metadata. Empty string for none.
    pub description: String,
    /// Subject/keywords for the package metadata. Empty string for none.
    pub subject: String,
    /// Heading of the table of contents page and navigation documents
    pub toc_title: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            identifier: "children-safety-book-id-2026".to_string(),
            title: "儿童安全书".to_string(),
            author: "Contributors".to_string(),
            language: "zh".to_string(),
            description: String::new(),
            subject: String::new(),
            toc_title: "目录".to_string(),
        }
    }
}

impl Metadata {
    pub fn description_opt(&self) -> Option<&str> {
        Some(self.description.as_str()).filter(|s| !s.is_empty())
    }

    pub fn subject_opt(&self) -> Option<&str> {
        Some(self.subject.as_str()).filter(|s| !s.is_empty())
    }
}

/// One chapter rendered to an XHTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChapter {
    /// Position of the chapter's entry in the summary
    pub index: usize,
    pub title: String,
    /// Rendered body, without the title heading
    pub body: String,
}

impl RenderedChapter {
    /// Name of the chapter's document inside the package.
    pub fn file_name(&self) -> String {
        format!("chap_{}.xhtml", self.index)
    }
}

/// The whole book: metadata, chapters in reading order, images and styling.
#[derive(Debug)]
pub struct Book {
    pub metadata: Metadata,
    /// CSS shared by every chapter
    pub stylesheet: String,
    chapters: Vec<RenderedChapter>,
    assets: AssetRegistry,
}

impl Book {
    pub fn new<S: Into<String>>(metadata: Metadata, stylesheet: S) -> Book {
        Book {
            metadata,
            stylesheet: stylesheet.into(),
            chapters: Vec::new(),
            assets: AssetRegistry::default(),
        }
    }

    /// Append a chapter to the end of the reading order.
    pub fn add_chapter(&mut self, chapter: RenderedChapter) -> &mut Self {
        self.chapters.push(chapter);
        self
    }

    pub fn chapters(&self) -> &[RenderedChapter] {
        &self.chapters
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }
}
