//! Summary to book assembly.
//!
//! Walks the summary's chapters in order, rendering each one and staging the
//! images it references. A chapter that cannot be read is reported and
//! skipped; it never stops the run or disturbs the other chapters.

use crate::book::{markdown, AssetWarning, Book, Metadata, RenderedChapter};
use crate::source::{ChapterEntry, Source};
use indicatif::ProgressBar;
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// A recoverable problem met while assembling the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The chapter's file does not exist, so the chapter was left out
    MissingChapter { title: String, path: PathBuf },
    /// The chapter's file exists but is not readable UTF-8 text
    UnreadableChapter {
        title: String,
        path: PathBuf,
        error: String,
    },
    /// An image in a chapter could not be embedded
    Image {
        chapter: PathBuf,
        warning: AssetWarning,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingChapter { title, path } => {
                write!(f, "{} ({title}) not found, skipping", path.display())
            }
            Warning::UnreadableChapter { title, path, error } => write!(
                f,
                "{} ({title}) could not be read: {error}, skipping",
                path.display()
            ),
            Warning::Image { chapter, warning } => write!(f, "{}: {warning}", chapter.display()),
        }
    }
}

/// The outcome of assembling a book.
#[derive(Debug)]
pub struct Conversion {
    pub book: Book,
    pub warnings: Vec<Warning>,
}

/// Assemble a book from every readable chapter in the summary.
///
/// Warnings are printed above the progress bar as they happen and also
/// returned, in the order they were met.
pub fn assemble(
    source: &Source,
    metadata: Metadata,
    stylesheet: String,
    progress: &ProgressBar,
) -> Conversion {
    let mut book = Book::new(metadata, stylesheet);
    let mut warnings = Vec::new();

    for (index, entry) in source.chapters.iter().enumerate() {
        progress.set_message(entry.title.clone());
        let found = add_chapter(&mut book, source, index, entry);
        for warning in found {
            report(progress, &warning);
            warnings.push(warning);
        }
        progress.inc(1);
    }

    Conversion { book, warnings }
}

fn add_chapter(
    book: &mut Book,
    source: &Source,
    index: usize,
    entry: &ChapterEntry,
) -> Vec<Warning> {
    let path = source.chapter_path(entry);
    if !path.is_file() {
        return vec![Warning::MissingChapter {
            title: entry.title.clone(),
            path: entry.source.clone(),
        }];
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            return vec![Warning::UnreadableChapter {
                title: entry.title.clone(),
                path: entry.source.clone(),
                error: e.to_string(),
            }]
        }
    };

    let body = markdown::render(&text);
    let chapter_dir = path.parent().unwrap_or(Path::new(""));
    let warnings = book
        .assets_mut()
        .resolve(&body, chapter_dir)
        .into_iter()
        .map(|warning| Warning::Image {
            chapter: entry.source.clone(),
            warning,
        })
        .collect();

    debug!("rendered {} as chapter {index}", entry.source.display());
    book.add_chapter(RenderedChapter {
        index,
        title: entry.title.clone(),
        body,
    });
    warnings
}

fn report(progress: &ProgressBar, warning: &Warning) {
    warn!("{warning}");
    progress.println(format!("{}: {warning}", console::style("Warning").yellow()));
}
