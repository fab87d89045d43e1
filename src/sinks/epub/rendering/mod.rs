//! EPUB rendering orchestration.
//!
//! Serializes a `Book` with the `epub-builder` crate, which handles the EPUB
//! packaging requirements (OPF manifest, EPUB 3 navigation document, legacy
//! NCX, ZIP structure with the uncompressed MIME type entry). The reading
//! order is the generated navigation page followed by every chapter; the
//! table of contents lists the chapters only.

mod chapter;
mod toc;

use super::config::{RenderStats, EPUB};
use crate::book::Book;
use anyhow::{anyhow, Context, Result};
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ReferenceType, ZipLibrary};
use indicatif::ProgressBar;
use log::{debug, info};
use std::fmt::Display;
use uuid::Uuid;

/// `epub-builder` reports errors as `eyre::Report`, which does not implement
/// `std::error::Error`; convert at the call site so `?` stays on `anyhow`.
trait EpubContext<T> {
    fn epub_context<C, F>(self, context: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> EpubContext<T> for epub_builder::Result<T> {
    fn epub_context<C, F>(self, context: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| anyhow!("{e:#}")).with_context(context)
    }
}

impl EPUB {
    /// Render the book to an EPUB file.
    ///
    /// The package is generated in memory and only written once complete, so
    /// a failure never leaves a partial book behind.
    ///
    /// Returns statistics about the generated EPUB.
    pub fn render(&self, book: &Book, progress: &ProgressBar) -> Result<RenderStats> {
        progress.set_message("Generating EPUB...");

        let zip = ZipLibrary::new().epub_context(|| "Failed to create ZIP library for EPUB")?;
        let mut builder = EpubBuilder::new(zip).epub_context(|| "Failed to build builder")?;
        builder.epub_version(EpubVersion::V30);

        // set metadata
        let metadata = &book.metadata;
        builder
            .metadata("title", &metadata.title)
            .epub_context(|| "Failed to set title metadata")?;
        builder
            .metadata("author", &metadata.author)
            .epub_context(|| format!("Failed to add author metadata: {}", metadata.author))?;
        builder
            .metadata("lang", &metadata.language)
            .epub_context(|| "Failed to set language metadata")?;
        builder
            .metadata("generator", "summary-epub")
            .epub_context(|| "Failed to set generator metadata")?;
        builder
            .metadata("toc_name", &metadata.toc_title)
            .epub_context(|| "Failed to set table of contents name")?;
        if let Some(description) = metadata.description_opt() {
            builder
                .metadata("description", description)
                .epub_context(|| "Failed to set description metadata")?;
        }
        if let Some(subject) = metadata.subject_opt() {
            builder
                .metadata("subject", subject)
                .epub_context(|| "Failed to set subject metadata")?;
        }
        builder.set_uuid(identifier_uuid(&metadata.identifier));

        builder
            .stylesheet(book.stylesheet.as_bytes())
            .epub_context(|| "Failed to add stylesheet")?;

        // contents page leads the spine; untitled, so it stays out of the TOC
        let contents = toc::render(&metadata.toc_title, &metadata.language, book.chapters());
        builder
            .add_content(
                EpubContent::new(toc::FILE_NAME, contents.as_bytes()).reftype(ReferenceType::Toc),
            )
            .epub_context(|| "Failed to add table of contents page")?;

        for chapter in book.chapters() {
            let filename = chapter.file_name();
            let html = chapter::render(chapter, &metadata.language);
            builder
                .add_content(EpubContent::new(&filename, html.as_bytes()).title(&chapter.title))
                .epub_context(|| format!("Failed to add chapter to EPUB: {}", chapter.title))?;
            debug!("added chapter {filename} ({})", chapter.title);
        }

        for asset in book.assets().iter() {
            builder
                .add_resource(&asset.path, asset.content.as_slice(), asset.media_type.mime())
                .epub_context(|| format!("Failed to add image to EPUB: {}", asset.path))?;
            debug!("added image {} ({})", asset.path, asset.media_type.mime());
        }

        let mut buffer: Vec<u8> = Vec::new();
        builder
            .generate(&mut buffer)
            .epub_context(|| "Failed to generate EPUB file")?;
        std::fs::write(&self.outfile, &buffer)
            .with_context(|| format!("Failed to write EPUB file: {}", self.outfile.display()))?;
        info!("wrote {} bytes to {}", buffer.len(), self.outfile.display());

        progress.finish_with_message("EPUB generated");

        Ok(RenderStats {
            document_count: book.chapters().len(),
            image_count: book.assets().len(),
        })
    }
}

/// The package identifier as a UUID.
///
/// Identifiers that already are UUIDs are used as-is; anything else is mapped
/// to a name-based (v5) UUID so the same identifier always gives the same book id.
fn identifier_uuid(identifier: &str) -> Uuid {
    Uuid::parse_str(identifier)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_URL, identifier.as_bytes()))
}
