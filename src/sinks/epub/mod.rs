//! EPUB generation for Markdown books.
//!
//! This module converts an assembled `Book` into an EPUB 3 ebook with:
//! - A generated contents page leading the reading order, outside the TOC
//! - One XHTML document per chapter, titled with the chapter's summary title
//! - Every staged image, stored under the path chapters reference it by
//! - A single stylesheet shared by all chapters
//! - EPUB 3 navigation plus a legacy NCX index for older readers

mod config;
mod rendering;
mod styles;

pub use config::EPUB;
pub use styles::load_stylesheet;
