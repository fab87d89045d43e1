//! EPUB output configuration.
//!
//! Every field has a default so that a configuration file only needs to name
//! the settings it changes, and no configuration file is needed at all for the
//! stock book.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::book::Metadata;

/// EPUB output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::upper_case_acronyms)]
pub struct EPUB {
    /// Output EPUB file path
    pub outfile: PathBuf,
    /// Path to a CSS file used instead of the built-in stylesheet.
    /// Empty string for the built-in one.
    pub stylesheet: String,
    /// EPUB document metadata
    pub metadata: Metadata,
}

impl Default for EPUB {
    fn default() -> Self {
        Self {
            outfile: PathBuf::from("er_tong_an_quan_shu.epub"),
            stylesheet: String::new(),
            metadata: Metadata::default(),
        }
    }
}

impl EPUB {
    /// Returns the custom stylesheet path, if configured.
    pub fn stylesheet_path(&self) -> Option<PathBuf> {
        if self.stylesheet.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.stylesheet))
        }
    }
}

/// Statistics from rendering an EPUB, used for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Number of chapter documents in the EPUB
    pub document_count: usize,
    /// Number of embedded images
    pub image_count: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_epub() {
        let epub = EPUB::default();
        toml::to_string(&epub).expect("can serialize EPUB to TOML");
    }

    #[test]
    fn can_roundtrip_epub() {
        let epub = EPUB::default();
        let toml_str = toml::to_string(&epub).expect("can serialize");
        let deserialized: EPUB = toml::from_str(&toml_str).expect("can deserialize");
        assert_eq!(
            epub.outfile.to_string_lossy(),
            deserialized.outfile.to_string_lossy()
        );
        assert_eq!(epub.metadata, deserialized.metadata);
    }

    #[test]
    fn empty_stylesheet_means_builtin() {
        let mut epub = EPUB::default();
        assert_eq!(epub.stylesheet_path(), None);
        epub.stylesheet = "book.css".to_string();
        assert_eq!(epub.stylesheet_path(), Some(PathBuf::from("book.css")));
    }
}
