//! Stylesheet for the EPUB.
//!
//! The book carries a single stylesheet, linked from every chapter. It is
//! either the small built-in one or a user-supplied CSS file.

use super::config::EPUB;
use anyhow::{Context, Result};

/// Name of the stylesheet inside the package, relative to the chapters.
pub const STYLESHEET_HREF: &str = "stylesheet.css";

/// The built-in stylesheet.
pub fn default_stylesheet() -> String {
    r#"body { font-family: sans-serif; }
img { max-width: 100%; }
"#
    .to_string()
}

/// Load the stylesheet the configuration asks for.
pub fn load_stylesheet(config: &EPUB) -> Result<String> {
    match config.stylesheet_path() {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stylesheet: {}", path.display())),
        None => Ok(default_stylesheet()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stylesheet_styles_body_and_images() {
        let css = load_stylesheet(&EPUB::default()).expect("can load built-in stylesheet");
        assert!(css.contains("body {"));
        assert!(css.contains("img { max-width: 100%; }"));
    }

    #[test]
    fn custom_stylesheet_is_read_from_disk() {
        let dir = tempfile::TempDir::new().expect("can create temp dir");
        let path = dir.path().join("book.css");
        std::fs::write(&path, "p { margin: 0; }").expect("can write css");

        let config = EPUB {
            stylesheet: path.display().to_string(),
            ..EPUB::default()
        };
        assert_eq!(
            load_stylesheet(&config).expect("can load"),
            "p { margin: 0; }"
        );
    }

    #[test]
    fn missing_custom_stylesheet_is_an_error() {
        let config = EPUB {
            stylesheet: "/nonexistent/book.css".to_string(),
            ..EPUB::default()
        };
        assert!(load_stylesheet(&config).is_err());
    }
}
