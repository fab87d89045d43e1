//! Local image discovery and staging.
//!
//! Rendered chapters reference images with ordinary `<img src>` tags. Local
//! sources are read from disk relative to the chapter's directory and staged
//! once per package path, however many chapters use them. The tags themselves
//! are never rewritten: chapter documents sit at the package content root, so
//! the relative `src` resolves to the same path the image is stored under.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

static IMG_WITH_SRC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("image selector is valid"));

static URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(//|[A-Za-z][A-Za-z0-9+.-]*:)").expect("url regex is valid"));

/// Image formats the book knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    /// Infer the media type from a file extension.
    ///
    /// Only `.png` is recognised; every other extension is labelled JPEG.
    pub fn from_path<P: AsRef<Path>>(path: P) -> MediaType {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => MediaType::Png,
            _ => MediaType::Jpeg,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }
}

/// An image staged for embedding.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Identifier safe for use inside the package
    pub id: String,
    /// Path inside the package, equal to the (decoded) `src` chapters use
    pub path: String,
    pub content: Vec<u8>,
    pub media_type: MediaType,
}

impl ImageAsset {
    pub fn new<S: Into<String>>(path: S, content: Vec<u8>) -> ImageAsset {
        let path = path.into();
        ImageAsset {
            id: asset_id(&path),
            media_type: MediaType::from_path(&path),
            path,
            content,
        }
    }
}

/// A local image that could not be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetWarning {
    /// The resolved file does not exist
    Missing { src: String, path: PathBuf },
    /// The file exists but could not be read
    Unreadable {
        src: String,
        path: PathBuf,
        error: String,
    },
    /// The `src` climbs out of the package (`..`) or is absolute
    OutsidePackage { src: String },
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetWarning::Missing { src, path } => {
                write!(f, "image {src} not found at {}, not embedded", path.display())
            }
            AssetWarning::Unreadable { src, path, error } => write!(
                f,
                "image {src} at {} could not be read ({error}), not embedded",
                path.display()
            ),
            AssetWarning::OutsidePackage { src } => {
                write!(f, "image {src} points outside the book, not embedded")
            }
        }
    }
}

/// Every image staged so far, unique by package path, in discovery order.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: Vec<ImageAsset>,
    paths: HashSet<String>,
}

impl AssetRegistry {
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageAsset> {
        self.assets.iter()
    }

    /// Stage an asset. Returns `false` (and drops it) if its path is already staged.
    pub fn stage(&mut self, asset: ImageAsset) -> bool {
        if !self.paths.insert(asset.path.clone()) {
            return false;
        }
        debug!(
            "staged image {} as {} ({}, {} bytes)",
            asset.path,
            asset.id,
            asset.media_type.mime(),
            asset.content.len()
        );
        self.assets.push(asset);
        true
    }

    /// Stage every local image referenced by a rendered chapter.
    ///
    /// `chapter_dir` is the directory containing the chapter's Markdown file.
    /// Problems are returned rather than raised; the chapter is still usable.
    pub fn resolve(&mut self, html: &str, chapter_dir: &Path) -> Vec<AssetWarning> {
        let mut warnings = Vec::new();

        for src in image_sources(html) {
            if is_url(&src) {
                continue;
            }
            let Some(path) = package_path(&src) else {
                warnings.push(AssetWarning::OutsidePackage { src });
                continue;
            };

            let file = chapter_dir.join(&path);
            if !file.is_file() {
                warnings.push(AssetWarning::Missing { src, path: file });
                continue;
            }
            if self.contains(&path) {
                continue;
            }

            match std::fs::read(&file) {
                Ok(content) => {
                    self.stage(ImageAsset::new(path, content));
                }
                Err(e) => warnings.push(AssetWarning::Unreadable {
                    src,
                    path: file,
                    error: e.to_string(),
                }),
            }
        }

        warnings
    }
}

/// `src` of every `<img>` in the fragment, in document order.
fn image_sources(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&IMG_WITH_SRC)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `src` names a network (or otherwise non-file) resource.
pub fn is_url(src: &str) -> bool {
    URL_PREFIX.is_match(src)
}

/// Where a local `src` lives inside the package.
///
/// Percent-escapes are decoded and `.` segments dropped. Returns `None` for
/// absolute paths and paths that climb above the chapter's directory.
pub fn package_path(src: &str) -> Option<String> {
    let decoded = percent_encoding::percent_decode_str(src).decode_utf8_lossy();

    let mut parts = Vec::new();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Identifier derived from a path, with separators and dots replaced.
pub fn asset_id(path: &str) -> String {
    path.replace(['/', '\\', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, bytes: &[u8]) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().expect("has parent")).expect("can create dirs");
        std::fs::write(path, bytes).expect("can write file");
    }

    #[test]
    fn media_types() {
        assert_eq!(MediaType::from_path("a.png"), MediaType::Png);
        assert_eq!(MediaType::from_path("A.PNG"), MediaType::Png);
        assert_eq!(MediaType::from_path("a.jpg"), MediaType::Jpeg);
        assert_eq!(MediaType::from_path("a.gif"), MediaType::Jpeg);
        assert_eq!(MediaType::from_path("no_extension"), MediaType::Jpeg);
        assert_eq!(MediaType::Png.mime(), "image/png");
        assert_eq!(MediaType::Jpeg.mime(), "image/jpeg");
    }

    #[test]
    fn ids_replace_separators_and_dots() {
        assert_eq!(asset_id("assets/a.png"), "assets_a_png");
        assert_eq!(asset_id("img\\b.jpeg"), "img_b_jpeg");
    }

    #[test]
    fn urls_are_not_local() {
        assert!(is_url("http://example.com/a.png"));
        assert!(is_url("https://example.com/a.png"));
        assert!(is_url("data:image/png;base64,AAAA"));
        assert!(is_url("//cdn.example.com/a.png"));
        assert!(!is_url("assets/a.png"));
        assert!(!is_url("./a.png"));
    }

    #[test]
    fn package_paths() {
        assert_eq!(package_path("assets/a.png").as_deref(), Some("assets/a.png"));
        assert_eq!(package_path("./assets/a.png").as_deref(), Some("assets/a.png"));
        assert_eq!(
            package_path("assets/%E5%9B%BE.png").as_deref(),
            Some("assets/图.png")
        );
        assert_eq!(package_path("../a.png"), None);
        assert_eq!(package_path("/etc/a.png"), None);
    }

    #[test]
    fn finds_images_in_document_order() {
        let html = r#"<p><img src="b.png" alt="" /><img src="a.png" alt="" /></p><img alt="no src" />"#;
        assert_eq!(image_sources(html), vec!["b.png", "a.png"]);
    }

    #[test]
    fn stages_existing_images_once() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "assets/a.png", b"png bytes");

        let mut registry = AssetRegistry::default();
        let html = r#"<img src="assets/a.png" alt="" /><img src="assets/a.png" alt="" />"#;
        assert!(registry.resolve(html, dir.path()).is_empty());
        assert!(registry.resolve(html, dir.path()).is_empty());

        assert_eq!(registry.len(), 1);
        let asset = registry.iter().next().expect("one asset");
        assert_eq!(asset.path, "assets/a.png");
        assert_eq!(asset.id, "assets_a_png");
        assert_eq!(asset.content, b"png bytes");
        assert_eq!(asset.media_type, MediaType::Png);
    }

    #[test]
    fn unrecognised_extensions_are_embedded_as_jpeg() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "pic.webp", b"webp");
        write(dir.path(), "diagram.svg", b"<svg/>");

        let mut registry = AssetRegistry::default();
        let warnings = registry.resolve(
            r#"<img src="pic.webp" alt="" /><img src="diagram.svg" alt="" />"#,
            dir.path(),
        );
        assert!(warnings.is_empty());
        assert_eq!(registry.len(), 2);
        assert!(registry.iter().all(|a| a.media_type == MediaType::Jpeg));
    }

    #[test]
    fn missing_images_warn_and_are_skipped() {
        let dir = TempDir::new().expect("can create temp dir");
        let mut registry = AssetRegistry::default();
        let warnings = registry.resolve(r#"<img src="assets/gone.png" alt="" />"#, dir.path());

        assert_eq!(registry.len(), 0);
        assert_eq!(
            warnings,
            vec![AssetWarning::Missing {
                src: "assets/gone.png".to_string(),
                path: dir.path().join("assets/gone.png"),
            }]
        );
    }

    #[test]
    fn remote_and_escaping_images_are_not_embedded() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "a.png", b"a");

        let mut registry = AssetRegistry::default();
        let warnings = registry.resolve(
            r#"<img src="https://example.com/a.png" alt="" /><img src="../a.png" alt="" />"#,
            dir.path(),
        );
        assert_eq!(registry.len(), 0);
        assert_eq!(
            warnings,
            vec![AssetWarning::OutsidePackage {
                src: "../a.png".to_string()
            }]
        );
    }

    #[test]
    fn resolves_against_chapter_directory() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "part1/assets/a.jpg", b"jpg");

        let mut registry = AssetRegistry::default();
        let warnings = registry.resolve(
            r#"<img src="assets/a.jpg" alt="" />"#,
            &dir.path().join("part1"),
        );
        assert!(warnings.is_empty());
        assert!(registry.contains("assets/a.jpg"));
    }
}
