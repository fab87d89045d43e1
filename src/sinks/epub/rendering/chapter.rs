//! Chapter document rendering for EPUB.
//!
//! Wraps a chapter's rendered Markdown in a complete XHTML document with the
//! chapter title as its top-level heading and the shared stylesheet linked.

use crate::book::RenderedChapter;
use crate::sinks::epub::styles::STYLESHEET_HREF;

/// Render a chapter as a standalone XHTML document.
pub fn render(chapter: &RenderedChapter, language: &str) -> String {
    let title = html_escape::encode_text(&chapter.title);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
    <meta charset="UTF-8"/>
    <title>{title}</title>
    <link rel="stylesheet" type="text/css" href="{stylesheet}"/>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        lang = html_escape::encode_double_quoted_attribute(language),
        title = title,
        stylesheet = STYLESHEET_HREF,
        body = chapter.body,
    )
}
