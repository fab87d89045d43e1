//! Table of contents page for EPUB.
//!
//! The page opens the reading order and lists every chapter in book order.
//! It is a plain content document; the package's own navigation (nav.xhtml
//! and the NCX) is generated by `epub-builder` from the chapter titles.

use crate::book::RenderedChapter;
use crate::sinks::epub::styles::STYLESHEET_HREF;

/// Name of the page inside the package.
pub const FILE_NAME: &str = "toc.xhtml";

/// Render the table of contents page as XHTML.
pub fn render(toc_title: &str, language: &str, chapters: &[RenderedChapter]) -> String {
    let toc_title = html_escape::encode_text(toc_title);

    let mut items = Vec::new();
    if !chapters.is_empty() {
        items.push("<ol>".to_string());
        for chapter in chapters {
            items.push(format!(
                r#"<li><a href="{}">{}</a></li>"#,
                html_escape::encode_double_quoted_attribute(&chapter.file_name()),
                html_escape::encode_text(&chapter.title)
            ));
        }
        items.push("</ol>".to_string());
    }

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
<div class="toc">
<h1>{title}</h1>
{items}
</div>
</body>
</html>"#,
        lang = html_escape::encode_double_quoted_attribute(language),
        title = toc_title,
        stylesheet = STYLESHEET_HREF,
        items = items.join("\n"),
    )
}
