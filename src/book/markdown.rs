//! Markdown to XHTML fragment rendering.
//!
//! Chapters are rendered with CommonMark plus the usual "extra" syntax: tables,
//! footnotes, fenced code, strikethrough, definition lists, abbreviations and
//! heading attributes. Every heading gets an anchor id derived from its text so
//! that in-book links and the `[TOC]` marker have something to point at. Raw
//! HTML void elements are self-closed so chapters stay well-formed XHTML.

use once_cell::sync::Lazy;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// Paragraph that gets replaced by a table of the chapter's headings.
const TOC_MARKER: &str = "<p>[TOC]</p>";

/// `*[HTML]: Hyper Text Markup Language`
static ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\[([^\]]+)\]:[ \t]*(.*?)[ \t]*$").expect("abbreviation regex is valid")
});

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(```|~~~)").expect("fence regex is valid"));

static VOID_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<(area|base|br|col|embed|hr|img|input|link|meta|param|source|track|wbr)\b([^<>]*?)\s*/?>",
    )
    .expect("void element regex is valid")
});

/// Heading found while rendering, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    level: usize,
    id: String,
    text: String,
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
}

/// Render a chapter's Markdown into an XHTML fragment.
pub fn render(markdown: &str) -> String {
    let (markdown, abbreviations) = extract_abbreviations(markdown);

    let mut events: Vec<Event> =
        TextMergeStream::new(Parser::new_ext(&markdown, options())).collect();
    let headings = assign_heading_ids(&mut events);
    let events = rewrite_inline(events, &abbreviations);

    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());

    if html.contains(TOC_MARKER) {
        html = html.replace(TOC_MARKER, &render_toc(&headings));
    }
    html
}

/// Remove abbreviation definition lines, returning the remaining text and
/// the definitions. A later definition of the same abbreviation wins.
fn extract_abbreviations(markdown: &str) -> (String, HashMap<String, String>) {
    let mut text = String::with_capacity(markdown.len());
    let mut abbreviations = HashMap::new();
    let mut in_fence = false;

    for line in markdown.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\r', '\n']);
        if FENCE.is_match(bare) {
            in_fence = !in_fence;
        }
        match ABBREVIATION.captures(bare) {
            Some(caps) if !in_fence => {
                let title = caps[2].to_string();
                if title.is_empty() {
                    abbreviations.remove(&caps[1]);
                } else {
                    abbreviations.insert(caps[1].to_string(), title);
                }
            }
            _ => text.push_str(line),
        }
    }

    (text, abbreviations)
}

/// Mark up abbreviations in text and self-close void elements in raw HTML.
///
/// Code blocks and image alt text are left alone.
fn rewrite_inline<'a>(
    events: Vec<Event<'a>>,
    abbreviations: &HashMap<String, String>,
) -> Vec<Event<'a>> {
    let pattern = abbreviation_pattern(abbreviations);
    let mut rewritten = Vec::with_capacity(events.len());
    let mut verbatim = 0usize;

    for event in events {
        match &event {
            Event::Start(Tag::CodeBlock(_)) | Event::Start(Tag::Image { .. }) => verbatim += 1,
            Event::End(TagEnd::CodeBlock) | Event::End(TagEnd::Image) => {
                verbatim = verbatim.saturating_sub(1)
            }
            Event::Text(text) if verbatim == 0 => {
                if let Some(pattern) = &pattern {
                    mark_abbreviations(text, pattern, abbreviations, &mut rewritten);
                    continue;
                }
            }
            Event::Html(html) if VOID_ELEMENT.is_match(html) => {
                rewritten.push(Event::Html(CowStr::from(self_close(html))));
                continue;
            }
            Event::InlineHtml(html) if VOID_ELEMENT.is_match(html) => {
                rewritten.push(Event::InlineHtml(CowStr::from(self_close(html))));
                continue;
            }
            _ => {}
        }
        rewritten.push(event);
    }

    rewritten
}

/// Whole-word alternation of every abbreviation, longest first.
fn abbreviation_pattern(abbreviations: &HashMap<String, String>) -> Option<Regex> {
    if abbreviations.is_empty() {
        return None;
    }
    let mut words: Vec<&str> = abbreviations.keys().map(String::as_str).collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).ok()
}

fn mark_abbreviations<'a>(
    text: &str,
    pattern: &Regex,
    abbreviations: &HashMap<String, String>,
    out: &mut Vec<Event<'a>>,
) {
    let mut last = 0;
    for found in pattern.find_iter(text) {
        if found.start() > last {
            out.push(Event::Text(CowStr::from(text[last..found.start()].to_string())));
        }
        let title = abbreviations
            .get(found.as_str())
            .map(String::as_str)
            .unwrap_or_default();
        out.push(Event::InlineHtml(CowStr::from(format!(
            r#"<abbr title="{}">{}</abbr>"#,
            html_escape::encode_double_quoted_attribute(title),
            html_escape::encode_text(found.as_str())
        ))));
        last = found.end();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

fn self_close(html: &str) -> String {
    VOID_ELEMENT
        .replace_all(html, |caps: &Captures| {
            format!("<{}{} />", &caps[1], caps[2].trim_end())
        })
        .into_owned()
}

/// Give every heading without an explicit `{#id}` a unique slug id.
fn assign_heading_ids(events: &mut [Event]) -> Vec<Heading> {
    let mut used: HashSet<String> = HashSet::new();
    let mut headings = Vec::new();

    for i in 0..events.len() {
        let (level, explicit) = match &events[i] {
            Event::Start(Tag::Heading { level, id, .. }) => {
                (*level as usize, id.as_ref().map(|id| id.to_string()))
            }
            _ => continue,
        };

        let text = heading_text(&events[i + 1..]);
        let id = match explicit {
            Some(id) => {
                used.insert(id.clone());
                id
            }
            None => unique_id(slugify(&text), &mut used),
        };

        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
            *slot = Some(CowStr::from(id.clone()));
        }
        headings.push(Heading { level, id, text });
    }

    headings
}

/// Plain text of a heading, up to its closing tag.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Generate an anchor slug from heading text.
///
/// Letters and digits in any script are kept (lowercased), runs of whitespace,
/// hyphens and underscores become a single hyphen, everything else is dropped.
pub fn slugify(text: &str) -> String {
    let slug = text
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    let mut id = base.clone();
    let mut n = 1;
    while used.contains(&id) {
        id = format!("{base}_{n}");
        n += 1;
    }
    used.insert(id.clone());
    id
}

/// Render nested lists of links to the given headings.
fn render_toc(headings: &[Heading]) -> String {
    let mut html = String::from("<div class=\"toc\">\n");
    let mut open: Vec<usize> = Vec::new();

    for heading in headings {
        match open.last() {
            None => {
                html.push_str("<ul>\n<li>");
                open.push(heading.level);
            }
            Some(&top) if heading.level > top => {
                html.push_str("\n<ul>\n<li>");
                open.push(heading.level);
            }
            Some(_) => {
                html.push_str("</li>\n");
                while open.len() > 1 && open.last().is_some_and(|&top| heading.level < top) {
                    open.pop();
                    html.push_str("</ul>\n</li>\n");
                }
                html.push_str("<li>");
            }
        }
        html.push_str(&format!(
            r##"<a href="#{}">{}</a>"##,
            html_escape::encode_double_quoted_attribute(&heading.id),
            html_escape::encode_text(&heading.text)
        ));
    }

    while open.pop().is_some() {
        html.push_str("</li>\n</ul>\n");
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tables_and_headings() {
        let html = render("# Safety Rules\n\n| Rule | Why |\n|------|-----|\n| Look | Cars |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains(r#"<h1 id="safety-rules">Safety Rules</h1>"#));
        assert!(html.contains("<td>Look</td>"));
    }

    #[test]
    fn heading_text_is_verbatim() {
        let html = render("## 过马路要小心\n");
        assert!(html.contains(">过马路要小心</h2>"));
        assert!(html.contains(r#"id="过马路要小心""#));
    }

    #[test]
    fn duplicate_headings_get_unique_ids() {
        let html = render("# Tips\n\n# Tips\n\n# Tips\n");
        assert!(html.contains(r#"id="tips""#));
        assert!(html.contains(r#"id="tips_1""#));
        assert!(html.contains(r#"id="tips_2""#));
    }

    #[test]
    fn explicit_heading_ids_are_kept() {
        let html = render("# Fire drill {#drill}\n");
        assert!(html.contains(r#"<h1 id="drill">Fire drill</h1>"#));
    }

    #[test]
    fn renders_extra_syntax() {
        let html = render(
            "Text with a note[^1].\n\n[^1]: The note.\n\n```rust\nfn main() {}\n```\n\nTerm\n: Definition\n\n~~old~~\n",
        );
        assert!(html.contains("footnote-reference"));
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("<dl>"));
        assert!(html.contains("<dt>Term</dt>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn images_are_plain_img_tags() {
        let html = render("![a cat](assets/cat.png)\n");
        assert!(html.contains(r#"<img src="assets/cat.png" alt="a cat" />"#));
    }

    #[test]
    fn toc_marker_lists_headings() {
        let html = render("[TOC]\n\n# One\n\n## One point one\n\n# Two\n");
        assert!(!html.contains("[TOC]"));
        assert!(html.contains(r##"<a href="#one">One</a>"##));
        assert!(html.contains(r##"<a href="#one-point-one">One point one</a>"##));
        assert!(html.contains(r##"<a href="#two">Two</a>"##));
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
    }

    #[test]
    fn rendering_is_deterministic() {
        let md = "# A\n\n[TOC]\n\n## B\n\n| x |\n|---|\n| 1 |\n";
        assert_eq!(render(md), render(md));
    }

    #[test]
    fn abbreviations_are_marked_up() {
        let html = render("*[HTML]: Hyper Text Markup Language\n\nHTML line, not HTMLX.\n");
        assert!(!html.contains("*[HTML]"));
        assert!(html.contains(
            r#"<p><abbr title="Hyper Text Markup Language">HTML</abbr> line, not HTMLX.</p>"#
        ));
    }

    #[test]
    fn abbreviations_skip_code_and_alt_text() {
        let html = render(
            "*[W3C]: World Wide Web Consortium\n\n`W3C` ![W3C logo](w3c.png)\n\n```\nW3C\n```\n",
        );
        assert!(html.contains("<code>W3C</code>"));
        assert!(html.contains(r#"alt="W3C logo""#));
        assert!(html.contains("<pre><code>W3C\n</code></pre>"));
        assert!(!html.contains("<abbr"));
    }

    #[test]
    fn abbreviation_lines_inside_fences_are_kept() {
        let html = render("```\n*[CPR]: kept\n```\n");
        assert!(html.contains("*[CPR]: kept"));
    }

    #[test]
    fn raw_void_elements_are_self_closed() {
        let html = render("HTML line<br>\n\n<img src=\"a.png\" width=\"300\">\n\nRule<hr/>\n");
        assert!(html.contains("<p>HTML line<br /></p>"));
        assert!(html.contains(r#"<img src="a.png" width="300" />"#));
        assert!(html.contains("<hr />"));
        assert!(!html.contains("<br>"));
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("snake_case-and-kebab"), "snake-case-and-kebab");
        assert_eq!(slugify("第 1 章"), "第-1-章");
        assert_eq!(slugify("!!!"), "section");
    }
}
