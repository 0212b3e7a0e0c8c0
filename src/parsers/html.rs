use crate::parsers::{HeadingStructure, ParsedContent, text};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid heading selector")
});

/// Parses HTML content to extract visible text and headings
pub fn parse(html: &str) -> ParsedContent {
    let doc = Html::parse_document(html);

    let text = extract_text(&doc);
    let headings = extract_headings(&doc);

    ::log::trace!(
        "HTML parser found {} words and {} headings",
        text.split_whitespace().count(),
        headings.total()
    );

    ParsedContent { text, headings }
}

/// Visible body text, skipping script and style contents
fn extract_text(doc: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for body in doc.select(&BODY) {
        for node in body.descendants() {
            let Node::Text(t) = node.value() else {
                continue;
            };
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
                .is_some_and(|name| name == "script" || name == "style");
            if !hidden {
                parts.push(t);
            }
        }
    }

    text::normalize_whitespace(&parts.join(" "))
}

/// Headings in document order
fn extract_headings(doc: &Html) -> HeadingStructure {
    let mut headings = HeadingStructure::default();

    for element in doc.select(&HEADINGS) {
        let level = heading_level(&element);
        let content = text::normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
        headings.push(level, content);
    }

    headings
}

fn heading_level(element: &ElementRef) -> usize {
    element
        .value()
        .name()
        .strip_prefix('h')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Extracts only the text of an HTML document
pub fn parse_text_only(html: &str) -> String {
    extract_text(&Html::parse_document(html))
}
