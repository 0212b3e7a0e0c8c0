use crate::parsers::{HeadingStructure, ParsedContent};
use regex::Regex;
use std::sync::LazyLock;

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]{0,3}(#{1,6})[ \t]+(.*?)[ \t#]*$").expect("valid heading pattern")
});

static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid link pattern"));

static MD_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*\*|__|\*|_|`)").expect("valid emphasis pattern"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*([-*+]|\d+[.)])[ \t]+").expect("valid list pattern"));

/// Whether the text carries Markdown heading or link markers
pub fn has_markdown_markers(text: &str) -> bool {
    text.lines().any(|line| ATX_HEADING.is_match(line)) || MD_LINK.is_match(text)
}

/// Parses Markdown into plain text plus its ATX headings
pub fn parse_markdown(markdown: &str) -> ParsedContent {
    let mut headings = HeadingStructure::default();
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.to_string());
            continue;
        }

        if let Some(caps) = ATX_HEADING.captures(line) {
            let level = caps[1].len();
            let heading = strip_inline(&caps[2]);
            headings.push(level, normalize_whitespace(&heading));
            lines.push(heading);
        } else {
            let line = LIST_MARKER.replace(line, "");
            lines.push(strip_inline(&line));
        }
    }

    ParsedContent {
        text: normalize_whitespace(&lines.join("\n")),
        headings,
    }
}

/// Remove inline Markdown syntax, keeping link labels
fn strip_inline(line: &str) -> String {
    let without_links = MD_LINK.replace_all(line, "$1");
    MD_EMPHASIS.replace_all(&without_links, "").into_owned()
}

/// Collapses all runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into sentences on terminal punctuation
pub fn sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(normalize_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}
