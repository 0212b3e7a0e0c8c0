pub mod html;
pub mod text;


use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(html|head|body|main|article|section|header|footer|nav|div|span|p|a|h[1-6]|ul|ol|li|br|img|strong|em|table)\b[^>]*>",
    )
    .expect("valid HTML tag pattern")
});

/// Markup flavour of a page's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// HTML fragment or document
    Html,
    /// Markdown with ATX (`#`) headings
    Markdown,
    /// Plain text, no heading markers
    Plain,
}

impl ContentFormat {
    /// Determines the format by looking at the content itself
    pub fn detect(content: &str) -> Self {
        if HTML_TAG.is_match(content) {
            ::log::trace!("Classifying content as HTML");
            ContentFormat::Html
        } else if text::has_markdown_markers(content) {
            ::log::trace!("Classifying content as Markdown");
            ContentFormat::Markdown
        } else {
            ContentFormat::Plain
        }
    }
}

/// Headings of a document grouped by level, each level in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingStructure {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub h4: Vec<String>,
    pub h5: Vec<String>,
    pub h6: Vec<String>,
}

impl HeadingStructure {
    /// Record a heading; levels outside 1..=6 are ignored
    pub fn push(&mut self, level: usize, text: String) {
        if let Some(bucket) = self.level_mut(level) {
            bucket.push(text);
        }
    }

    /// Headings at `level` (1..=6); empty for any other level
    pub fn level(&self, level: usize) -> &[String] {
        match level {
            1 => &self.h1,
            2 => &self.h2,
            3 => &self.h3,
            4 => &self.h4,
            5 => &self.h5,
            6 => &self.h6,
            _ => &[],
        }
    }

    fn level_mut(&mut self, level: usize) -> Option<&mut Vec<String>> {
        match level {
            1 => Some(&mut self.h1),
            2 => Some(&mut self.h2),
            3 => Some(&mut self.h3),
            4 => Some(&mut self.h4),
            5 => Some(&mut self.h5),
            6 => Some(&mut self.h6),
            _ => None,
        }
    }

    /// Total number of headings across all levels
    pub fn total(&self) -> usize {
        (1..=6).map(|level| self.level(level).len()).sum()
    }
}

/// Result of parsing page content
#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    /// Markup-free text, whitespace normalised
    pub text: String,
    /// Headings found in the content
    pub headings: HeadingStructure,
}

/// Main parser that delegates to the format-specific parsers
pub struct Parser;

impl Parser {
    /// Parse content with an explicit format
    pub fn parse(content: &str, format: ContentFormat) -> ParsedContent {
        match format {
            ContentFormat::Html => html::parse(content),
            ContentFormat::Markdown => text::parse_markdown(content),
            ContentFormat::Plain => ParsedContent {
                text: text::normalize_whitespace(content),
                headings: HeadingStructure::default(),
            },
        }
    }

    /// Detect the format and then parse
    pub fn parse_detected(content: &str) -> ParsedContent {
        Self::parse(content, ContentFormat::detect(content))
    }

    /// Markup-free text of the content
    pub fn plain_text(content: &str) -> String {
        Self::parse_detected(content).text
    }
}
