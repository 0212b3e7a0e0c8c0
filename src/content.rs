//! Lexical checks on page content: word count, keyword density, heading
//! hierarchy and corpus-wide duplicate detection.

use crate::config::ContentConfig;
use crate::page::Page;
use crate::parsers::{HeadingStructure, Parser, text};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

/// Per-page lexical metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub word_count: usize,
    /// Keyword -> occurrences / total words
    pub keyword_density: BTreeMap<String, f64>,
    pub heading_structure: HeadingStructure,
    /// Share of sentences repeating an earlier sentence of the same page
    pub duplicate_score: f64,
}

/// Validates page content against the configured thresholds
#[derive(Debug, Clone)]
pub struct ContentValidator {
    config: ContentConfig,
}

impl ContentValidator {
    pub fn new(config: ContentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Compute all metrics for a page from its content and tracked keywords
    pub fn analyze(&self, page: &Page) -> ContentAnalysis {
        let parsed = Parser::parse_detected(&page.content);
        ContentAnalysis {
            word_count: count_words(&parsed.text),
            keyword_density: density_in_plain_text(&parsed.text, &page.keywords),
            heading_structure: parsed.headings,
            duplicate_score: repeated_sentence_ratio(&parsed.text),
        }
    }

    /// True iff the markup-free text has at least the minimum number of words
    pub fn validate_word_count(&self, content: &str) -> bool {
        count_words(&Parser::plain_text(content)) >= self.config.min_word_count
    }

    /// Same bound applied to a page's stored word count
    pub fn validate_page_word_count(&self, page: &Page) -> bool {
        page.word_count >= self.config.min_word_count
    }

    /// Occurrence ratio of each keyword in the text
    ///
    /// Matching is case-insensitive and whole-word; a multi-word keyword only
    /// counts when the full phrase appears.
    pub fn keyword_density(&self, content: &str, keywords: &[String]) -> BTreeMap<String, f64> {
        density_in_plain_text(&Parser::plain_text(content), keywords)
    }

    /// True iff every ratio lies within the configured band
    ///
    /// A tracked keyword that never occurs has a ratio of zero and fails.
    pub fn validate_keyword_density(&self, densities: &BTreeMap<String, f64>) -> bool {
        densities.values().all(|ratio| {
            *ratio >= self.config.keyword_density_min && *ratio <= self.config.keyword_density_max
        })
    }

    pub fn extract_heading_structure(&self, content: &str) -> HeadingStructure {
        Parser::parse_detected(content).headings
    }

    /// Exactly one H1, and every H4..H6 in use needs its parent level in use
    pub fn validate_heading_structure(&self, content: &str) -> bool {
        heading_structure_is_valid(&self.extract_heading_structure(content))
    }

    /// Group pages whose normalised text is identical; only groups of two or more
    pub fn detect_duplicate_content(&self, pages: &[Page]) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for page in pages {
            if let Some(fingerprint) = content_fingerprint(&page.content) {
                groups.entry(fingerprint).or_default().push(page.url.clone());
            }
        }

        groups.retain(|_, urls| urls.len() >= 2);
        if !groups.is_empty() {
            ::log::debug!("Found {} duplicate content groups", groups.len());
        }
        groups
    }

    /// Template copy for a service offered at a location
    pub fn generate_location_content(&self, location: &str, service: &str) -> String {
        format!(
            "Looking for professional {service} in {location}? Our team brings years of \
             experience to every home in {location}, restoring the look and feel of your \
             furniture with careful, hands-on work.\n\n\
             Why choose our {service} in {location}:\n\
             - Trained craftsmen who visit your home in {location}\n\
             - Quality materials and finishes suited to your furniture\n\
             - Transparent pricing with no hidden charges\n\n\
             Book {service} in {location} today and give your furniture a second life."
        )
    }

    /// Template copy describing a service in general
    pub fn generate_service_content(&self, service: &str) -> String {
        format!(
            "Our {service} service restores worn and tired furniture to its best condition. \
             Every job starts with an inspection so we can recommend the right treatment.\n\n\
             What our {service} includes:\n\
             - Inspection and preparation of every surface\n\
             - Professional {service} using quality materials\n\
             - A final check and care advice when the work is done\n\n\
             Contact us to schedule {service} at a time that suits you."
        )
    }
}

/// Number of whitespace-delimited tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Stable fingerprint of whitespace-normalised, lower-cased plain text
///
/// Returns `None` for content without any text.
pub fn content_fingerprint(content: &str) -> Option<String> {
    let normalized = text::normalize_whitespace(&Parser::plain_text(content)).to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

pub fn heading_structure_is_valid(headings: &HeadingStructure) -> bool {
    if headings.h1.len() != 1 {
        return false;
    }
    (4..=6).all(|level| headings.level(level).is_empty() || !headings.level(level - 1).is_empty())
}

fn density_in_plain_text(plain: &str, keywords: &[String]) -> BTreeMap<String, f64> {
    let total = count_words(plain);
    let mut densities = BTreeMap::new();

    for keyword in keywords {
        let Some(pattern) = keyword_pattern(keyword) else {
            continue;
        };
        let occurrences = pattern.find_iter(plain).count();
        let ratio = if total == 0 {
            0.0
        } else {
            occurrences as f64 / total as f64
        };
        densities.insert(keyword.clone(), ratio);
    }

    densities
}

/// Case-insensitive whole-phrase pattern; words may be separated by any whitespace
///
/// Word boundaries are only asserted next to word characters, so keywords
/// such as `c++` or `.net` still match.
fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let words: Vec<String> = keyword.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let trimmed = keyword.trim();
    let lead = if is_word(trimmed.chars().next()) { r"\b" } else { "" };
    let tail = if is_word(trimmed.chars().next_back()) { r"\b" } else { "" };
    let pattern = format!(r"(?i){lead}{}{tail}", words.join(r"\s+"));
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            ::log::warn!("Skipping keyword '{}': {}", keyword, e);
            None
        }
    }
}

fn repeated_sentence_ratio(plain: &str) -> f64 {
    let sentences = text::sentences(&plain.to_lowercase());
    if sentences.is_empty() {
        return 0.0;
    }
    let mut seen = HashSet::new();
    let repeated = sentences.iter().filter(|s| !seen.insert(s.as_str())).count();
    repeated as f64 / sentences.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ContentValidator {
        ContentValidator::new(ContentConfig::default())
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    /// `total` words of which `hits` are the keyword phrase occurrences
    fn text_with_density(keyword: &str, hits: usize, total: usize) -> String {
        let keyword_words = keyword.split_whitespace().count();
        let filler = total - hits * keyword_words;
        let mut parts = vec![keyword.to_string(); hits];
        parts.push(words(filler));
        parts.join(" ")
    }

    #[test]
    fn test_word_count_threshold() {
        let v = validator();
        assert!(v.validate_word_count(&words(300)));
        assert!(v.validate_word_count(&words(450)));
        assert!(!v.validate_word_count(&words(299)));
        assert!(!v.validate_word_count(""));
    }

    #[test]
    fn test_page_word_count_threshold() {
        let v = validator();
        assert!(v.validate_page_word_count(&Page::new("/a", "").with_word_count(300)));
        assert!(!v.validate_page_word_count(&Page::new("/a", "").with_word_count(299)));
    }

    #[test]
    fn test_word_count_ignores_markup() {
        let v = validator();
        let html = format!("<div><h1>{}</h1></div>", words(300));
        assert!(v.validate_word_count(&html));
    }

    #[test]
    fn test_density_two_percent_passes() {
        let v = validator();
        let text = text_with_density("polish", 2, 100);
        let densities = v.keyword_density(&text, &["polish".to_string()]);
        assert_eq!(densities["polish"], 0.02);
        assert!(v.validate_keyword_density(&densities));
    }

    #[test]
    fn test_density_out_of_band_fails() {
        let v = validator();
        let low = v.keyword_density(&text_with_density("polish", 1, 200), &["polish".to_string()]);
        assert_eq!(low["polish"], 0.005);
        assert!(!v.validate_keyword_density(&low));

        let high = v.keyword_density(&text_with_density("polish", 5, 100), &["polish".to_string()]);
        assert_eq!(high["polish"], 0.05);
        assert!(!v.validate_keyword_density(&high));
    }

    #[test]
    fn test_missing_keyword_fails_density() {
        let v = validator();
        let densities = v.keyword_density(&words(100), &["sofa".to_string()]);
        assert_eq!(densities["sofa"], 0.0);
        assert!(!v.validate_keyword_density(&densities));
    }

    #[test]
    fn test_density_matching_is_whole_word_and_case_insensitive() {
        let v = validator();
        let text = "Sofa sofas SOFA sofabed sofa.";
        let densities = v.keyword_density(text, &["sofa".to_string()]);
        assert_eq!(densities["sofa"], 3.0 / 5.0);
    }

    #[test]
    fn test_phrase_matches_only_as_a_whole() {
        let v = validator();
        let text = "sofa polishing is not sofa repair, and polishing alone is not it";
        let densities = v.keyword_density(
            text,
            &["sofa polishing".to_string(), "sofa".to_string()],
        );
        let total = text.split_whitespace().count() as f64;
        assert_eq!(densities["sofa polishing"], 1.0 / total);
        assert_eq!(densities["sofa"], 2.0 / total);
    }

    #[test]
    fn test_keywords_with_symbols_are_counted() {
        let v = validator();
        let text = "We teach C++ and c++ daily, plus .NET on weekends";
        let densities = v.keyword_density(text, &["c++".to_string(), ".net".to_string()]);
        let total = count_words(text) as f64;
        assert_eq!(densities["c++"], 2.0 / total);
        assert_eq!(densities[".net"], 1.0 / total);
    }

    #[test]
    fn test_heading_structure_h1_h2_h3() {
        let v = validator();
        assert!(v.validate_heading_structure("# Title\n\n## Section\n\n### Detail\n"));
        assert!(v.validate_heading_structure("<h1>T</h1><h2>S</h2><h3>D</h3>"));
    }

    #[test]
    fn test_heading_structure_needs_exactly_one_h1() {
        let v = validator();
        assert!(!v.validate_heading_structure("## Only a section"));
        assert!(!v.validate_heading_structure("# One\n# Two"));
    }

    #[test]
    fn test_deep_heading_needs_parent_level() {
        let v = validator();
        assert!(!v.validate_heading_structure("# Title\n## Section\n#### Skipped h3"));
        // Levels below 4 carry no parent requirement
        assert!(v.validate_heading_structure("# Title\n### No h2"));
    }

    #[test]
    fn test_extract_heading_structure() {
        let v = validator();
        let headings = v.extract_heading_structure("# A\n## B\n## C\n");
        assert_eq!(headings.h1, vec!["A"]);
        assert_eq!(headings.h2, vec!["B", "C"]);
    }

    #[test]
    fn test_duplicate_content_groups() {
        let v = validator();
        let pages = vec![
            Page::new("/a", "Sofa polishing  in Andheri."),
            Page::new("/b", "sofa POLISHING in\nandheri."),
            Page::new("/c", "Something else entirely."),
        ];
        let groups = v.detect_duplicate_content(&pages);
        assert_eq!(groups.len(), 1);
        let urls = groups.values().next().unwrap();
        assert_eq!(urls, &vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_distinct_content_has_no_groups() {
        let v = validator();
        let pages = vec![
            Page::new("/a", "one"),
            Page::new("/b", "two"),
            Page::new("/c", ""),
            Page::new("/d", "   "),
        ];
        assert!(v.detect_duplicate_content(&pages).is_empty());
    }

    #[test]
    fn test_location_content_contains_inputs() {
        let v = validator();
        let text = v.generate_location_content("Andheri", "sofa polishing");
        assert!(text.contains("Andheri"));
        assert!(text.contains("sofa polishing"));
    }

    #[test]
    fn test_service_content_contains_input() {
        let text = validator().generate_service_content("wood polishing");
        assert!(text.contains("wood polishing"));
    }

    #[test]
    fn test_analyze_reports_repeated_sentences() {
        let page = Page::new("/a", "Great work. Great work. New idea.")
            .with_keywords(["great work"]);
        let analysis = validator().analyze(&page);
        assert_eq!(analysis.word_count, 6);
        assert!((analysis.duplicate_score - 1.0 / 3.0).abs() < 1e-9);
        assert!((analysis.keyword_density["great work"] - 2.0 / 6.0).abs() < 1e-9);
    }
}
