//! Generation and validation of titles, H1s, meta descriptions, canonical
//! URLs and social cards.

use crate::config::{MetadataConfig, SiteConfig};
use crate::filter::LinkScope;
use crate::page::{Page, SocialCard};
use crate::parsers::text::normalize_whitespace;
use crate::taxonomy::Taxonomy;
use crate::utils::{char_len, slug_words, title_case, truncate_with_ellipsis};
use std::collections::HashMap;

/// Sentences appended after the call-to-action while a description is still short
const DESCRIPTION_FILLERS: [&str; 3] = [
    "Trusted by homeowners across the city.",
    "Experienced craftsmen and quality materials.",
    "Transparent pricing with no hidden charges.",
];

/// Qualifiers added to a generated title, in order, while it is still short
const TITLE_QUALIFIERS: [&str; 2] = ["Expert Services", "Trusted Local Professionals"];

/// Fields a metadata pass filled in on a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataChanges {
    pub fields: Vec<&'static str>,
}

impl MetadataChanges {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Generates and validates page metadata
#[derive(Debug, Clone)]
pub struct MetadataManager {
    config: MetadataConfig,
    site_name: String,
    taxonomy: Taxonomy,
    scope: LinkScope,
}

impl MetadataManager {
    pub fn new(config: MetadataConfig, site: &SiteConfig, taxonomy: Taxonomy, scope: LinkScope) -> Self {
        Self {
            config,
            site_name: site.site_name.clone(),
            taxonomy,
            scope,
        }
    }

    /// Display forms of the location and service found in the page URL
    fn location_and_service(&self, page: &Page) -> (Option<String>, Option<String>) {
        (
            self.taxonomy.detect_location(&page.url).map(|l| title_case(&l)),
            self.taxonomy.detect_service(&page.url).map(|s| title_case(&s)),
        )
    }

    /// `"{keyword} in {location} - {service}"`, degrading when parts are missing;
    /// the page title (or the URL path words) when there are no keywords
    pub fn generate_h1(&self, page: &Page, keywords: &[String]) -> String {
        let Some(keyword) = primary(keywords) else {
            if page.title.trim().is_empty() {
                return slug_title(&page.url);
            }
            return page.title.clone();
        };

        match self.location_and_service(page) {
            (Some(location), Some(service)) => format!("{keyword} in {location} - {service}"),
            (Some(location), None) => format!("{keyword} in {location}"),
            (None, Some(service)) => format!("{keyword} - {service}"),
            (None, None) => keyword.to_string(),
        }
    }

    /// Title of the form `"{Keyword} in {Location} - {Service} | {Site}"`,
    /// within the title bounds
    ///
    /// The service is left out when the keyword already names it. Without
    /// keywords the page H1 is used, then the words of the URL path. Short
    /// titles are padded with a qualifier before the brand.
    pub fn generate_title(&self, page: &Page, keywords: &[String]) -> String {
        let (location, service) = self.location_and_service(page);

        let head = match primary(keywords).map(title_case) {
            Some(keyword) => {
                let mut head = match location {
                    Some(location) if !mentions(&keyword, &location) => {
                        format!("{keyword} in {location}")
                    }
                    _ => keyword,
                };
                if let Some(service) = service.filter(|s| !mentions(&head, s)) {
                    head = format!("{head} - {service}");
                }
                head
            }
            None if !page.h1.trim().is_empty() => normalize_whitespace(&page.h1),
            None => slug_title(&page.url),
        };

        self.fit_title(head)
    }

    /// Brand the head, padding it up to the minimum or dropping the brand past the maximum
    fn fit_title(&self, mut head: String) -> String {
        let min = self.config.title_min_length;
        let max = self.config.title_max_length;
        let brand = format!(" | {}", self.site_name);
        let brand_len = char_len(&brand);

        for qualifier in TITLE_QUALIFIERS {
            if char_len(&head) + brand_len >= min {
                break;
            }
            let padded = format!("{head} - {qualifier}");
            if char_len(&padded) + brand_len > max {
                break;
            }
            head = padded;
        }

        let branded = format!("{head}{brand}");
        if char_len(&branded) <= max {
            branded
        } else {
            truncate_with_ellipsis(&head, max)
        }
    }

    pub fn validate_title_length(&self, title: &str) -> bool {
        let len = char_len(title);
        len >= self.config.title_min_length && len <= self.config.title_max_length
    }

    /// A sentence built from keyword, location and service, fitted to the length bounds
    pub fn generate_meta_description(&self, page: &Page, keywords: &[String]) -> String {
        let (location, service) = self.location_and_service(page);
        let pitch = match &service {
            Some(service) => format!(
                "Our {} experts deliver professional, affordable results at your doorstep.",
                service.to_lowercase()
            ),
            None => "Our experts deliver professional, affordable results at your doorstep."
                .to_string(),
        };

        let sentence = match (primary(keywords), location) {
            (Some(keyword), Some(location)) => format!("Looking for {keyword} in {location}? {pitch}"),
            (Some(keyword), None) => format!("Looking for {keyword}? {pitch}"),
            (None, _) if !page.title.trim().is_empty() => format!("{}. {pitch}", page.title.trim()),
            (None, _) => format!("{}: {pitch}", self.site_name),
        };

        self.fit_description(&sentence)
    }

    /// Pad short text with the call-to-action and fillers, truncate long text
    fn fit_description(&self, sentence: &str) -> String {
        let min = self.config.description_min_length;
        let max = self.config.description_max_length;
        let mut description = normalize_whitespace(sentence);

        let call_to_action = self.config.call_to_action.trim();
        if char_len(&description) < min && !call_to_action.is_empty() {
            description.push(' ');
            description.push_str(call_to_action);
        }

        let mut fillers = DESCRIPTION_FILLERS.iter().cycle();
        while char_len(&description) < min {
            if let Some(filler) = fillers.next() {
                description.push(' ');
                description.push_str(filler);
            }
        }

        truncate_with_ellipsis(&description, max)
    }

    pub fn validate_meta_description_length(&self, description: &str) -> bool {
        let len = char_len(description);
        len >= self.config.description_min_length && len <= self.config.description_max_length
    }

    pub fn generate_open_graph_tags(&self, page: &Page) -> SocialCard {
        self.social_card(page, "website")
    }

    pub fn generate_twitter_card_tags(&self, page: &Page) -> SocialCard {
        self.social_card(page, "summary_large_image")
    }

    fn social_card(&self, page: &Page, card_type: &str) -> SocialCard {
        let service = self.taxonomy.detect_service(&page.url);
        let title = if page.title.trim().is_empty() {
            page.h1.clone()
        } else {
            page.title.clone()
        };

        SocialCard {
            title,
            description: page.meta_description.clone(),
            image: self.scope.absolute(self.taxonomy.image_for(service.as_deref())),
            url: page
                .canonical_url
                .clone()
                .unwrap_or_else(|| self.scope.key(&page.url)),
            card_type: card_type.to_string(),
        }
    }

    /// Canonical URL for a page given its near-duplicates
    ///
    /// The variant with the highest word count wins; ties go to the shorter URL
    /// and then to the lexically smaller one.
    pub fn generate_canonical_tag(&self, page: &Page, duplicates: &[&Page]) -> String {
        if duplicates.is_empty() {
            return page.url.clone();
        }

        std::iter::once(page)
            .chain(duplicates.iter().copied())
            .min_by(|a, b| {
                b.word_count
                    .cmp(&a.word_count)
                    .then(a.url.len().cmp(&b.url.len()))
                    .then(a.url.cmp(&b.url))
            })
            .map(|winner| winner.url.clone())
            .unwrap_or_else(|| page.url.clone())
    }

    pub fn duplicate_h1_groups(&self, pages: &[Page]) -> Vec<Vec<String>> {
        duplicate_groups(pages.iter().map(|p| (p.url.as_str(), p.h1.as_str())))
    }

    pub fn duplicate_title_groups(&self, pages: &[Page]) -> Vec<Vec<String>> {
        duplicate_groups(pages.iter().map(|p| (p.url.as_str(), p.title.as_str())))
    }

    pub fn duplicate_description_groups(&self, pages: &[Page]) -> Vec<Vec<String>> {
        duplicate_groups(pages.iter().map(|p| (p.url.as_str(), p.meta_description.as_str())))
    }

    /// False if any two pages share an H1 (trimmed, case-insensitive)
    pub fn validate_h1_uniqueness(&self, pages: &[Page]) -> bool {
        self.duplicate_h1_groups(pages).is_empty()
    }

    /// False if any two pages share a title, or any two share a description
    pub fn validate_meta_uniqueness(&self, pages: &[Page]) -> bool {
        self.duplicate_title_groups(pages).is_empty()
            && self.duplicate_description_groups(pages).is_empty()
    }

    /// Fill in whatever metadata the page is missing, using its tracked keywords
    pub fn fill_missing(&self, page: &mut Page) -> MetadataChanges {
        let mut changes = MetadataChanges::default();
        let keywords = page.keywords.clone();

        if page.title.trim().is_empty() {
            page.title = self.generate_title(page, &keywords);
            changes.fields.push("title");
        }
        if page.h1.trim().is_empty() {
            page.h1 = self.generate_h1(page, &keywords);
            changes.fields.push("h1");
        }
        if !self.validate_meta_description_length(&page.meta_description) {
            page.meta_description = self.generate_meta_description(page, &keywords);
            changes.fields.push("meta_description");
        }
        if page.canonical_url.is_none() {
            page.canonical_url = Some(self.scope.key(&page.url));
            changes.fields.push("canonical_url");
        }
        if page.open_graph.is_none() {
            page.open_graph = Some(self.generate_open_graph_tags(page));
            changes.fields.push("open_graph");
        }
        if page.twitter_card.is_none() {
            page.twitter_card = Some(self.generate_twitter_card_tags(page));
            changes.fields.push("twitter_card");
        }

        if !changes.is_empty() {
            ::log::debug!("Filled {:?} on {}", changes.fields, page.url);
        }
        changes
    }

    /// Length and presence problems with a page's own metadata
    pub fn page_issues(&self, page: &Page) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.validate_title_length(&page.title) {
            issues.push(format!(
                "title length {} outside {}..={}",
                char_len(&page.title),
                self.config.title_min_length,
                self.config.title_max_length
            ));
        }
        if page.h1.trim().is_empty() {
            issues.push("missing H1".to_string());
        }
        if !self.validate_meta_description_length(&page.meta_description) {
            issues.push(format!(
                "meta description length {} outside {}..={}",
                char_len(&page.meta_description),
                self.config.description_min_length,
                self.config.description_max_length
            ));
        }
        issues
    }
}

fn primary(keywords: &[String]) -> Option<&str> {
    keywords.iter().map(|k| k.trim()).find(|k| !k.is_empty())
}

fn mentions(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(&phrase.to_lowercase())
}

/// Title-cased words of the URL path; `"Home"` for the site root
fn slug_title(url: &str) -> String {
    let words = slug_words(url);
    if words.is_empty() {
        "Home".to_string()
    } else {
        title_case(&words.join(" "))
    }
}

/// URLs sharing a value, grouped in order of first appearance; blank values are skipped
fn duplicate_groups<'a>(values: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<Vec<String>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();

    for (url, value) in values {
        let key = value.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let urls = groups.entry(key.clone()).or_default();
        if urls.is_empty() {
            order.push(key);
        }
        urls.push(url.to_string());
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|urls| urls.len() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeoConfig, TaxonomyConfig};

    fn manager() -> MetadataManager {
        let config = SeoConfig::default();
        MetadataManager::new(
            config.metadata.clone(),
            &config.site,
            Taxonomy::new(TaxonomyConfig::default()),
            LinkScope::new(&config.site).unwrap(),
        )
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_h1_with_location_and_service() {
        let page = Page::new("/andheri/sofa-polishing", "");
        let h1 = manager().generate_h1(&page, &kw(&["Best sofa care"]));
        assert_eq!(h1, "Best sofa care in Andheri - Sofa Polishing");
    }

    #[test]
    fn test_h1_degrades_gracefully() {
        let m = manager();
        let keywords = kw(&["Furniture experts"]);
        assert_eq!(
            m.generate_h1(&Page::new("/bandra", ""), &keywords),
            "Furniture experts in Bandra"
        );
        assert_eq!(
            m.generate_h1(&Page::new("/upholstery", ""), &keywords),
            "Furniture experts - Upholstery"
        );
        assert_eq!(m.generate_h1(&Page::new("/about", ""), &keywords), "Furniture experts");
    }

    #[test]
    fn test_h1_falls_back_to_title() {
        let page = Page::new("/andheri", "").with_title("About our team");
        assert_eq!(manager().generate_h1(&page, &[]), "About our team");
    }

    #[test]
    fn test_h1_uniqueness_is_trimmed_and_case_insensitive() {
        let m = manager();
        let pages = vec![
            Page::new("/a", "").with_h1("Sofa Polishing"),
            Page::new("/b", "").with_h1("  sofa polishing "),
            Page::new("/c", "").with_h1("Upholstery"),
        ];
        assert!(!m.validate_h1_uniqueness(&pages));
        assert_eq!(m.duplicate_h1_groups(&pages), vec![vec!["/a".to_string(), "/b".to_string()]]);

        let unique = vec![
            Page::new("/a", "").with_h1("Sofa Polishing"),
            Page::new("/b", "").with_h1("Upholstery"),
            Page::new("/c", ""),
            Page::new("/d", ""),
        ];
        assert!(m.validate_h1_uniqueness(&unique));
    }

    #[test]
    fn test_meta_description_round_trip_lengths() {
        let m = manager();
        let cases = vec![
            (Page::new("/andheri/sofa-polishing", ""), kw(&["sofa polishing"])),
            (Page::new("/about", ""), vec![]),
            (Page::new("/about", "").with_title("About us"), vec![]),
            (Page::new("/bandra", ""), kw(&["x"])),
            (Page::new("/thane/carpentry", ""), kw(&[&"very long keyword ".repeat(20)])),
        ];
        for (page, keywords) in cases {
            let description = m.generate_meta_description(&page, &keywords);
            assert!(
                m.validate_meta_description_length(&description),
                "{} chars: {}",
                char_len(&description),
                description
            );
        }
    }

    #[test]
    fn test_long_description_is_truncated_with_ellipsis() {
        let m = manager();
        let page = Page::new("/a", "");
        let description = m.generate_meta_description(&page, &kw(&[&"word ".repeat(60)]));
        assert!(description.ends_with("..."));
        assert_eq!(char_len(&description), 160);
    }

    #[test]
    fn test_short_description_uses_call_to_action() {
        let m = manager();
        let description = m.generate_meta_description(&Page::new("/bandra", ""), &kw(&["polish"]));
        assert!(description.starts_with("Looking for polish in Bandra?"));
        assert!(description.contains("Call today"));
    }

    #[test]
    fn test_description_is_deterministic() {
        let m = manager();
        let page = Page::new("/andheri/sofa-repair", "");
        let keywords = kw(&["sofa repair"]);
        assert_eq!(
            m.generate_meta_description(&page, &keywords),
            m.generate_meta_description(&page, &keywords)
        );
    }

    #[test]
    fn test_social_cards_pick_service_image() {
        let m = manager();
        let page = Page::new("/andheri/sofa-polishing", "")
            .with_title("Sofa Polishing in Andheri")
            .with_meta_description("desc");
        let og = m.generate_open_graph_tags(&page);
        assert_eq!(og.image, "https://example.com/images/og/sofa-polishing.jpg");
        assert_eq!(og.url, "https://example.com/andheri/sofa-polishing");
        assert_eq!(og.card_type, "website");
        assert_eq!(og.description, "desc");

        let twitter = m.generate_twitter_card_tags(&Page::new("/contact", ""));
        assert_eq!(twitter.image, "https://example.com/images/og/default.jpg");
        assert_eq!(twitter.card_type, "summary_large_image");
    }

    #[test]
    fn test_canonical_prefers_word_count_then_short_url() {
        let m = manager();
        let page = Page::new("/sofa-polishing-andheri-west", "").with_word_count(400);
        let longer = Page::new("/sofa-polishing-andheri", "").with_word_count(400);
        let bigger = Page::new("/sofa-andheri-long-url", "").with_word_count(500);

        assert_eq!(m.generate_canonical_tag(&page, &[]), page.url);
        assert_eq!(m.generate_canonical_tag(&page, &[&longer]), longer.url);
        assert_eq!(m.generate_canonical_tag(&page, &[&longer, &bigger]), bigger.url);
    }

    #[test]
    fn test_meta_uniqueness_checks_titles_and_descriptions() {
        let m = manager();
        let distinct = vec![
            Page::new("/a", "").with_title("A").with_meta_description("one"),
            Page::new("/b", "").with_title("B").with_meta_description("two"),
        ];
        assert!(m.validate_meta_uniqueness(&distinct));

        let same_title = vec![
            Page::new("/a", "").with_title("Same").with_meta_description("one"),
            Page::new("/b", "").with_title("same").with_meta_description("two"),
        ];
        assert!(!m.validate_meta_uniqueness(&same_title));

        let same_description = vec![
            Page::new("/a", "").with_title("A").with_meta_description("dup"),
            Page::new("/b", "").with_title("B").with_meta_description("DUP "),
        ];
        assert!(!m.validate_meta_uniqueness(&same_description));
    }

    #[test]
    fn test_title_generation_respects_max_length() {
        let m = manager();
        let page = Page::new("/andheri/sofa-polishing", "");
        let title = m.generate_title(&page, &kw(&["sofa polishing"]));
        assert_eq!(title, "Sofa Polishing in Andheri | Furniture Care");
        assert!(char_len(&title) <= 60);

        let long = m.generate_title(&page, &kw(&[&"long ".repeat(30)]));
        assert!(char_len(&long) <= 60);
    }

    #[test]
    fn test_title_names_the_service_of_the_page() {
        let m = manager();
        let keywords = kw(&["sofa care"]);
        let repair = m.generate_title(&Page::new("/andheri/sofa-repair", ""), &keywords);
        let polish = m.generate_title(&Page::new("/andheri/sofa-polishing", ""), &keywords);
        assert_eq!(repair, "Sofa Care in Andheri - Sofa Repair | Furniture Care");
        assert_eq!(polish, "Sofa Care in Andheri - Sofa Polishing | Furniture Care");
    }

    #[test]
    fn test_keywordless_title_uses_path_words_and_is_padded() {
        let m = manager();
        let about = m.generate_title(&Page::new("/about", ""), &[]);
        assert_eq!(about, "About - Expert Services | Furniture Care");
        assert!(m.validate_title_length(&about));

        let home = m.generate_title(&Page::new("https://example.com/", ""), &[]);
        assert!(home.starts_with("Home - "));
        assert!(m.validate_title_length(&home));

        let from_h1 = m.generate_title(&Page::new("/x", "").with_h1("Our  workshop in Thane"), &[]);
        assert_eq!(from_h1, "Our workshop in Thane | Furniture Care");
    }

    #[test]
    fn test_fill_missing_gives_distinct_pages_distinct_valid_metadata() {
        let m = manager();
        let mut pages = vec![
            Page::new("/about", ""),
            Page::new("/contact", ""),
            Page::new("/andheri/sofa-polishing", ""),
            Page::new("/andheri/sofa-repair", ""),
            Page::new("/bandra/sofa-polishing", "").with_keywords(["furniture care"]),
            Page::new("/bandra/upholstery", "").with_keywords(["furniture care"]),
        ];
        for page in &mut pages {
            m.fill_missing(page);
        }

        for page in &pages {
            assert!(m.page_issues(page).is_empty(), "{}: {:?}", page.url, m.page_issues(page));
        }
        assert!(m.validate_meta_uniqueness(&pages), "{:?}", m.duplicate_title_groups(&pages));
        assert!(m.validate_h1_uniqueness(&pages), "{:?}", m.duplicate_h1_groups(&pages));
    }

    #[test]
    fn test_fill_missing_only_touches_blank_fields() {
        let m = manager();
        let mut page = Page::new("/andheri/sofa-polishing", "")
            .with_title("Existing title")
            .with_keywords(["sofa polishing"]);
        let changes = m.fill_missing(&mut page);

        assert_eq!(page.title, "Existing title");
        assert_eq!(page.h1, "sofa polishing in Andheri - Sofa Polishing");
        assert!(m.validate_meta_description_length(&page.meta_description));
        assert_eq!(
            page.canonical_url.as_deref(),
            Some("https://example.com/andheri/sofa-polishing")
        );
        assert!(page.open_graph.is_some() && page.twitter_card.is_some());
        assert!(!changes.fields.contains(&"title"));

        let again = m.fill_missing(&mut page);
        assert!(again.is_empty());
    }
}
