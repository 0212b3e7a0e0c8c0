use crate::config::TaxonomyConfig;
use crate::page::Page;
use crate::utils::{keyword_tokens, slug_words};

/// Service, location and keyword tokens detected for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageProfile {
    pub url: String,
    /// Lower-case service phrase, e.g. "sofa polishing"
    pub service: Option<String>,
    /// Lower-case location phrase, e.g. "andheri"
    pub location: Option<String>,
    pub keyword_tokens: Vec<String>,
}

/// Detects the service category and location a page URL is about
#[derive(Debug, Clone)]
pub struct Taxonomy {
    services: Vec<Vec<String>>,
    locations: Vec<Vec<String>>,
    config: TaxonomyConfig,
}

impl Taxonomy {
    pub fn new(config: TaxonomyConfig) -> Self {
        let split = |phrases: &[String]| -> Vec<Vec<String>> {
            phrases
                .iter()
                .map(|p| p.split_whitespace().map(|w| w.to_lowercase()).collect::<Vec<_>>())
                .filter(|words| !words.is_empty())
                .collect()
        };

        Self {
            services: split(&config.services),
            locations: split(&config.locations),
            config,
        }
    }

    /// Service phrase found in the URL path, preferring the longest match
    pub fn detect_service(&self, url: &str) -> Option<String> {
        longest_match(&slug_words(url), &self.services)
    }

    /// Location phrase found in the URL path, preferring the longest match
    pub fn detect_location(&self, url: &str) -> Option<String> {
        longest_match(&slug_words(url), &self.locations)
    }

    pub fn profile(&self, page: &Page) -> PageProfile {
        let words = slug_words(&page.url);
        PageProfile {
            url: page.url.clone(),
            service: longest_match(&words, &self.services),
            location: longest_match(&words, &self.locations),
            keyword_tokens: keyword_tokens(&page.keywords),
        }
    }

    /// Social card image for a detected service, or the default image
    pub fn image_for(&self, service: Option<&str>) -> &str {
        service
            .into_iter()
            .flat_map(|s| s.split_whitespace())
            .find_map(|word| self.config.service_images.get(word))
            .map(String::as_str)
            .unwrap_or(self.config.default_image.as_str())
    }
}

/// Longest phrase (by word count, then vocabulary order) occurring as
/// consecutive words
fn longest_match(words: &[String], vocabulary: &[Vec<String>]) -> Option<String> {
    let mut best: Option<&Vec<String>> = None;

    for phrase in vocabulary {
        let found = words.windows(phrase.len()).any(|window| window == phrase.as_slice());
        if found && best.is_none_or(|b| phrase.len() > b.len()) {
            best = Some(phrase);
        }
    }

    best.map(|phrase| phrase.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(TaxonomyConfig::default())
    }

    #[test]
    fn test_detects_service_and_location_from_slug() {
        let t = taxonomy();
        let url = "https://example.com/sofa-polishing-in-andheri";
        assert_eq!(t.detect_service(url).as_deref(), Some("sofa polishing"));
        assert_eq!(t.detect_location(url).as_deref(), Some("andheri"));
    }

    #[test]
    fn test_prefers_longest_location() {
        let t = taxonomy();
        assert_eq!(
            t.detect_location("/upholstery/navi-mumbai").as_deref(),
            Some("navi mumbai")
        );
    }

    #[test]
    fn test_partial_words_do_not_match() {
        let t = taxonomy();
        assert_eq!(t.detect_location("/bandrastyle-sofas"), None);
        assert_eq!(t.detect_service("/about-us"), None);
    }

    #[test]
    fn test_image_lookup_uses_first_known_service_word() {
        let t = taxonomy();
        assert_eq!(t.image_for(Some("sofa polishing")), "/images/og/sofa-polishing.jpg");
        assert_eq!(t.image_for(Some("furniture repair")), "/images/og/furniture-repair.jpg");
        assert_eq!(t.image_for(None), "/images/og/default.jpg");
    }

    #[test]
    fn test_profile_collects_keyword_tokens() {
        let t = taxonomy();
        let page = Page::new("/bandra/sofa-repair", "").with_keywords(["Sofa Repair Bandra"]);
        let profile = t.profile(&page);
        assert_eq!(profile.service.as_deref(), Some("sofa repair"));
        assert_eq!(profile.location.as_deref(), Some("bandra"));
        assert_eq!(profile.keyword_tokens, vec!["sofa", "repair", "bandra"]);
    }
}
