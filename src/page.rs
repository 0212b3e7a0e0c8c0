use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a link stays inside the corpus or points elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Internal,
    External,
}

/// Directed edge from one page to another page or resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub is_no_follow: bool,
    /// Free-text rationale for why the link exists
    #[serde(default)]
    pub context: String,
}

impl Link {
    /// Create an internal, followed link
    pub fn internal(source_url: &str, target_url: &str, anchor_text: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            target_url: target_url.to_string(),
            anchor_text: anchor_text.to_string(),
            link_type: LinkType::Internal,
            is_no_follow: false,
            context: String::new(),
        }
    }

    /// Create an external link
    pub fn external(source_url: &str, target_url: &str, anchor_text: &str) -> Self {
        Self {
            link_type: LinkType::External,
            ..Self::internal(source_url, target_url, anchor_text)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn is_internal(&self) -> bool {
        self.link_type == LinkType::Internal
    }

    pub fn is_self_link(&self) -> bool {
        self.source_url == self.target_url
    }
}

/// Fixed-shape social card used for both Open Graph and Twitter tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialCard {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    pub card_type: String,
}

/// One page of the site, as produced by the page store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique key within the corpus
    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub h1: String,

    #[serde(default)]
    pub meta_description: String,

    /// Derived from duplicates or the page URL when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    #[serde(default)]
    pub word_count: usize,

    /// Extracted body text (plain, Markdown or HTML)
    #[serde(default)]
    pub content: String,

    /// Tracked keywords, primary keyword first
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub incoming_links: Vec<Link>,

    #[serde(default)]
    pub outgoing_links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_graph: Option<SocialCard>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<SocialCard>,

    /// Opaque, passed through unmodified
    #[serde(default)]
    pub structured_data: serde_json::Value,

    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,

    /// Advisory 0-100 score written by the batch run
    #[serde(default)]
    pub seo_score: u8,
}

impl Page {
    /// Create a page with the given URL and content; word count is taken from the content
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            url: url.into(),
            title: String::new(),
            h1: String::new(),
            meta_description: String::new(),
            canonical_url: None,
            word_count: content.split_whitespace().count(),
            content,
            keywords: Vec::new(),
            incoming_links: Vec::new(),
            outgoing_links: Vec::new(),
            open_graph: None,
            twitter_card: None,
            structured_data: serde_json::Value::Null,
            last_modified: Utc::now(),
            seo_score: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_h1(mut self, h1: impl Into<String>) -> Self {
        self.h1 = h1.into();
        self
    }

    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.meta_description = description.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    /// Primary tracked keyword, if any
    pub fn primary_keyword(&self) -> Option<&str> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
    }

    /// Whether this page already has an internal outgoing link to `target_url`
    pub fn links_to(&self, target_url: &str) -> bool {
        self.outgoing_links
            .iter()
            .any(|l| l.is_internal() && l.target_url == target_url)
    }

    /// Number of outgoing internal links, self-links excluded
    pub fn internal_outgoing_count(&self) -> usize {
        self.outgoing_links
            .iter()
            .filter(|l| l.is_internal() && !l.is_self_link())
            .count()
    }

    /// Stamp the page as modified now
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}
