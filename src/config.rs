use crate::error::{Result, SeoError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Site identity used to resolve relative URLs and brand generated text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL of the site
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Brand name appended to generated titles
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Regex patterns for URLs that are never treated as pages (assets etc.)
    #[serde(default = "default_asset_patterns")]
    pub asset_patterns: Vec<String>,
}

/// Thresholds for the content validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Minimum number of words a page must have
    #[serde(default = "default_min_word_count")]
    pub min_word_count: usize,

    /// Lowest acceptable keyword density (ratio, inclusive)
    #[serde(default = "default_density_min")]
    pub keyword_density_min: f64,

    /// Highest acceptable keyword density (ratio, inclusive)
    #[serde(default = "default_density_max")]
    pub keyword_density_max: f64,
}

/// Bounds and fixed text used by the metadata manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_description_min")]
    pub description_min_length: usize,

    #[serde(default = "default_description_max")]
    pub description_max_length: usize,

    #[serde(default = "default_title_min")]
    pub title_min_length: usize,

    #[serde(default = "default_title_max")]
    pub title_max_length: usize,

    /// Appended to descriptions that are too short
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,
}

/// Service and location vocabulary detected from page URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Known service categories, lower case, words separated by spaces
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Known locations, lower case, words separated by spaces
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Social card image per service keyword
    #[serde(default = "default_service_images")]
    pub service_images: BTreeMap<String, String>,

    /// Image used when no service keyword matches
    #[serde(default = "default_image")]
    pub default_image: String,
}

/// Link repair targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Minimum outgoing internal links per page
    #[serde(default = "default_min_outgoing_links")]
    pub min_outgoing_links: usize,

    /// Maximum number of parents linked into each orphan
    #[serde(default = "default_max_orphan_parents")]
    pub max_orphan_parents: usize,
}

/// Core Web Vitals limits for the performance gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    /// Largest contentful paint, milliseconds
    #[serde(default = "default_max_lcp_ms")]
    pub max_lcp_ms: f64,

    /// First input delay, milliseconds
    #[serde(default = "default_max_fid_ms")]
    pub max_fid_ms: f64,

    /// Cumulative layout shift, unitless
    #[serde(default = "default_max_cls")]
    pub max_cls: f64,
}

/// Settings for the batch run itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Per-page worker pool size; defaults to the number of available cores
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Issues listed per category in the report
    #[serde(default = "default_max_report_issues")]
    pub max_report_issues: usize,
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    #[serde(default)]
    pub links: LinkConfig,

    #[serde(default)]
    pub performance: PerformanceThresholds,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl SeoConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured bounds are consistent with each other
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.site.base_url)
            .map_err(|e| SeoError::Config(format!("site.base_url: {e}")))?;

        if self.content.keyword_density_min > self.content.keyword_density_max {
            return Err(SeoError::Config(
                "content.keyword_density_min exceeds keyword_density_max".to_string(),
            ));
        }

        let meta = &self.metadata;
        // Truncation reserves three characters for the ellipsis
        if meta.description_max_length < 4 || meta.description_min_length > meta.description_max_length
        {
            return Err(SeoError::Config(format!(
                "metadata description bounds {}..{} are not usable",
                meta.description_min_length, meta.description_max_length
            )));
        }
        if meta.title_min_length > meta.title_max_length {
            return Err(SeoError::Config(
                "metadata.title_min_length exceeds title_max_length".to_string(),
            ));
        }

        if self.batch.max_concurrency == Some(0) {
            return Err(SeoError::Config(
                "batch.max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Worker pool size for the per-page phase
    pub fn worker_count(&self) -> usize {
        self.batch.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_name: default_site_name(),
            asset_patterns: default_asset_patterns(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_word_count: default_min_word_count(),
            keyword_density_min: default_density_min(),
            keyword_density_max: default_density_max(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            description_min_length: default_description_min(),
            description_max_length: default_description_max(),
            title_min_length: default_title_min(),
            title_max_length: default_title_max(),
            call_to_action: default_call_to_action(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            locations: default_locations(),
            service_images: default_service_images(),
            default_image: default_image(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            min_outgoing_links: default_min_outgoing_links(),
            max_orphan_parents: default_max_orphan_parents(),
        }
    }
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            max_lcp_ms: default_max_lcp_ms(),
            max_fid_ms: default_max_fid_ms(),
            max_cls: default_max_cls(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            max_report_issues: default_max_report_issues(),
        }
    }
}

fn default_base_url() -> String {
    "https://example.com".to_string()
}

fn default_site_name() -> String {
    "Furniture Care".to_string()
}

fn default_asset_patterns() -> Vec<String> {
    vec![r"\.(jpg|jpeg|png|gif|webp|css|js|ico|svg|woff|woff2|ttf|eot|pdf)$".to_string()]
}

fn default_min_word_count() -> usize {
    300
}

fn default_density_min() -> f64 {
    0.01
}

fn default_density_max() -> f64 {
    0.03
}

fn default_description_min() -> usize {
    150
}

fn default_description_max() -> usize {
    160
}

fn default_title_min() -> usize {
    30
}

fn default_title_max() -> usize {
    60
}

fn default_call_to_action() -> String {
    "Call today for a free quote and same-day service.".to_string()
}

fn default_services() -> Vec<String> {
    [
        "sofa polishing",
        "sofa repair",
        "sofa cleaning",
        "furniture polishing",
        "furniture repair",
        "wood polishing",
        "table polishing",
        "bed polishing",
        "chair repair",
        "upholstery",
        "carpentry",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_locations() -> Vec<String> {
    [
        "andheri",
        "bandra",
        "borivali",
        "chembur",
        "colaba",
        "dadar",
        "ghatkopar",
        "goregaon",
        "juhu",
        "kandivali",
        "kharghar",
        "malad",
        "mulund",
        "navi mumbai",
        "powai",
        "santacruz",
        "thane",
        "vashi",
        "vile parle",
        "worli",
        "mumbai",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_service_images() -> BTreeMap<String, String> {
    [
        ("sofa", "/images/og/sofa-polishing.jpg"),
        ("polishing", "/images/og/wood-polishing.jpg"),
        ("repair", "/images/og/furniture-repair.jpg"),
        ("upholstery", "/images/og/upholstery.jpg"),
        ("carpentry", "/images/og/carpentry.jpg"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_image() -> String {
    "/images/og/default.jpg".to_string()
}

fn default_min_outgoing_links() -> usize {
    3
}

fn default_max_orphan_parents() -> usize {
    3
}

fn default_max_lcp_ms() -> f64 {
    2500.0
}

fn default_max_fid_ms() -> f64 {
    100.0
}

fn default_max_cls() -> f64 {
    0.1
}

fn default_max_report_issues() -> usize {
    10
}
