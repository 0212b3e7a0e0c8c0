use crate::config::SiteConfig;
use crate::error::{Result, SeoError};
use regex::Regex;
use url::Url;

/// Decides which URLs belong to the site and normalises them into graph keys
///
/// Page and link URLs may be stored as absolute URLs or as site-relative
/// paths. Both forms of the same page map to one key.
#[derive(Debug, Clone)]
pub struct LinkScope {
    base_url: Url,
    asset_regexes: Vec<Regex>,
}

impl LinkScope {
    /// Create a scope from the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SeoError::invalid_url(&config.base_url, e))?;

        let mut asset_regexes = Vec::with_capacity(config.asset_patterns.len());
        for pattern in &config.asset_patterns {
            asset_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            base_url,
            asset_regexes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `url` against the base URL
    pub fn resolve(&self, url: &str) -> Result<Url> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(SeoError::invalid_url(url, "empty URL"));
        }
        self.base_url
            .join(trimmed)
            .map_err(|e| SeoError::invalid_url(url, e))
    }

    /// Graph key for a URL: absolute, no fragment, no trailing slash
    pub fn normalize(&self, url: &str) -> Result<String> {
        let mut resolved = self.resolve(url)?;
        resolved.set_fragment(None);

        let mut key = resolved.to_string();
        if resolved.path() != "/" && resolved.query().is_none() && key.ends_with('/') {
            key.pop();
        }
        Ok(key)
    }

    /// Graph key, falling back to the raw string when it cannot be resolved
    pub fn key(&self, url: &str) -> String {
        self.normalize(url).unwrap_or_else(|_| url.trim().to_string())
    }

    /// Whether the URL points at a page on this site
    pub fn is_internal(&self, url: &str) -> bool {
        match self.resolve(url) {
            Ok(resolved) => {
                resolved.host_str() == self.base_url.host_str() && !self.is_asset(&resolved)
            }
            Err(_) => false,
        }
    }

    /// Whether the URL is a static asset rather than a page
    pub fn is_asset(&self, url: &Url) -> bool {
        let path = url.path();
        self.asset_regexes.iter().any(|regex| regex.is_match(path))
    }

    /// Absolute form of a site-relative resource path, for social card images
    pub fn absolute(&self, path: &str) -> String {
        self.resolve(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.to_string())
    }
}
