//! Internal link graph analysis and repair.
//!
//! The analyzer works on a corpus snapshot (`&[Page]` / `&mut [Page]`). Graph
//! algorithms run over [`LinkGraph`], an adjacency list keyed by normalised
//! URL; repairs write the new edge into both pages' link lists.

pub mod graph;
pub mod redirects;
pub mod repair;

pub use graph::LinkGraph;
pub use repair::LinkCandidate;

use crate::config::LinkConfig;
use crate::filter::LinkScope;
use crate::page::{Link, Page};
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Link summary for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkAnalysis {
    pub url: String,
    pub incoming_count: usize,
    pub outgoing_count: usize,
    pub internal_outgoing: usize,
    pub external_outgoing: usize,
    /// Anchor text of outgoing links -> number of uses
    pub anchor_texts: BTreeMap<String, usize>,
    /// Only meaningful after a corpus-wide pass
    pub is_orphan: bool,
    /// Internal targets that are not pages of the corpus
    pub dangling_targets: Vec<String>,
}

/// Builds, checks and repairs the internal link graph
#[derive(Debug, Clone)]
pub struct LinkGraphAnalyzer {
    config: LinkConfig,
    scope: LinkScope,
    taxonomy: Taxonomy,
}

impl LinkGraphAnalyzer {
    pub fn new(config: LinkConfig, scope: LinkScope, taxonomy: Taxonomy) -> Self {
        Self {
            config,
            scope,
            taxonomy,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn scope(&self) -> &LinkScope {
        &self.scope
    }

    pub fn graph(&self, pages: &[Page]) -> LinkGraph {
        LinkGraph::from_pages(pages, &self.scope)
    }

    /// Counts and anchor histogram for one page
    pub fn analyze_links(&self, page: &Page) -> LinkAnalysis {
        let mut anchor_texts = BTreeMap::new();
        for link in &page.outgoing_links {
            let anchor = link.anchor_text.trim();
            if !anchor.is_empty() {
                *anchor_texts.entry(anchor.to_string()).or_insert(0) += 1;
            }
        }

        let internal_outgoing = page.outgoing_links.iter().filter(|l| l.is_internal()).count();

        LinkAnalysis {
            url: page.url.clone(),
            incoming_count: page.incoming_links.len(),
            outgoing_count: page.outgoing_links.len(),
            internal_outgoing,
            external_outgoing: page.outgoing_links.len() - internal_outgoing,
            anchor_texts,
            is_orphan: false,
            dangling_targets: Vec::new(),
        }
    }

    /// Per-page analysis with orphan flags and dangling targets filled in
    pub fn analyze_corpus(&self, pages: &[Page]) -> Vec<LinkAnalysis> {
        let linked = self.linked_keys(pages);
        let known = self.page_keys(pages);

        pages
            .iter()
            .map(|page| {
                let mut analysis = self.analyze_links(page);
                analysis.is_orphan = !linked.contains(&self.scope.key(&page.url));
                analysis.dangling_targets = page
                    .outgoing_links
                    .iter()
                    .filter(|l| self.is_dangling(l, &known))
                    .map(|l| l.target_url.clone())
                    .collect();
                analysis
            })
            .collect()
    }

    /// URLs of pages no other page links to, in corpus order
    pub fn identify_orphan_pages(&self, pages: &[Page]) -> Vec<String> {
        let linked = self.linked_keys(pages);
        let orphans: Vec<String> = pages
            .iter()
            .filter(|p| !linked.contains(&self.scope.key(&p.url)))
            .map(|p| p.url.clone())
            .collect();

        ::log::debug!("Identified {} orphan pages", orphans.len());
        orphans
    }

    /// URLs of pages taking part in a circular reference, in corpus order
    pub fn detect_circular_references(&self, pages: &[Page]) -> Vec<String> {
        let members = self.graph(pages).cycle_members();
        pages
            .iter()
            .zip(members)
            .filter(|(_, in_cycle)| *in_cycle)
            .map(|(page, _)| page.url.clone())
            .collect()
    }

    /// True iff no circular references exist
    pub fn validate_link_hierarchy(&self, pages: &[Page]) -> bool {
        self.detect_circular_references(pages).is_empty()
    }

    /// Internal outgoing links whose target is not a page of the corpus
    pub fn find_dangling_links(&self, pages: &[Page]) -> Vec<Link> {
        let known = self.page_keys(pages);
        pages
            .iter()
            .flat_map(|p| p.outgoing_links.iter())
            .filter(|l| self.is_dangling(l, &known))
            .cloned()
            .collect()
    }

    fn is_dangling(&self, link: &Link, known: &HashSet<String>) -> bool {
        if !link.is_internal() {
            return false;
        }
        // Links to images and other assets are not page edges
        if let Ok(resolved) = self.scope.resolve(&link.target_url) {
            if self.scope.is_asset(&resolved) {
                return false;
            }
        }
        !known.contains(&self.scope.key(&link.target_url))
    }

    fn page_keys(&self, pages: &[Page]) -> HashSet<String> {
        pages.iter().map(|p| self.scope.key(&p.url)).collect()
    }

    /// Keys of every internal link target in the corpus, self-links excluded
    fn linked_keys(&self, pages: &[Page]) -> HashSet<String> {
        pages
            .iter()
            .flat_map(|p| p.incoming_links.iter().chain(p.outgoing_links.iter()))
            .filter(|l| l.is_internal())
            .filter_map(|l| {
                let target = self.scope.key(&l.target_url);
                (target != self.scope.key(&l.source_url)).then_some(target)
            })
            .collect()
    }
}
