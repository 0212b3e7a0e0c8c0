use crate::links::{LinkGraph, LinkGraphAnalyzer};
use crate::page::{Link, Page};
use crate::taxonomy::PageProfile;
use crate::utils::{first_words, slug_words};

const SHARED_SERVICE_SCORE: u32 = 3;
const SHARED_LOCATION_SCORE: u32 = 2;
const SHARED_TOKEN_SCORE: u32 = 1;

/// A page judged related enough to receive a new link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Corpus index of the candidate page
    pub index: usize,
    pub url: String,
    pub score: u32,
    /// Why the pages are related, stored as the link context
    pub reason: String,
}

/// Relevance of `other` to `profile`, or `None` when they share neither
/// service nor location
fn relevance(profile: &PageProfile, other: &PageProfile) -> Option<(u32, String)> {
    let shared_service = profile.service.is_some() && profile.service == other.service;
    let shared_location = profile.location.is_some() && profile.location == other.location;
    if !shared_service && !shared_location {
        return None;
    }

    let shared_tokens = profile
        .keyword_tokens
        .iter()
        .filter(|t| other.keyword_tokens.contains(t))
        .count() as u32;

    let mut score = shared_tokens * SHARED_TOKEN_SCORE;
    let mut reasons = Vec::new();
    if shared_service {
        score += SHARED_SERVICE_SCORE;
        reasons.push(format!("service '{}'", profile.service.as_deref().unwrap_or_default()));
    }
    if shared_location {
        score += SHARED_LOCATION_SCORE;
        reasons.push(format!("location '{}'", profile.location.as_deref().unwrap_or_default()));
    }

    Some((score, format!("related page: shared {}", reasons.join(" and "))))
}

/// Candidates sorted by descending score; ties keep corpus order
fn rank(mut candidates: Vec<LinkCandidate>) -> Vec<LinkCandidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Anchor text for a link from `source` to `target`
///
/// A keyword both pages track, else the target's leading keyword, else the
/// first three words of the target's title (then H1, then URL slug).
pub fn anchor_text(source: &Page, target: &Page) -> String {
    let source_keywords: Vec<String> = source
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .collect();

    let shared = target
        .keywords
        .iter()
        .map(|k| k.trim())
        .find(|k| !k.is_empty() && source_keywords.contains(&k.to_lowercase()));
    if let Some(keyword) = shared {
        return keyword.to_string();
    }

    if let Some(keyword) = target.primary_keyword() {
        return keyword.to_string();
    }

    for text in [&target.title, &target.h1] {
        let words = first_words(text, 3);
        if !words.is_empty() {
            return words;
        }
    }

    slug_words(&target.url).join(" ")
}

impl LinkGraphAnalyzer {
    /// Profiles for every page, in corpus order
    pub fn profiles(&self, pages: &[Page]) -> Vec<PageProfile> {
        pages.iter().map(|p| self.taxonomy.profile(p)).collect()
    }

    /// Related pages `page` does not link to yet, best first
    ///
    /// Read-only: safe to run for many pages at once against a shared
    /// profile list.
    pub fn rank_link_candidates(&self, page: &Page, profiles: &[PageProfile]) -> Vec<LinkCandidate> {
        let own = self.taxonomy.profile(page);
        let own_key = self.scope.key(&page.url);
        let linked: Vec<String> = page
            .outgoing_links
            .iter()
            .filter(|l| l.is_internal())
            .map(|l| self.scope.key(&l.target_url))
            .collect();

        let candidates = profiles
            .iter()
            .enumerate()
            .filter_map(|(index, other)| {
                let key = self.scope.key(&other.url);
                if key == own_key || linked.contains(&key) {
                    return None;
                }
                relevance(&own, other).map(|(score, reason)| LinkCandidate {
                    index,
                    url: other.url.clone(),
                    score,
                    reason,
                })
            })
            .collect();

        rank(candidates)
    }

    /// Add links from `pages[source]` to candidates until it has `target_count`
    /// internal outgoing links
    ///
    /// Candidates that are already linked or whose link would close a cycle
    /// are skipped. The graph is updated alongside the pages.
    pub fn apply_link_candidates(
        &self,
        pages: &mut [Page],
        graph: &mut LinkGraph,
        source: usize,
        candidates: &[LinkCandidate],
        target_count: usize,
    ) -> Vec<Link> {
        let mut added = Vec::new();

        for candidate in candidates {
            if pages[source].internal_outgoing_count() >= target_count {
                break;
            }
            let target = candidate.index;
            if target == source || target >= pages.len() || graph.has_edge(source, target) {
                continue;
            }
            if graph.reaches(target, source) {
                ::log::debug!(
                    "Skipping link {} -> {}: would create a circular reference",
                    pages[source].url,
                    pages[target].url
                );
                continue;
            }

            let link = self.connect(pages, graph, source, target, &candidate.reason);
            added.push(link);
        }

        added
    }

    /// Give the page at `source_url` up to `target_count` internal outgoing links
    pub fn generate_outgoing_links(
        &self,
        pages: &mut [Page],
        source_url: &str,
        target_count: usize,
    ) -> Vec<Link> {
        let mut graph = self.graph(pages);
        let Some(source) = graph.position(&self.scope.key(source_url)) else {
            ::log::warn!("Cannot generate links for unknown page {}", source_url);
            return Vec::new();
        };
        if pages[source].internal_outgoing_count() >= target_count {
            return Vec::new();
        }

        let profiles = self.profiles(pages);
        let candidates = self.rank_link_candidates(&pages[source], &profiles);
        let added = self.apply_link_candidates(pages, &mut graph, source, &candidates, target_count);

        ::log::debug!("Generated {} outgoing links for {}", added.len(), source_url);
        added
    }

    /// Link up to `max_orphan_parents` related pages into each orphan
    pub fn fix_orphan_pages(&self, orphan_urls: &[String], pages: &mut [Page]) -> Vec<Link> {
        self.fix_orphan_pages_with(orphan_urls, pages, |_| true)
    }

    /// Orphan repair restricted to parents for which `eligible(index)` holds
    pub(crate) fn fix_orphan_pages_with(
        &self,
        orphan_urls: &[String],
        pages: &mut [Page],
        eligible: impl Fn(usize) -> bool,
    ) -> Vec<Link> {
        let mut graph = self.graph(pages);
        let profiles = self.profiles(pages);
        let mut added = Vec::new();

        for orphan_url in orphan_urls {
            let Some(orphan) = graph.position(&self.scope.key(orphan_url)) else {
                ::log::warn!("Orphan {} is not part of the corpus", orphan_url);
                continue;
            };

            let mut parents: Vec<LinkCandidate> = profiles
                .iter()
                .enumerate()
                .filter(|(index, _)| {
                    *index != orphan && eligible(*index) && !graph.has_edge(*index, orphan)
                })
                .filter_map(|(index, profile)| {
                    relevance(&profiles[orphan], profile).map(|(score, reason)| LinkCandidate {
                        index,
                        url: profile.url.clone(),
                        score,
                        reason,
                    })
                })
                .collect();
            parents = rank(parents);

            let mut linked = 0;
            for parent in parents {
                if linked >= self.config.max_orphan_parents {
                    break;
                }
                if graph.reaches(orphan, parent.index) {
                    continue;
                }
                let reason = parent.reason.replace("related page", "orphan repair");
                added.push(self.connect(pages, &mut graph, parent.index, orphan, &reason));
                linked += 1;
            }

            if linked == 0 {
                ::log::warn!("No parent page found for orphan {}", orphan_url);
            } else {
                ::log::debug!("Linked {} parents into orphan {}", linked, orphan_url);
            }
        }

        added
    }

    /// Write `from -> to` into both pages' link lists and the graph
    fn connect(
        &self,
        pages: &mut [Page],
        graph: &mut LinkGraph,
        from: usize,
        to: usize,
        reason: &str,
    ) -> Link {
        let anchor = anchor_text(&pages[from], &pages[to]);
        let link = Link::internal(&pages[from].url, &pages[to].url, &anchor).with_context(reason);

        pages[from].outgoing_links.push(link.clone());
        pages[to].incoming_links.push(link.clone());
        graph.add_edge(from, to);
        link
    }
}
