//! Batch run over the whole corpus.
//!
//! A run snapshots the corpus, rewrites redirected links, then checks and
//! repairs every page on a bounded pool of tokio tasks. Each task owns its
//! page. Once every task has finished, the cross-page work (link repair,
//! orphan repair, canonical assignment) and the corpus-wide checks run
//! serially on the orchestrator.

use crate::config::SeoConfig;
use crate::content::{ContentValidator, heading_structure_is_valid};
use crate::error::{Result, SeoError};
use crate::filter::LinkScope;
use crate::links::{LinkCandidate, LinkGraphAnalyzer};
use crate::metadata::MetadataManager;
use crate::page::Page;
use crate::performance::{PerformanceGate, PerformanceProbe};
use crate::report::{AuditReport, CorpusFindings};
use crate::results::{BulkUpdateResult, Issue, IssueCategory};
use crate::store::{PageStore, RedirectSource};
use crate::taxonomy::{PageProfile, Taxonomy};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;

const ISSUE_PENALTY: u32 = 10;
const PERFORMANCE_PENALTY: u32 = 15;

/// Lifecycle of an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Cancels a run between pages
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub result: BulkUpdateResult,
    pub report: AuditReport,
}

/// Shared, read-only engine components handed to every page task
struct Components {
    content: ContentValidator,
    metadata: MetadataManager,
    links: LinkGraphAnalyzer,
    performance: PerformanceGate,
}

/// What the per-page phase learned about one page
#[derive(Debug, Default)]
struct PageReport {
    issues: Vec<Issue>,
    candidates: Vec<LinkCandidate>,
    mutated: bool,
}

pub struct BatchOrchestrator {
    config: SeoConfig,
    components: Arc<Components>,
    probe: Option<Arc<dyn PerformanceProbe>>,
    state: BatchState,
    corpus: Vec<Page>,
    snapshot: Option<Vec<Page>>,
    abort: AbortHandle,
}

impl BatchOrchestrator {
    /// Build the engine components from a validated configuration
    pub fn new(config: SeoConfig) -> Result<Self> {
        config.validate()?;

        let scope = LinkScope::new(&config.site)?;
        let taxonomy = Taxonomy::new(config.taxonomy.clone());
        let components = Components {
            content: ContentValidator::new(config.content.clone()),
            metadata: MetadataManager::new(
                config.metadata.clone(),
                &config.site,
                taxonomy.clone(),
                scope.clone(),
            ),
            links: LinkGraphAnalyzer::new(config.links.clone(), scope, taxonomy),
            performance: PerformanceGate::new(config.performance.clone()),
        };

        Ok(Self {
            config,
            components: Arc::new(components),
            probe: None,
            state: BatchState::Idle,
            corpus: Vec::new(),
            snapshot: None,
            abort: AbortHandle::default(),
        })
    }

    /// Measure every page with `probe` and gate it on the configured thresholds
    pub fn with_probe(mut self, probe: Arc<dyn PerformanceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// The corpus as left by the last run (or rollback)
    pub fn pages(&self) -> &[Page] {
        &self.corpus
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.corpus
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Keep the run's changes, optionally persisting them, and drop the snapshot
    pub fn commit(&mut self, store: Option<&dyn PageStore>) -> Result<()> {
        if let Some(store) = store {
            store.save_pages(&self.corpus)?;
        }
        self.snapshot = None;
        ::log::info!("Committed {} pages", self.corpus.len());
        Ok(())
    }

    /// Restore the corpus to its state before the last run
    ///
    /// Returns false when no snapshot is held.
    pub fn rollback(&mut self) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                ::log::info!("Rolled back {} pages", snapshot.len());
                self.corpus = snapshot;
                true
            }
            None => false,
        }
    }

    /// Load the corpus and redirect map from the collaborators, then run
    pub async fn run_from_store(
        &mut self,
        store: &dyn PageStore,
        redirects: Option<&dyn RedirectSource>,
    ) -> Result<BatchOutcome> {
        let loaded = store.load_pages().and_then(|pages| {
            let redirects = match redirects {
                Some(source) => source.load_redirects()?,
                None => HashMap::new(),
            };
            Ok((pages, redirects))
        });

        match loaded {
            Ok((pages, redirects)) => self.run(pages, &redirects).await,
            Err(e) => {
                ::log::error!("Failed to load corpus: {}", e);
                self.state = BatchState::Failed;
                Err(e)
            }
        }
    }

    /// Check, repair and score every page of `pages`
    ///
    /// Only a corpus with duplicate URLs is rejected outright; everything else
    /// ends up as issues or per-page failures in the outcome.
    pub async fn run(
        &mut self,
        pages: Vec<Page>,
        redirects: &HashMap<String, String>,
    ) -> Result<BatchOutcome> {
        self.state = BatchState::Running;
        if let Err(e) = self.check_corpus(&pages) {
            ::log::error!("Rejecting corpus: {}", e);
            self.state = BatchState::Failed;
            return Err(e);
        }

        let operation_id = uuid::Uuid::new_v4().to_string();
        ::log::info!("Starting batch {} over {} pages", operation_id, pages.len());

        self.snapshot = Some(pages.clone());
        self.corpus = pages;
        let mut result = BulkUpdateResult::new(&operation_id);
        let mut issues = Vec::new();
        let mut mutated = false;

        if !redirects.is_empty() {
            let rewritten = self
                .components
                .links
                .update_redirected_links(&mut self.corpus, redirects);
            mutated |= rewritten > 0;
        }

        let reports = self.run_page_phase(&mut result).await;
        for report in reports.iter().flatten() {
            mutated |= report.mutated;
            issues.extend(report.issues.iter().cloned());
        }

        let mut findings = CorpusFindings::default();
        let aborted = self.abort.is_aborted();
        if aborted {
            ::log::warn!("Batch {} aborted; skipping corpus-wide phase", operation_id);
        } else {
            let processed: Vec<bool> = reports.iter().map(Option::is_some).collect();
            let mut touched = BTreeSet::new();

            self.repair_links(&reports, &processed, &mut touched, &mut issues);
            self.assign_canonicals(&processed, &mut touched, &mut issues, &mut findings);
            self.check_corpus_integrity(&mut result, &mut issues, &mut findings);

            mutated |= !touched.is_empty();
            for index in touched {
                self.corpus[index].touch();
            }
            self.score_pages(&processed, &issues);
        }
        self.abort.reset();

        result.rollback_available = mutated && self.snapshot.is_some();
        self.state = if aborted {
            BatchState::Failed
        } else {
            BatchState::Completed
        };

        let urls: Vec<String> = self.corpus.iter().map(|p| p.url.clone()).collect();
        let report = AuditReport::build(
            &operation_id,
            &urls,
            result.failed_pages.len(),
            &issues,
            findings,
            self.config.batch.max_report_issues,
        );

        ::log::info!(
            "Batch {} finished: {} successful, {} failed, {} issues",
            operation_id,
            result.successful_pages.len(),
            result.failed_pages.len(),
            issues.len()
        );
        Ok(BatchOutcome { result, report })
    }

    fn check_corpus(&self, pages: &[Page]) -> Result<()> {
        let scope = self.components.links.scope();
        let mut seen = HashSet::with_capacity(pages.len());
        for page in pages {
            if !seen.insert(scope.key(&page.url)) {
                return Err(SeoError::DuplicateUrl(page.url.clone()));
            }
        }
        Ok(())
    }

    /// Run every page through its own task; returns one report per processed page
    async fn run_page_phase(&mut self, result: &mut BulkUpdateResult) -> Vec<Option<PageReport>> {
        let workers = self.config.worker_count();
        let semaphore = Arc::new(Semaphore::new(workers));
        let profiles: Arc<Vec<PageProfile>> =
            Arc::new(self.components.links.profiles(&self.corpus));
        ::log::debug!("Per-page phase on {} workers", workers);

        let mut handles = Vec::with_capacity(self.corpus.len());
        for page in std::mem::take(&mut self.corpus) {
            let semaphore = Arc::clone(&semaphore);
            let components = Arc::clone(&self.components);
            let probe = self.probe.clone();
            let profiles = Arc::clone(&profiles);
            let abort = self.abort.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (page, Err(SeoError::Task(e.to_string()))),
                };
                if abort.is_aborted() {
                    return (page, Err(SeoError::Aborted));
                }
                let mut page = page;
                let outcome = process_page(&mut page, &components, probe.as_deref(), &profiles).await;
                (page, outcome)
            }));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            let failure = match handle.await {
                Ok((page, Ok(report))) => {
                    result.record_success(&page.url);
                    self.corpus.push(page);
                    reports.push(Some(report));
                    continue;
                }
                Ok((page, Err(SeoError::Aborted))) => {
                    result.record_failure(&page.url, SeoError::Aborted.to_string());
                    self.corpus.push(page);
                    reports.push(None);
                    continue;
                }
                Ok((_, Err(e))) => e.to_string(),
                Err(e) => format!("page task panicked: {e}"),
            };

            let restored = self.restore_point(index);
            ::log::warn!("Page {} failed: {}", restored.url, failure);
            result.record_failure(&restored.url, failure);
            self.corpus.push(restored);
            reports.push(None);
        }
        reports
    }

    fn restore_point(&self, index: usize) -> Page {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.get(index))
            .cloned()
            .unwrap_or_else(|| Page::new(String::new(), String::new()))
    }

    /// Serial link repair: outgoing links in corpus order, then orphans
    fn repair_links(
        &mut self,
        reports: &[Option<PageReport>],
        processed: &[bool],
        touched: &mut BTreeSet<usize>,
        issues: &mut Vec<Issue>,
    ) {
        let links = &self.components.links;
        let min_links = links.config().min_outgoing_links;
        let positions = url_positions(&self.corpus);
        let mut graph = links.graph(&self.corpus);

        for (index, report) in reports.iter().enumerate() {
            let Some(report) = report else { continue };
            if self.corpus[index].internal_outgoing_count() >= min_links {
                continue;
            }

            let candidates: Vec<LinkCandidate> = report
                .candidates
                .iter()
                .filter(|c| processed.get(c.index).copied().unwrap_or(false))
                .cloned()
                .collect();
            let added =
                links.apply_link_candidates(&mut self.corpus, &mut graph, index, &candidates, min_links);
            mark_touched(&added, &positions, touched);

            let page = &self.corpus[index];
            let count = page.internal_outgoing_count();
            if count < min_links {
                issues.push(Issue::new(
                    &page.url,
                    IssueCategory::Linking,
                    format!(
                        "only {count} of {min_links} internal outgoing links; no further related page can be linked"
                    ),
                ));
            }
        }

        let orphans: Vec<String> = links
            .identify_orphan_pages(&self.corpus)
            .into_iter()
            .filter(|url| positions.get(url).is_some_and(|&i| processed[i]))
            .collect();
        if !orphans.is_empty() {
            let added = links.fix_orphan_pages_with(&orphans, &mut self.corpus, |i| processed[i]);
            mark_touched(&added, &positions, touched);
            ::log::info!("Orphan repair added {} links for {} orphans", added.len(), orphans.len());
        }
    }

    /// Point every member of a duplicate content group at one canonical URL
    fn assign_canonicals(
        &mut self,
        processed: &[bool],
        touched: &mut BTreeSet<usize>,
        issues: &mut Vec<Issue>,
        findings: &mut CorpusFindings,
    ) {
        let components = &self.components;
        let positions = url_positions(&self.corpus);
        let groups = components.content.detect_duplicate_content(&self.corpus);

        for urls in groups.values() {
            let members: Vec<usize> = urls.iter().filter_map(|u| positions.get(u).copied()).collect();
            let Some((&first, rest)) = members.split_first() else {
                continue;
            };
            let others: Vec<&Page> = rest.iter().map(|&i| &self.corpus[i]).collect();
            let canonical = components
                .metadata
                .generate_canonical_tag(&self.corpus[first], &others);
            let canonical = components.links.scope().key(&canonical);

            for &index in &members {
                let page = &mut self.corpus[index];
                issues.push(Issue::new(
                    &page.url,
                    IssueCategory::Content,
                    format!(
                        "duplicate content shared by {} pages; canonical {}",
                        members.len(),
                        canonical
                    ),
                ));
                if !processed[index] || page.canonical_url.as_deref() == Some(canonical.as_str()) {
                    continue;
                }
                page.canonical_url = Some(canonical.clone());
                for card in [page.open_graph.as_mut(), page.twitter_card.as_mut()]
                    .into_iter()
                    .flatten()
                {
                    card.url = canonical.clone();
                }
                touched.insert(index);
            }
        }

        if !groups.is_empty() {
            ::log::info!("Assigned canonical URLs for {} duplicate groups", groups.len());
        }
        findings.duplicate_content = groups;
    }

    /// Uniqueness, dangling link and cycle checks on the repaired corpus
    fn check_corpus_integrity(
        &self,
        result: &mut BulkUpdateResult,
        issues: &mut Vec<Issue>,
        findings: &mut CorpusFindings,
    ) {
        let metadata = &self.components.metadata;
        let links = &self.components.links;

        let duplicates = [
            ("H1", metadata.duplicate_h1_groups(&self.corpus)),
            ("title", metadata.duplicate_title_groups(&self.corpus)),
            ("meta description", metadata.duplicate_description_groups(&self.corpus)),
        ];
        for (field, groups) in duplicates {
            for group in groups {
                let others = group.len() - 1;
                let noun = if others == 1 { "page" } else { "pages" };
                for url in &group {
                    issues.push(Issue::new(
                        url,
                        IssueCategory::Metadata,
                        format!("{field} is shared with {others} other {noun}"),
                    ));
                }
            }
        }

        let dangling = links.find_dangling_links(&self.corpus);
        for link in &dangling {
            issues.push(Issue::new(
                &link.source_url,
                IssueCategory::Linking,
                format!("internal link to {} points outside the corpus", link.target_url),
            ));
        }
        findings.dangling_links = dangling.len();

        let cycles = links.detect_circular_references(&self.corpus);
        for url in &cycles {
            issues.push(Issue::new(url, IssueCategory::Linking, "page is part of a link cycle"));
            if result.demote(url, "circular reference detected") {
                ::log::warn!("Page {} failed: circular reference detected", url);
            }
        }
        findings.circular_references = cycles;
        findings.orphan_pages = links.identify_orphan_pages(&self.corpus);
        for url in &findings.orphan_pages {
            issues.push(Issue::new(
                url,
                IssueCategory::Linking,
                "orphan page: no internal link points here",
            ));
        }
    }

    fn score_pages(&mut self, processed: &[bool], issues: &[Issue]) {
        let mut penalties: HashMap<&str, u32> = HashMap::new();
        for issue in issues {
            let penalty = match issue.category {
                IssueCategory::Performance => PERFORMANCE_PENALTY,
                _ => ISSUE_PENALTY,
            };
            *penalties.entry(issue.url.as_str()).or_insert(0) += penalty;
        }

        for (page, _) in self
            .corpus
            .iter_mut()
            .zip(processed)
            .filter(|(_, processed)| **processed)
        {
            let penalty = penalties.get(page.url.as_str()).copied().unwrap_or(0);
            page.seo_score = 100u32.saturating_sub(penalty) as u8;
        }
    }
}

/// Per-page checks and repairs; touches nothing but `page`
async fn process_page(
    page: &mut Page,
    components: &Components,
    probe: Option<&dyn PerformanceProbe>,
    profiles: &[PageProfile],
) -> Result<PageReport> {
    components.links.scope().normalize(&page.url)?;
    let mut report = PageReport::default();
    let url = page.url.clone();

    // Content
    let content = &components.content;
    let analysis = content.analyze(page);
    if !page.content.trim().is_empty() && page.word_count != analysis.word_count {
        page.word_count = analysis.word_count;
        report.mutated = true;
    }
    if !content.validate_page_word_count(page) {
        report.issues.push(Issue::new(
            &url,
            IssueCategory::Content,
            format!(
                "word count {} below minimum {}",
                page.word_count,
                content.config().min_word_count
            ),
        ));
    }
    if !content.validate_keyword_density(&analysis.keyword_density) {
        let config = content.config();
        for (keyword, ratio) in &analysis.keyword_density {
            if *ratio < config.keyword_density_min || *ratio > config.keyword_density_max {
                report.issues.push(Issue::new(
                    &url,
                    IssueCategory::Content,
                    format!(
                        "keyword '{}' density {:.2}% outside {:.2}%..={:.2}%",
                        keyword,
                        ratio * 100.0,
                        config.keyword_density_min * 100.0,
                        config.keyword_density_max * 100.0
                    ),
                ));
            }
        }
    }
    if !heading_structure_is_valid(&analysis.heading_structure) {
        report.issues.push(Issue::new(
            &url,
            IssueCategory::Content,
            format!(
                "heading structure invalid: {} H1 headings",
                analysis.heading_structure.h1.len()
            ),
        ));
    }

    // Metadata
    let changes = components.metadata.fill_missing(page);
    report.mutated |= !changes.is_empty();
    for message in components.metadata.page_issues(page) {
        report.issues.push(Issue::new(&url, IssueCategory::Metadata, message));
    }

    // Links
    let links = components.links.analyze_links(page);
    ::log::debug!(
        "{}: {} incoming, {} internal outgoing, {} external outgoing",
        url,
        links.incoming_count,
        links.internal_outgoing,
        links.external_outgoing
    );
    let scope = components.links.scope();
    for link in &page.outgoing_links {
        let mislabelled = if link.is_internal() {
            scope
                .resolve(&link.target_url)
                .is_ok_and(|target| target.host_str() != scope.base_url().host_str())
        } else {
            scope.is_internal(&link.target_url)
        };
        if mislabelled {
            report.issues.push(Issue::new(
                &url,
                IssueCategory::Linking,
                format!(
                    "link to {} is marked {}",
                    link.target_url,
                    if link.is_internal() { "internal" } else { "external" }
                ),
            ));
        }
    }
    if page.internal_outgoing_count() < components.links.config().min_outgoing_links {
        report.candidates = components.links.rank_link_candidates(page, profiles);
    }

    // Performance
    if let Some(probe) = probe {
        let metrics = probe.measure(&url).await?;
        let verdict = components.performance.evaluate(&metrics);
        for failure in verdict.failures {
            report.issues.push(Issue::new(&url, IssueCategory::Performance, failure));
        }
    }

    if report.mutated {
        page.touch();
    }
    Ok(report)
}

fn url_positions(pages: &[Page]) -> HashMap<String, usize> {
    pages
        .iter()
        .enumerate()
        .map(|(index, page)| (page.url.clone(), index))
        .collect()
}

fn mark_touched(
    added: &[crate::page::Link],
    positions: &HashMap<String, usize>,
    touched: &mut BTreeSet<usize>,
) {
    for link in added {
        for url in [&link.source_url, &link.target_url] {
            if let Some(&index) = positions.get(url) {
                touched.insert(index);
            }
        }
    }
}
