use crate::results::{Issue, IssueCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Pass/fail counts and sample issues for one check family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: IssueCategory,
    pub pages_passed: usize,
    pub pages_failed: usize,
    pub issue_count: usize,
    /// First issues in the order they were found, bounded by the report limit
    pub issues: Vec<Issue>,
}

/// Corpus-wide summary of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub operation_id: String,
    pub total_pages: usize,
    pub failed_pages: usize,
    pub categories: Vec<CategorySummary>,
    pub orphan_pages: Vec<String>,
    pub circular_references: Vec<String>,
    pub duplicate_content: BTreeMap<String, Vec<String>>,
    pub dangling_links: usize,
}

/// Corpus-wide findings gathered by the batch run
#[derive(Debug, Clone, Default)]
pub struct CorpusFindings {
    pub orphan_pages: Vec<String>,
    pub circular_references: Vec<String>,
    pub duplicate_content: BTreeMap<String, Vec<String>>,
    pub dangling_links: usize,
}

impl AuditReport {
    pub fn build(
        operation_id: &str,
        page_urls: &[String],
        failed_pages: usize,
        issues: &[Issue],
        findings: CorpusFindings,
        max_issues: usize,
    ) -> Self {
        let categories = IssueCategory::ALL
            .iter()
            .map(|&category| {
                let in_category: Vec<&Issue> =
                    issues.iter().filter(|i| i.category == category).collect();
                let failing: HashSet<&str> = in_category.iter().map(|i| i.url.as_str()).collect();
                let pages_failed = page_urls
                    .iter()
                    .filter(|url| failing.contains(url.as_str()))
                    .count();

                CategorySummary {
                    category,
                    pages_passed: page_urls.len() - pages_failed,
                    pages_failed,
                    issue_count: in_category.len(),
                    issues: in_category.into_iter().take(max_issues).cloned().collect(),
                }
            })
            .collect();

        Self {
            operation_id: operation_id.to_string(),
            total_pages: page_urls.len(),
            failed_pages,
            categories,
            orphan_pages: findings.orphan_pages,
            circular_references: findings.circular_references,
            duplicate_content: findings.duplicate_content,
            dangling_links: findings.dangling_links,
        }
    }

    pub fn category(&self, category: IssueCategory) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SEO integrity report {}", self.operation_id)?;
        writeln!(
            f,
            "Pages: {} total, {} failed",
            self.total_pages, self.failed_pages
        )?;

        for summary in &self.categories {
            writeln!(
                f,
                "\n[{}] {} passed, {} failed ({} issues)",
                summary.category, summary.pages_passed, summary.pages_failed, summary.issue_count
            )?;
            for issue in &summary.issues {
                writeln!(f, "  - {}: {}", issue.url, issue.message)?;
            }
            if summary.issue_count > summary.issues.len() {
                writeln!(
                    f,
                    "  ... and {} more",
                    summary.issue_count - summary.issues.len()
                )?;
            }
        }

        writeln!(f, "\nOrphan pages: {}", self.orphan_pages.len())?;
        writeln!(f, "Circular references: {}", self.circular_references.len())?;
        writeln!(f, "Duplicate content groups: {}", self.duplicate_content.len())?;
        write!(f, "Dangling internal links: {}", self.dangling_links)
    }
}
