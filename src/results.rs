use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Check family an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Linking,
    Metadata,
    Content,
    Performance,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Linking,
        IssueCategory::Metadata,
        IssueCategory::Content,
        IssueCategory::Performance,
    ];
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueCategory::Linking => "linking",
            IssueCategory::Metadata => "metadata",
            IssueCategory::Content => "content",
            IssueCategory::Performance => "performance",
        };
        f.write_str(name)
    }
}

/// A defect recorded against one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub url: String,
    pub category: IssueCategory,
    pub message: String,
}

impl Issue {
    pub fn new(url: &str, category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            category,
            message: message.into(),
        }
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub operation_id: String,
    pub successful_pages: Vec<String>,
    pub failed_pages: Vec<String>,
    /// URL -> error message for every failed page
    pub errors: BTreeMap<String, String>,
    pub rollback_available: bool,
}

impl BulkUpdateResult {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, url: &str) {
        self.successful_pages.push(url.to_string());
    }

    pub fn record_failure(&mut self, url: &str, message: impl Into<String>) {
        self.failed_pages.push(url.to_string());
        self.errors.insert(url.to_string(), message.into());
    }

    /// Move a successful page to the failed list; returns false if it was not successful
    pub fn demote(&mut self, url: &str, message: impl Into<String>) -> bool {
        let Some(position) = self.successful_pages.iter().position(|u| u == url) else {
            return false;
        };
        self.successful_pages.remove(position);
        self.record_failure(url, message);
        true
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.errors.contains_key(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demote_moves_page_to_failed() {
        let mut result = BulkUpdateResult::new("op");
        result.record_success("/a");
        result.record_success("/b");

        assert!(result.demote("/a", "circular reference detected"));
        assert_eq!(result.successful_pages, vec!["/b".to_string()]);
        assert_eq!(result.failed_pages, vec!["/a".to_string()]);
        assert_eq!(result.errors["/a"], "circular reference detected");
        assert!(result.is_failed("/a"));
    }

    #[test]
    fn test_demote_ignores_pages_that_already_failed() {
        let mut result = BulkUpdateResult::new("op");
        result.record_failure("/a", "invalid URL");
        assert!(!result.demote("/a", "circular reference detected"));
        assert_eq!(result.errors["/a"], "invalid URL");
        assert_eq!(result.failed_pages.len(), 1);
    }

    #[test]
    fn test_result_json_shape() {
        let result = BulkUpdateResult::new("op-1");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operationId"], "op-1");
        assert_eq!(json["rollbackAvailable"], false);
        assert!(json["failedPages"].as_array().unwrap().is_empty());
    }
}
