pub mod batch;
pub mod config;
pub mod content;
pub mod error;
pub mod filter;
pub mod links;
pub mod metadata;
pub mod page;
pub mod parsers;
pub mod performance;
pub mod report;
pub mod results;
pub mod store;
pub mod taxonomy;
pub mod utils;

// Re-export commonly used types for convenience
pub use batch::{AbortHandle, BatchOrchestrator, BatchOutcome, BatchState};
pub use config::SeoConfig;
pub use error::{Result, SeoError};
pub use page::{Link, LinkType, Page, SocialCard};
pub use report::AuditReport;
pub use results::{BulkUpdateResult, Issue, IssueCategory};
