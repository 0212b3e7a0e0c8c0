use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seo-integrity")]
#[command(about = "Checks and repairs content, metadata and internal links across a page corpus")]
#[command(version)]
pub struct Args {
    /// JSON file holding the page corpus (an array of pages)
    pub pages: PathBuf,

    /// Engine configuration (JSON); built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON object mapping old URLs to their new location
    #[arg(short, long)]
    pub redirects: Option<PathBuf>,

    /// Number of pages processed concurrently (defaults to available cores)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the repaired pages back to the corpus file
    #[arg(short, long, default_value_t = false)]
    pub write: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
