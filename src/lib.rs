//! Crawl a website through a real browser, classify what kind of site it is with an
//! LLM, and report every page as JSON.

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod providers;
pub mod results;
pub mod tool;

// Re-export commonly used types for convenience
pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, ProviderConfig};
pub use error::AnalyzeError;
pub use results::PageRecord;
pub use tool::crawl_and_analyze_website;
