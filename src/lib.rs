//! Turns scraped funding-agency pages (markdown) into deduplicated,
//! deadline-ordered proposal records.
//!
//! The pipeline is pure: fetch markdown however you like, hand each page to
//! [`parser::MarkdownExtractor`], then run [`pipeline::dedupe`] and
//! [`pipeline::sort_by_deadline`] once over everything collected
//! ([`pipeline::run`] does all three).

pub mod agency;
pub mod config;
pub mod dates;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod record;

pub use agency::{AgencyResolver, AgencyRule, UNKNOWN_AGENCY};
pub use config::{ExtractorConfig, Settings};
pub use dates::DateResult;
pub use error::{ExtractError, SettingsError};
pub use parser::{extract, ExtractionStrategy, MarkdownExtractor};
pub use record::{ProposalRecord, SourceDocument};
