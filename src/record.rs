use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::DateResult;

/// One scraped page: its markdown rendering and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub url: String,
    pub markdown: String,
}

impl SourceDocument {
    pub fn new(url: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    pub title: String,
    pub agency: String,
    pub start_date: DateResult,
    pub end_date: DateResult,
    /// Always absolute.
    pub link: String,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
}

impl ProposalRecord {
    /// Deduplication key: (title, agency, link).
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.title, &self.agency, &self.link)
    }
}
