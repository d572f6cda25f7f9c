pub mod links;
pub mod table;
pub mod text;

use chrono::Utc;
use tracing::warn;

use crate::config::ExtractorConfig;
use crate::dates::DateResult;
use crate::error::ExtractError;
use crate::record::{ProposalRecord, SourceDocument};

pub use links::LinkStrategy;
pub use table::TableStrategy;
pub use text::FreeTextStrategy;

/// One heuristic pass over a page. Implementations must be total: a bad
/// line or link drops that candidate only.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, doc: &SourceDocument, config: &ExtractorConfig) -> Vec<ProposalRecord>;
}

/// Build a candidate stamped with the resolved agency and the current time.
pub(crate) fn candidate(
    doc: &SourceDocument,
    config: &ExtractorConfig,
    title: &str,
    link: String,
    start_date: DateResult,
    end_date: DateResult,
) -> Result<ProposalRecord, ExtractError> {
    if title.trim().is_empty() {
        return Err(ExtractError::EmptyTitle {
            source_url: doc.url.clone(),
        });
    }
    Ok(ProposalRecord {
        title: title.to_string(),
        agency: config.agencies.resolve(&doc.url).to_string(),
        start_date,
        end_date,
        link,
        source_url: doc.url.clone(),
        extracted_at: Utc::now(),
    })
}

/// Keep a candidate, or log why it was dropped.
pub(crate) fn push_candidate(
    records: &mut Vec<ProposalRecord>,
    strategy: &str,
    result: Result<ProposalRecord, ExtractError>,
) {
    match result {
        Ok(record) => records.push(record),
        Err(e) => warn!(strategy, error = %e, "Dropped candidate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_rejected() {
        let doc = SourceDocument::new("https://dst.gov.in/", "x");
        let config = ExtractorConfig::default();
        let result = candidate(
            &doc,
            &config,
            "   ",
            doc.url.clone(),
            DateResult::Missing,
            DateResult::Missing,
        );
        assert!(matches!(result, Err(ExtractError::EmptyTitle { .. })));
    }

    #[test]
    fn candidate_resolves_agency() {
        let doc = SourceDocument::new("https://www.icmr.gov.in/whatnew.html", "x");
        let record = candidate(
            &doc,
            &ExtractorConfig::default(),
            "Extramural research call",
            doc.url.clone(),
            DateResult::Missing,
            DateResult::Rolling,
        )
        .unwrap();
        assert_eq!(record.agency, "ICMR - Indian Council of Medical Research");
        assert_eq!(record.link, record.source_url);
    }

    #[test]
    fn dropped_candidate_is_not_kept() {
        let mut records = Vec::new();
        push_candidate(
            &mut records,
            "test",
            Err(ExtractError::NotWebLink {
                href: "mailto:x".into(),
            }),
        );
        assert!(records.is_empty());
    }
}
