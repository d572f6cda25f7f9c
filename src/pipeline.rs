use std::collections::HashSet;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::info;

use crate::parser::MarkdownExtractor;
use crate::record::{ProposalRecord, SourceDocument};

/// Result of one pass over a batch of documents.
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub proposals: Vec<ProposalRecord>,
    pub documents: usize,
    pub candidates: usize,
    /// Sources that produced no candidates at all.
    pub empty_sources: Vec<String>,
}

/// Extract every document, then dedupe and sort the whole batch once.
pub fn run(extractor: &MarkdownExtractor, documents: &[SourceDocument]) -> PipelineRun {
    let per_document = extract_all(extractor, documents);

    let mut empty_sources = Vec::new();
    let mut candidates = Vec::new();
    for (doc, records) in documents.iter().zip(per_document) {
        if records.is_empty() {
            info!(url = %doc.url, "No proposals found");
            empty_sources.push(doc.url.clone());
        } else {
            info!(url = %doc.url, count = records.len(), "Found proposals");
        }
        candidates.extend(records);
    }

    let candidate_count = candidates.len();
    let proposals = sort_by_deadline(dedupe(candidates));
    info!(
        documents = documents.len(),
        candidates = candidate_count,
        unique = proposals.len(),
        "Pipeline finished"
    );

    PipelineRun {
        proposals,
        documents: documents.len(),
        candidates: candidate_count,
        empty_sources,
    }
}

/// Per-document candidates, in document order. Documents share no state so
/// they are extracted in parallel.
pub fn extract_all(
    extractor: &MarkdownExtractor,
    documents: &[SourceDocument],
) -> Vec<Vec<ProposalRecord>> {
    documents
        .par_iter()
        .map(|doc| extractor.extract(doc))
        .collect()
}

/// Keep the first record for each (title, agency, link), preserving order.
pub fn dedupe(records: Vec<ProposalRecord>) -> Vec<ProposalRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let (title, agency, link) = r.identity();
            seen.insert((title.to_string(), agency.to_string(), link.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Deadline {
    Dated(NaiveDate),
    Undated,
}

/// Stable sort by end date, earliest first. Rolling, missing and unparseable
/// end dates go last, keeping their relative order.
pub fn sort_by_deadline(mut records: Vec<ProposalRecord>) -> Vec<ProposalRecord> {
    records.sort_by_cached_key(|r| match r.end_date.deadline() {
        Some(date) => Deadline::Dated(date),
        None => Deadline::Undated,
    });
    records
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateResult;
    use chrono::{Duration, Utc};

    fn record(title: &str, link: &str, end: DateResult) -> ProposalRecord {
        ProposalRecord {
            title: title.into(),
            agency: "DST - Department of Science & Technology".into(),
            start_date: DateResult::Missing,
            end_date: end,
            link: link.into(),
            source_url: "https://dst.gov.in/call-for-proposals".into(),
            extracted_at: Utc::now(),
        }
    }

    fn iso(s: &str) -> DateResult {
        DateResult::Iso(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn titles(records: &[ProposalRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn dedupe_keeps_first() {
        let first = record("A", "https://x/a", iso("2025-01-01"));
        let mut second = record("A", "https://x/a", iso("2026-01-01"));
        second.start_date = DateResult::Rolling;
        second.extracted_at = first.extracted_at + Duration::seconds(5);

        let out = dedupe(vec![first.clone(), second]);
        assert_eq!(out, vec![first]);
    }

    #[test]
    fn dedupe_distinguishes_each_field() {
        let base = record("A", "https://x/a", DateResult::Missing);
        let mut other_agency = base.clone();
        other_agency.agency = "TDB - Technology Development Board".into();
        let other_link = record("A", "https://x/b", DateResult::Missing);
        let other_title = record("B", "https://x/a", DateResult::Missing);

        let out = dedupe(vec![base, other_agency, other_link, other_title]);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let input = vec![
            record("A", "https://x/a", DateResult::Missing),
            record("B", "https://x/b", DateResult::Missing),
            record("A", "https://x/a", DateResult::Rolling),
            record("C", "https://x/c", DateResult::Missing),
            record("B", "https://x/b", iso("2025-01-01")),
        ];
        let once = dedupe(input);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(titles(&once), vec!["A", "B", "C"]);
    }

    #[test]
    fn undated_sort_last() {
        let input = vec![
            record("missing", "https://x/1", DateResult::Missing),
            record("late", "https://x/2", iso("2025-06-30")),
            record("rolling", "https://x/3", DateResult::Rolling),
            record("raw", "https://x/4", DateResult::Raw("next Tuesday".into())),
            record("early", "https://x/5", iso("2025-01-15")),
        ];
        let out = sort_by_deadline(input);
        assert_eq!(titles(&out), vec!["early", "late", "missing", "rolling", "raw"]);
    }

    #[test]
    fn sort_is_stable() {
        let input = vec![
            record("b", "https://x/1", iso("2025-03-01")),
            record("a", "https://x/2", iso("2025-03-01")),
            record("z", "https://x/3", DateResult::Missing),
            record("y", "https://x/4", DateResult::Missing),
        ];
        let out = sort_by_deadline(input);
        assert_eq!(titles(&out), vec!["b", "a", "z", "y"]);
    }

    #[test]
    fn raw_dates_with_generic_shape_are_ordered() {
        let input = vec![
            record("iso", "https://x/1", iso("2025-05-01")),
            record("raw", "https://x/2", DateResult::Raw("April 1 2025".into())),
        ];
        let out = sort_by_deadline(input);
        assert_eq!(titles(&out), vec!["raw", "iso"]);
    }

    #[test]
    fn run_accumulates_across_documents() {
        let docs = vec![
            SourceDocument::new(
                "https://dst.gov.in/call-for-proposals",
                "\
| Title | Agency | Start | End |
|---|---|---|---|
| [AI Grant](/grants/ai) | X | 01/01/2025 | 31/03/2025 |
| [Quantum Grant](/grants/q) | X | 01/01/2025 | 28/02/2025 |",
            ),
            SourceDocument::new("https://tdb.gov.in/", ""),
            SourceDocument::new(
                "https://dst.gov.in/call-for-proposals",
                "| Title | A | B | C |\n| [AI Grant](/grants/ai) | X | 01/01/2025 | 31/12/2025 |",
            ),
        ];
        let result = run(&MarkdownExtractor::default(), &docs);
        assert_eq!(result.documents, 3);
        // "Quantum Grant" is long enough to also come through the link pass
        assert_eq!(result.candidates, 4);
        assert_eq!(result.empty_sources, vec!["https://tdb.gov.in/".to_string()]);
        assert_eq!(titles(&result.proposals), vec!["Quantum Grant", "AI Grant"]);
        assert_eq!(result.proposals[1].end_date, iso("2025-03-31"));
    }
}
