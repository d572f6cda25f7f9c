use super::{candidate, push_candidate, ExtractionStrategy};
use crate::config::ExtractorConfig;
use crate::dates::DateResult;
use crate::parser::markdown::BULLET_RE;
use crate::record::{ProposalRecord, SourceDocument};

/// Plain sentences announcing an opportunity ("... call for proposals ...").
/// The whole line, truncated, becomes the title.
pub struct FreeTextStrategy;

impl ExtractionStrategy for FreeTextStrategy {
    fn name(&self) -> &'static str {
        "free_text"
    }

    fn extract(&self, doc: &SourceDocument, config: &ExtractorConfig) -> Vec<ProposalRecord> {
        let mut records = Vec::new();

        for line in doc.markdown.lines().map(str::trim) {
            if line.is_empty()
                || line.chars().count() < config.min_text_line_chars
                || line.starts_with('#')
                || BULLET_RE.is_match(line)
            {
                continue;
            }
            if !announces_opportunity(line, config) {
                continue;
            }
            let title: String = line.chars().take(config.max_title_chars).collect();
            let result = candidate(
                doc,
                config,
                &title,
                doc.url.clone(),
                DateResult::Missing,
                DateResult::Missing,
            );
            push_candidate(&mut records, self.name(), result);
        }

        records
    }
}

fn announces_opportunity(line: &str, config: &ExtractorConfig) -> bool {
    let lower = line.to_lowercase();
    config
        .text_phrases
        .iter()
        .any(|(first, then)| in_order(&lower, first, then))
}

/// `first` occurs somewhere before `then`.
fn in_order(haystack: &str, first: &str, then: &str) -> bool {
    haystack
        .find(first)
        .is_some_and(|i| haystack[i + first.len()..].contains(then))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(md: &str) -> Vec<ProposalRecord> {
        FreeTextStrategy.extract(
            &SourceDocument::new("https://www.icssr.org/funding", md),
            &ExtractorConfig::default(),
        )
    }

    #[test]
    fn loose_phrase_order() {
        assert!(in_order("call for research proposals", "call", "proposal"));
        assert!(!in_order("proposals are invited, call us", "call", "proposal"));
        assert!(in_order("call us about last year's proposal", "call", "proposal"));
    }

    #[test]
    fn announcement_sentence() {
        let records = run("ICSSR invites a Call for Proposals under the IMPRESS scheme.");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://www.icssr.org/funding");
        assert_eq!(records[0].agency, "ICSSR - Indian Council of Social Science Research");
    }

    #[test]
    fn skips_headings_bullets_and_short_lines() {
        let md = "\
## Call for proposals now open for 2025
- Call for proposals on social science research
* Funding is available for doctoral fellows
+ PhD position in economics available here
Call for proposal";
        assert!(run(md).is_empty());
    }

    #[test]
    fn bullet_needs_trailing_space() {
        assert_eq!(run("-Funding for doctoral fellows is available now").len(), 1);
    }

    #[test]
    fn unrelated_text_ignored() {
        assert!(run("The council was established in 1969 to promote research.").is_empty());
    }

    #[test]
    fn long_lines_truncated() {
        let line = format!("Funding available for {}", "x".repeat(400));
        let records = run(&line);
        assert_eq!(records[0].title.chars().count(), 200);
        assert!(line.starts_with(&records[0].title));
    }

    #[test]
    fn multibyte_truncation() {
        let line = format!("Postdoc opening — {}", "é".repeat(300));
        let records = run(&line);
        assert_eq!(records[0].title.chars().count(), 200);
    }

    #[test]
    fn every_phrase() {
        for line in [
            "Call for proposals for the 2025 cycle",
            "Funding is now available to young investigators",
            "Fellowship invitations: application portal is live",
            "The grant submission deadline is 31 March",
            "A new research collaboration opportunity with France",
            "PhD scholars: one position remains in the lab",
            "Postdoc: an opening in computational biology",
        ] {
            assert_eq!(run(line).len(), 1, "expected a match for {:?}", line);
        }
    }
}
