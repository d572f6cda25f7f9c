use super::{candidate, push_candidate, ExtractionStrategy};
use crate::config::ExtractorConfig;
use crate::dates::DateResult;
use crate::parser::markdown::{links, resolve_link};
use crate::record::{ProposalRecord, SourceDocument};

/// Inline links whose text reads like a funding call.
pub struct LinkStrategy;

impl ExtractionStrategy for LinkStrategy {
    fn name(&self) -> &'static str {
        "links"
    }

    fn extract(&self, doc: &SourceDocument, config: &ExtractorConfig) -> Vec<ProposalRecord> {
        let mut records = Vec::new();

        for caps in links(&doc.markdown) {
            let text = &caps[1];
            if !is_proposal_link(text, config) {
                continue;
            }
            let result = resolve_link(&doc.url, &caps[2]).and_then(|link| {
                candidate(
                    doc,
                    config,
                    text,
                    link,
                    DateResult::Missing,
                    DateResult::Missing,
                )
            });
            push_candidate(&mut records, self.name(), result);
        }

        records
    }
}

fn is_proposal_link(text: &str, config: &ExtractorConfig) -> bool {
    let lower = text.to_lowercase();
    if config
        .link_skip_words
        .iter()
        .any(|w| lower.contains(w.as_str()))
    {
        return false;
    }
    if text.chars().count() < config.min_link_text_chars {
        return false;
    }
    config
        .link_keywords
        .iter()
        .any(|k| lower.contains(k.as_str()))
}
