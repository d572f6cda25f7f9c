pub mod extract;
pub mod markdown;

use tracing::{debug, warn};

use crate::config::ExtractorConfig;
use crate::record::{ProposalRecord, SourceDocument};

pub use extract::{ExtractionStrategy, FreeTextStrategy, LinkStrategy, TableStrategy};

/// Runs every strategy over a document and concatenates what they find.
/// Overlapping candidates are expected; deduplication happens later, once,
/// over the whole batch.
pub struct MarkdownExtractor {
    config: ExtractorConfig,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl MarkdownExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_strategies(
            config,
            vec![
                Box::new(TableStrategy),
                Box::new(LinkStrategy),
                Box::new(FreeTextStrategy),
            ],
        )
    }

    pub fn with_strategies(
        config: ExtractorConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Self {
        Self { config, strategies }
    }

    pub fn extract(&self, doc: &SourceDocument) -> Vec<ProposalRecord> {
        if doc.markdown.trim().is_empty() {
            warn!(url = %doc.url, "No markdown content, skipping");
            return Vec::new();
        }

        let mut records = Vec::new();
        for strategy in &self.strategies {
            let found = strategy.extract(doc, &self.config);
            debug!(
                url = %doc.url,
                strategy = strategy.name(),
                count = found.len(),
                "strategy finished"
            );
            records.extend(found);
        }
        records
    }
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

/// Extract candidates from one page with the default tables.
pub fn extract(markdown: &str, source_url: &str) -> Vec<ProposalRecord> {
    MarkdownExtractor::default().extract(&SourceDocument::new(source_url, markdown))
}

// ── Tests ──
