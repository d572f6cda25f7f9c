use tracing::debug;

use super::{candidate, push_candidate, ExtractionStrategy};
use crate::config::ExtractorConfig;
use crate::dates::normalize_cell;
use crate::error::ExtractError;
use crate::parser::markdown::{first_link, resolve_link, split_cells, SEPARATOR_RE};
use crate::record::{ProposalRecord, SourceDocument};

/// Words that mark a pipe line as a table header. Case-sensitive.
const HEADER_MARKERS: &[&str] = &["Title", "Call", "Scheme"];

const MIN_CELLS: usize = 3;

/// Rows of markdown tables that follow a recognizable header.
///
/// Column layout is positional: title, (anything), start date, end date.
pub struct TableStrategy;

impl ExtractionStrategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn extract(&self, doc: &SourceDocument, config: &ExtractorConfig) -> Vec<ProposalRecord> {
        let mut records = Vec::new();
        let mut in_table = false;

        for line in doc.markdown.lines().map(str::trim) {
            if is_header(line) {
                debug!(url = %doc.url, columns = ?split_cells(line), "table header");
                in_table = true;
                continue;
            }
            if SEPARATOR_RE.is_match(line) {
                continue;
            }
            if !in_table {
                continue;
            }

            if line.contains('|') {
                let cells = split_cells(line);
                if cells.len() >= MIN_CELLS {
                    push_candidate(&mut records, self.name(), row_to_record(&cells, doc, config));
                }
            } else if !line.is_empty() {
                in_table = false;
            }
        }

        records
    }
}

fn is_header(line: &str) -> bool {
    line.contains('|') && HEADER_MARKERS.iter().any(|m| line.contains(m))
}

fn row_to_record(
    cells: &[&str],
    doc: &SourceDocument,
    config: &ExtractorConfig,
) -> Result<ProposalRecord, ExtractError> {
    let (title, link) = match first_link(cells[0]) {
        Some((text, href)) => (text, resolve_link(&doc.url, href)?),
        None => (cells[0], doc.url.clone()),
    };
    let start = normalize_cell(cells.get(2).copied());
    let end = normalize_cell(cells.get(3).copied());
    candidate(doc, config, title, link, start, end)
}
