//! Reply parser: pulls the recommendation table out of free-form model text.
//!
//! A line-oriented scan with two states:
//!
//! - `Outside`: pipe lines are remembered as a possible header; a pipe line
//!   containing `---` is the separator and moves the scan `InsideTable`. The
//!   remembered line joins the table only if it names the `Category` column.
//! - `InsideTable`: every pipe line is a table line; non-header lines with at
//!   least three non-empty cells become rows. The first line without a pipe
//!   moves the scan back `Outside`.
//!
//! All collected table lines are joined with `\n` and removed from the reply as
//! one verbatim block. If two tables are separated by prose the joined block
//! does not occur in the reply and nothing is removed; rows from both tables are
//! still returned.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{RecommendationRow, RecommendationTable};

/// Literal column label that marks a header row.
const HEADER_LABEL: &str = "Category";
const SEPARATOR_MARK: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub text: String,
    pub table: RecommendationTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InsideTable,
}

pub fn parse_reply(reply: &str) -> ParsedReply {
    let mut state = ScanState::Outside;
    let mut table_lines: Vec<&str> = Vec::new();
    let mut table = RecommendationTable::default();
    // Pipe line directly above the current line while outside a table.
    let mut pending_header: Option<&str> = None;

    for line in reply.split('\n') {
        if !line.contains('|') {
            state = ScanState::Outside;
            pending_header = None;
            continue;
        }

        if line.contains(SEPARATOR_MARK) {
            if let Some(header) = pending_header.take().filter(|h| h.contains(HEADER_LABEL)) {
                table_lines.push(header);
            }
            table_lines.push(line);
            state = ScanState::InsideTable;
            continue;
        }

        match state {
            ScanState::Outside => pending_header = Some(line),
            ScanState::InsideTable => {
                if !line.contains(HEADER_LABEL) {
                    if let Some(row) = parse_row(line) {
                        table.push(row);
                    }
                }
                table_lines.push(line);
            }
        }
    }

    if table_lines.is_empty() {
        return ParsedReply {
            text: reply.to_string(),
            table,
        };
    }

    let block = table_lines.join("\n");
    let stripped = reply.replace(&block, "");
    let text = match blank_runs() {
        Some(re) => re.replace_all(&stripped, "\n").trim().to_string(),
        None => stripped.trim().to_string(),
    };

    tracing::debug!(
        rows = table.len(),
        table_lines = table_lines.len(),
        "Extracted recommendation table from reply"
    );

    ParsedReply { text, table }
}

fn parse_row(line: &str) -> Option<RecommendationRow> {
    let cells: Vec<&str> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    match cells.as_slice() {
        [category, recommendation, impact, ..] => {
            Some(RecommendationRow::new(*category, *recommendation, *impact))
        }
        _ => None,
    }
}

fn blank_runs() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").ok()).as_ref()
}
